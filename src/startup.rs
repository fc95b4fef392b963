use std::{net::TcpListener, path::Path, time::Instant};

use actix_files::Files;
use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

use crate::{
    configuration::{ApplicationSettings, SearchMode, Settings},
    domain::SetupError,
    routes::{
        default_route,
        health_route::{self, StartedAt},
        search_route::{self, SearchLimiter},
    },
    services::{HttpTransport, NamegrepSearcher, WebDriverLauncher},
};

pub fn build_searcher(settings: &Settings) -> Result<NamegrepSearcher, SetupError> {
    let transport = HttpTransport::new(&settings.namegrep)?;

    let launcher = match settings.browser.enabled && settings.namegrep.mode != SearchMode::Http {
        true => Some(WebDriverLauncher::new(
            settings.browser.clone(),
            settings.namegrep.user_agent(),
        )),
        false => None,
    };

    NamegrepSearcher::new(settings, transport, launcher)
}

pub fn run(
    listener: TcpListener,
    searcher: NamegrepSearcher,
    settings: ApplicationSettings,
) -> Result<Server, std::io::Error> {
    let searcher = web::Data::new(searcher);
    let limiter = web::Data::new(SearchLimiter::new(
        settings.max_concurrent_searches,
        settings.search_timeout(),
    ));
    let started_at = web::Data::new(StartedAt(Instant::now()));

    let static_dir = settings
        .static_dir
        .filter(|dir| Path::new(dir).join("index.html").is_file());
    match &static_dir {
        Some(dir) => log::info!("Serving frontend from {}", dir),
        None => log::info!("No frontend found, serving service info at /"),
    }

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::JsonConfig::default().error_handler(search_route::json_error_handler))
            .service(
                web::scope("/api")
                    .service(search_route::search_domains)
                    .service(health_route::health),
            )
            .configure(|cfg| match &static_dir {
                Some(dir) => {
                    cfg.service(Files::new("/", dir).index_file("index.html"));
                }
                None => {
                    cfg.service(default_route::default);
                }
            })
            .app_data(searcher.clone())
            .app_data(limiter.clone())
            .app_data(started_at.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
