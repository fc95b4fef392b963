use std::net::TcpListener;

use comscout::{
    configuration::get_configuration,
    startup::{build_searcher, run},
};
use env_logger::Env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration()?;
    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    let searcher = build_searcher(&configuration)?;

    log::info!(
        "Listening on http://{} (mode: {:?}, upstream: {})",
        address,
        configuration.namegrep.mode,
        configuration.namegrep.base_url
    );

    run(listener, searcher, configuration.application)?.await?;
    Ok(())
}
