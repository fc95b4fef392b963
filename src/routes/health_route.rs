use std::time::Instant;

use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use serde::Serialize;

pub struct StartedAt(pub Instant);

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    uptime: f64,
}

#[get("/health")]
async fn health(started_at: web::Data<StartedAt>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
        uptime: started_at.0.elapsed().as_secs_f64(),
    })
}
