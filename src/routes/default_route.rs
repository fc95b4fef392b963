use actix_web::{get, HttpResponse};
use serde_json::json;

#[get("/")]
async fn default() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Available .com domains matching a namegrep pattern",
        "endpoints": {
            "search": "POST /api/search-domains { \"regexPattern\": string }",
            "health": "GET /api/health",
        },
    }))
}
