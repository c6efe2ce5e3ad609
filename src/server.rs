use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::{App, HttpResponse, HttpServer, web};
use serde_json::json;
use tracing::{error, info};

use crate::pipeline::RunResult;

pub const SUCCESS_MESSAGE: &str = "Datos de Eurostat procesados correctamente.";

/// A full pipeline pass, shared by every trigger.
pub type RunJob = Arc<dyn Fn() -> RunResult + Send + Sync>;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/eurostat", web::get().to(on_demand))
        .route("/api/eurostat", web::post().to(on_demand))
        .route("/eurostat_timer", web::post().to(timer));
}

pub async fn serve(addr: SocketAddr, job: RunJob) -> std::io::Result<()> {
    info!(%addr, "listening for triggers");
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(Arc::clone(&job)))
            .configure(configure)
    })
    .bind(addr)?
    .run()
    .await
}

async fn execute(job: web::Data<RunJob>, trigger: &'static str) -> Result<RunResult, String> {
    let job = Arc::clone(job.get_ref());
    info!(trigger, "run requested");
    web::block(move || job()).await.map_err(|err| {
        error!(trigger, error = %err, "run aborted");
        err.to_string()
    })
}

async fn on_demand(job: web::Data<RunJob>) -> HttpResponse {
    match execute(job, "http").await {
        Ok(_) => HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(SUCCESS_MESSAGE),
        Err(message) => HttpResponse::InternalServerError()
            .content_type("text/plain; charset=utf-8")
            .body(format!("Error en la función: {message}")),
    }
}

/// Invocation endpoint for a host-side monthly timer (CRON `0 0 0 1 * *`).
async fn timer(job: web::Data<RunJob>) -> HttpResponse {
    match execute(job, "timer").await {
        Ok(_) => HttpResponse::Ok().json(json!({
            "Outputs": {},
            "Logs": [],
            "ReturnValue": null,
        })),
        Err(message) => HttpResponse::InternalServerError().json(json!({
            "Outputs": {},
            "Logs": [message],
            "ReturnValue": null,
        })),
    }
}
