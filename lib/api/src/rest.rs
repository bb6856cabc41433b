use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use cropwise_core::{Error, Recommendation};
use cropwise_engine::{Engine, EngineState};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Serialize)]
struct PredictResponse {
    recommendations: Vec<Recommendation>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct ClassesResponse {
    classes: Vec<String>,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(engine: Arc<Engine>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(engine.clone()))
                .configure(RestApi::configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }

    /// Register the routes on an app; the engine must be in app data
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.route("/predict", web::post().to(predict))
            .route("/health", web::get().to(health))
            .route("/classes", web::get().to(classes));
    }
}

fn error_response(err: &Error) -> HttpResponse {
    match err {
        Error::EngineNotReady => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "error": "Recommendation engine is not ready"
        })),
        _ => {
            error!("Prediction error: {}", err);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Unable to generate recommendations at the moment."
            }))
        }
    }
}

async fn predict(
    engine: web::Data<Arc<Engine>>,
    body: web::Json<serde_json::Value>,
) -> ActixResult<HttpResponse> {
    let payload = match body.into_inner() {
        serde_json::Value::Object(map) if !map.is_empty() => map,
        _ => {
            warn!("Rejected prediction request with non-object payload");
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Invalid input payload"
            })));
        }
    };

    let engine = engine.get_ref().clone();
    let result = web::block(move || engine.predict(&payload)).await;

    match result {
        Ok(Ok(recommendations)) => Ok(HttpResponse::Ok().json(PredictResponse { recommendations })),
        Ok(Err(e)) => Ok(error_response(&e)),
        Err(e) => Ok(error_response(&Error::PredictionFailed(e.to_string()))),
    }
}

async fn health(engine: web::Data<Arc<Engine>>) -> ActixResult<HttpResponse> {
    let status = match engine.state() {
        EngineState::Ready => "ready",
        EngineState::Uninitialized => "uninitialized",
    };
    Ok(HttpResponse::Ok().json(HealthResponse { status }))
}

async fn classes(engine: web::Data<Arc<Engine>>) -> ActixResult<HttpResponse> {
    match engine.classes() {
        Ok(classes) => Ok(HttpResponse::Ok().json(ClassesResponse { classes })),
        Err(e) => Ok(error_response(&e)),
    }
}
