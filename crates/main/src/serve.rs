//! HTTP front end for the delivery webhook.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use ebook_delivery::delivery::{DeliveryAgent, WebhookResponse};
use ebook_delivery::DeliveryConfig;
use log::{error, info};
use serde_json::{json, Value};

#[derive(Clone)]
pub struct AppState {
    config: Arc<DeliveryConfig>,
    outbox: Arc<PathBuf>,
}

impl AppState {
    pub fn new(config: DeliveryConfig, outbox: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            outbox: Arc::new(outbox),
        }
    }

    fn agent(&self) -> DeliveryAgent {
        DeliveryAgent::from_config((*self.config).clone(), self.outbox.as_ref().clone())
    }
}

type Reply = (StatusCode, Json<Value>);

fn reply(response: WebhookResponse) -> Reply {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body))
}

async fn deliver_ebook(State(state): State<AppState>, body: String) -> Reply {
    // Rendering, slip probing and spooling all block.
    match tokio::task::spawn_blocking(move || state.agent().handle(&body)).await {
        Ok(response) => reply(response),
        Err(err) => {
            error!("delivery task failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": err.to_string() })),
            )
        }
    }
}

async fn health(State(state): State<AppState>) -> Reply {
    reply(state.agent().health())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook/deliver-ebook", post(deliver_ebook))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("webhook listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(DeliveryConfig::default(), PathBuf::from("outbox")))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn missing_fields_are_a_bad_request() {
        let request = Request::post("/webhook/deliver-ebook")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"email": "reader@example.com"}"#))
            .expect("request");
        let response = app().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Missing fields: slip_image_url, ebook_title"
        );
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let request = Request::post("/webhook/deliver-ebook")
            .body(Body::from("{oops"))
            .expect("request");
        let response = app().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }
}
