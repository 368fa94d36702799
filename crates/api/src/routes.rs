use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use relay_config::ApiConfig;
use relay_dispatcher::DispatchOrchestrator;

use crate::{
    handlers::{get_chat_history, health_check, send_chat_message, submit_contact},
    middleware::{cors_layer, request_logging, timeout_layer, trace_layer},
};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<DispatchOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<DispatchOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

pub fn create_routes(state: AppState) -> Router {
    build_routes(state, None)
}

/// 挂载中间件后的完整应用
pub fn create_app(state: AppState, config: &ApiConfig) -> Router {
    let router = build_routes(state, Some(config.request_timeout_seconds))
        .layer(middleware::from_fn(request_logging))
        .layer(trace_layer());

    if config.cors_enabled {
        router.layer(cors_layer())
    } else {
        router
    }
}

/// 请求超时只作用于只读接口；`POST /chat` 与 `POST /contact` 必须等解析和分发自行结束
fn build_routes(state: AppState, timeout_seconds: Option<u64>) -> Router {
    let (health, history) = match timeout_seconds {
        Some(seconds) => (
            get(health_check).layer(timeout_layer(seconds)),
            get(get_chat_history).layer(timeout_layer(seconds)),
        ),
        None => (get(health_check), get(get_chat_history)),
    };

    Router::new()
        .route("/health", health)
        .route("/chat", history.post(send_chat_message))
        .route("/contact", post(submit_contact))
        .with_state(state)
}
