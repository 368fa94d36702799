//! HTTP 接口层
//!
//! - `POST /chat` 聊天回复
//! - `GET /chat` 会话历史
//! - `POST /contact` 联系表单提交
//! - `GET /health` 健康检查

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use routes::{create_app, create_routes, AppState};
