use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::info;

use relay_domain::ContactSubmission;

use crate::{error::ApiResult, response::ContactResponse, routes::AppState};

pub async fn submit_contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactSubmission>, JsonRejection>,
) -> ApiResult<ContactResponse> {
    let Json(submission) = payload?;
    // 持久化与通知分发不随请求被取消而中断
    let orchestrator = Arc::clone(&state.orchestrator);
    let receipt =
        tokio::spawn(async move { orchestrator.handle_contact_submission(submission).await })
            .await??;

    info!(
        contact_id = %receipt.contact_id,
        notifications_sent = receipt.notifications_sent,
        "联系表单处理完成"
    );

    Ok(ContactResponse::from(receipt))
}
