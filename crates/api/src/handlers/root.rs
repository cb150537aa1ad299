use axum::Json;

use crate::response::MessageResponse;

pub const ROOT_MESSAGE: &str = "Implementing task queues using an async worker pool";

pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::ok(ROOT_MESSAGE))
}
