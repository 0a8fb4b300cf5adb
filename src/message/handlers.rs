use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::{Mailbox, MessageModel},
    service::MessageService,
    types::{ListMessagesQuery, SendMessageRequest},
};
use crate::pagination::{PageRequest, PageResponse};
use crate::session::AuthenticatedUser;
use crate::shared::{AppError, AppState};

fn service(state: &AppState) -> MessageService {
    MessageService::new(
        Arc::clone(&state.message_repository),
        Arc::clone(&state.user_repository),
    )
}

/// GET /api/message?inout=in|out
/// Only ever shows the caller's own mailbox
#[instrument(name = "list_messages", skip(state, caller, query), fields(caller = %caller.username, inout = %query.inout))]
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Query(query): Query<ListMessagesQuery>,
) -> Result<PageResponse<MessageModel>, AppError> {
    let mailbox = Mailbox::parse(&query.inout)?;
    let request = PageRequest::new(query.page, query.size)?;

    let page = service(&state)
        .list_messages(
            &caller.username,
            mailbox,
            request,
            query.field.as_deref(),
            query.value.as_deref(),
        )
        .await?;

    info!(
        total = page.total_elements,
        returned = page.number_of_elements,
        "Messages listed"
    );
    Ok(PageResponse(page))
}

/// POST /api/message
#[instrument(name = "send_message", skip(state, caller, request), fields(caller = %caller.username))]
pub async fn send_message(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageModel>), AppError> {
    let message = service(&state)
        .send_message(&caller.username, request)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
