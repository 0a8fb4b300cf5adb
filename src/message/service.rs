use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::{Mailbox, MessageFilter, MessageModel, NewMessage},
    repository::MessageRepository,
    types::SendMessageRequest,
};
use crate::pagination::{Page, PageRequest};
use crate::shared::AppError;
use crate::user::repository::UserRepository;

/// Service for handling messaging business logic
pub struct MessageService {
    repository: Arc<dyn MessageRepository + Send + Sync>,
    users: Arc<dyn UserRepository + Send + Sync>,
}

impl MessageService {
    pub fn new(
        repository: Arc<dyn MessageRepository + Send + Sync>,
        users: Arc<dyn UserRepository + Send + Sync>,
    ) -> Self {
        Self { repository, users }
    }

    /// Lists the caller's own inbox or outbox
    #[instrument(skip(self))]
    pub async fn list_messages(
        &self,
        caller: &str,
        mailbox: Mailbox,
        request: PageRequest,
        field: Option<&str>,
        value: Option<&str>,
    ) -> Result<Page<MessageModel>, AppError> {
        let filter = match (field, value) {
            (Some(field), Some(value)) => match MessageFilter::parse(mailbox, field, value) {
                Some(filter) => Some(filter),
                None => {
                    debug!(field = %field, %mailbox, "Filter field not searchable in this mailbox");
                    return Ok(Page::empty(request));
                }
            },
            _ => None,
        };

        self.repository
            .find_mailbox_page(caller, mailbox, filter.as_ref(), request)
            .await
    }

    /// Stores a message from `sender`; the receiver must exist
    #[instrument(skip(self, request), fields(receiver = %request.receiver))]
    pub async fn send_message(
        &self,
        sender: &str,
        request: SendMessageRequest,
    ) -> Result<MessageModel, AppError> {
        if !self.users.exists_by_username(&request.receiver).await? {
            warn!("Receiver does not exist");
            return Err(AppError::NotFound(format!(
                "Receiver {} not found",
                request.receiver
            )));
        }

        let message = self
            .repository
            .create_message(NewMessage::now(
                sender.to_string(),
                request.receiver,
                request.content,
            ))
            .await?;

        info!(message_id = message.id, "Message sent");
        Ok(message)
    }
}
