use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

use crate::shared::AppError;
use crate::user::models::contains_ignore_case;

/// Written over sender/receiver of messages whose user was deleted
pub const REMOVED_USER_SENTINEL: &str = "~ removed user ~";

/// Database model for messages table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct MessageModel {
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A message that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub sender: String,
    pub receiver: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl NewMessage {
    /// Stamps the message with the current server time
    pub fn now(sender: String, receiver: String, content: String) -> Self {
        Self {
            sender,
            receiver,
            content,
            timestamp: Utc::now(),
        }
    }

    pub fn with_id(self, id: i64) -> MessageModel {
        MessageModel {
            id,
            sender: self.sender,
            receiver: self.receiver,
            content: self.content,
            timestamp: self.timestamp,
        }
    }
}

/// Which side of the conversation the caller is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum Mailbox {
    /// Messages received by the caller
    #[strum(serialize = "in")]
    Inbox,
    /// Messages sent by the caller
    #[strum(serialize = "out")]
    Outbox,
}

impl Mailbox {
    pub fn parse(inout: &str) -> Result<Self, AppError> {
        Mailbox::from_str(inout)
            .map_err(|_| AppError::BadRequest(format!("inout must be in or out, got {:?}", inout)))
    }

    /// Column that must equal the caller's username
    pub fn owner_column(&self) -> &'static str {
        match self {
            Mailbox::Inbox => "receiver",
            Mailbox::Outbox => "sender",
        }
    }

    pub fn owner_of<'a>(&self, message: &'a MessageModel) -> &'a str {
        match self {
            Mailbox::Inbox => &message.receiver,
            Mailbox::Outbox => &message.sender,
        }
    }
}

/// Filterable columns, matched by exact lowercase name
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
enum MessageField {
    Sender,
    Receiver,
    Content,
}

/// Case-insensitive substring match on one message column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageFilter {
    Sender(String),
    Receiver(String),
    Content(String),
}

impl MessageFilter {
    /// Inbox filters accept sender or content, outbox filters receiver or
    /// content. Anything else is `None` and matches nothing.
    pub fn parse(mailbox: Mailbox, field: &str, value: &str) -> Option<Self> {
        let field = MessageField::from_str(field).ok()?;
        match (mailbox, field) {
            (Mailbox::Inbox, MessageField::Sender) => Some(Self::Sender(value.to_string())),
            (Mailbox::Outbox, MessageField::Receiver) => Some(Self::Receiver(value.to_string())),
            (_, MessageField::Content) => Some(Self::Content(value.to_string())),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Sender(_) => "sender",
            Self::Receiver(_) => "receiver",
            Self::Content(_) => "content",
        }
    }

    pub fn needle(&self) -> &str {
        match self {
            Self::Sender(v) | Self::Receiver(v) | Self::Content(v) => v,
        }
    }

    pub fn matches(&self, message: &MessageModel) -> bool {
        let haystack = match self {
            Self::Sender(_) => &message.sender,
            Self::Receiver(_) => &message.receiver,
            Self::Content(_) => &message.content,
        };
        contains_ignore_case(haystack, self.needle())
    }
}
