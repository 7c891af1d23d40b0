use serde::Serialize;

use crate::error::ClientError;

/// Styling discriminator of a [`StatusMessage`].
/// Serializes to `""`, `"error"` or `"success"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MessageStatus {
    #[default]
    #[serde(rename = "")]
    Neutral,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "success")]
    Success,
}

impl MessageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "",
            Self::Error => "error",
            Self::Success => "success",
        }
    }
}

/// A line of feedback for the user. Immutable: every change produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatusMessage {
    message: String,
    status: MessageStatus,
}

impl StatusMessage {
    fn new(message: impl Into<String>, status: MessageStatus) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn error_message(error: impl Into<String>) -> Self {
        Self::new(error, MessageStatus::Error)
    }

    pub fn field_not_set_error_message(field: &str) -> Self {
        Self::error_message(format!("Please enter a value for {field}!"))
    }

    pub fn normal_message(message: impl Into<String>) -> Self {
        Self::new(message, MessageStatus::Neutral)
    }

    pub fn thinking_message() -> Self {
        Self::normal_message("Thinking...")
    }

    pub fn success_message(success: impl Into<String>) -> Self {
        Self::new(success, MessageStatus::Success)
    }

    /// Error message that keeps the current text and appends `error`.
    pub fn get_added_error_message(&self, error: &str) -> Self {
        if self.message.is_empty() {
            Self::error_message(error)
        } else {
            Self::error_message(format!("{}, {error}", self.message))
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> MessageStatus {
        self.status
    }

    pub fn is_error(&self) -> bool {
        self.status == MessageStatus::Error
    }
}

impl From<&ClientError> for StatusMessage {
    fn from(err: &ClientError) -> Self {
        Self::error_message(err.to_string())
    }
}
