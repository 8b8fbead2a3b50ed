//! Todo item types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of characters stored in a todo's text column
pub const MAX_TEXT_LEN: usize = 255;

/// Store-assigned todo identifier
pub type TodoId = i64;

/// A stored todo item
///
/// `id` is assigned by the store on insert and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
}

impl Todo {
    pub fn new(id: TodoId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// Create todo request body
///
/// `text` is optional at the wire level so that a missing field can be
/// reported as a validation error instead of a decoding failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub text: Option<String>,
}

impl CreateTodoRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// Validate the request and return the text to store
    pub fn validate(self) -> Result<String, ValidationError> {
        let text = self.text.ok_or(ValidationError::MissingText)?;
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        // Postgres text columns cannot hold NUL
        if text.contains('\0') {
            return Err(ValidationError::NulCharacter);
        }
        let len = text.chars().count();
        if len > MAX_TEXT_LEN {
            return Err(ValidationError::TextTooLong {
                len,
                max: MAX_TEXT_LEN,
            });
        }
        Ok(text)
    }
}

/// Caller input errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field 'text' is required")]
    MissingText,

    #[error("Field 'text' must not be empty")]
    EmptyText,

    #[error("Field 'text' is {len} characters, maximum is {max}")]
    TextTooLong { len: usize, max: usize },

    #[error("Field 'text' must not contain NUL characters")]
    NulCharacter,

    #[error("Invalid todo id")]
    InvalidId,
}

/// Parse a todo id from a path segment
///
/// Ids are positive integers; anything else is rejected.
pub fn parse_todo_id(raw: &str) -> Result<TodoId, ValidationError> {
    match raw.trim().parse::<TodoId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ValidationError::InvalidId),
    }
}
