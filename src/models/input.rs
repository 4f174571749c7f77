//! Input DTOs with garde validation for the setter surface.
//!
//! These guard the boundary where UI intents enter the data core.

use garde::Validate;
use serde::Deserialize;

use crate::error::Error;

/// Validation constants
const MAX_REMARK_LENGTH: usize = 50;
const MAX_MESSAGE_LENGTH: usize = 10_000;
const MAX_SEARCH_QUERY_LENGTH: usize = 200;

/// Input for editing a user's custom remark. `None` clears the remark.
#[derive(Debug, Deserialize, Validate)]
#[garde(context(()))]
pub struct RemarkInput {
    #[garde(range(min = 1))]
    pub user_id: i64,
    #[garde(inner(length(max = MAX_REMARK_LENGTH)))]
    pub remark: Option<String>,
}

/// Input for sending a text message in a chat.
#[derive(Debug, Deserialize, Validate)]
#[garde(context(()))]
pub struct SendMessageInput {
    #[garde(range(min = 1))]
    pub sender_id: i64,
    #[garde(length(min = 1, max = MAX_MESSAGE_LENGTH))]
    pub content: String,
}

/// Input for a conversation search.
#[derive(Debug, Deserialize, Validate)]
#[garde(context(()))]
pub struct SearchInput {
    #[garde(length(min = 1, max = MAX_SEARCH_QUERY_LENGTH))]
    pub query: String,
}

/// Helper trait to convert garde validation errors to the crate error type
pub trait ValidateExt {
    fn validate_input(&self) -> Result<(), Error>;
}

impl<T: Validate<Context = ()>> ValidateExt for T {
    fn validate_input(&self) -> Result<(), Error> {
        self.validate().map_err(|e| Error::InvalidInput(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remark_within_bounds_passes() {
        let input = RemarkInput {
            user_id: 1,
            remark: Some("VIP".to_string()),
        };
        assert!(input.validate_input().is_ok());
    }

    #[test]
    fn overlong_remark_is_rejected() {
        let input = RemarkInput {
            user_id: 1,
            remark: Some("x".repeat(MAX_REMARK_LENGTH + 1)),
        };
        assert!(input.validate_input().is_err());
    }

    #[test]
    fn cleared_remark_passes() {
        let input = RemarkInput {
            user_id: 7,
            remark: None,
        };
        assert!(input.validate_input().is_ok());
    }

    #[test]
    fn empty_message_content_is_rejected() {
        let input = SendMessageInput {
            sender_id: 1,
            content: String::new(),
        };
        assert!(input.validate_input().is_err());
    }
}
