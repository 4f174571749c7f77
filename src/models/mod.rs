mod conversation;
pub mod input;
mod message;
mod user;

pub use conversation::Conversation;
pub use message::{CardInteractionState, Message, MessageBody, NewMessage};
pub use user::{SortMode, User};
