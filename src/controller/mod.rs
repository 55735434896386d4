//! The controller seam — whoever owns conversation state.
//!
//! The UI hands intents down and reads snapshots back. A controller backed
//! by the council service would do network I/O here; the crate ships
//! [`local::LocalController`], an in-memory stand-in.

pub mod local;

use async_trait::async_trait;
use thiserror::Error;

use crate::conversation::{Conversation, ConversationDetail};
use crate::intent::Intent;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("no conversation selected")]
    NoConversationSelected,

    #[error("the council is still answering the previous message")]
    Busy,
}

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Everything the UI renders, as one immutable copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Sidebar list, in backend order.
    pub conversations: Vec<Conversation>,
    /// The selected conversation, if any.
    pub conversation: Option<ConversationDetail>,
    /// True while a council pipeline runs for the selected conversation.
    pub is_loading: bool,
    /// True while a council pipeline runs for any conversation. New sends
    /// are refused until it clears.
    pub busy: bool,
    pub current_conversation_id: Option<String>,
}

/// Owner of conversation state.
#[async_trait]
pub trait Controller: Send {
    /// Apply an intent the UI accepted.
    async fn dispatch(&mut self, intent: Intent) -> ControllerResult<()>;

    /// Periodic hook for controllers that progress on their own.
    async fn tick(&mut self) -> ControllerResult<()> {
        Ok(())
    }

    /// Current state for rendering.
    fn snapshot(&self) -> Snapshot;
}
