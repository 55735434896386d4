//! User intents and the typed bus that carries them to the controller.
//!
//! The UI never mutates conversation state itself. It decides whether a
//! gesture becomes an intent (the guards below), then posts the intent on
//! the bus. Rejected gestures are silent no-ops.

use tokio::sync::mpsc;
use tracing::debug;

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Send text to the selected conversation.
    SendMessage(String),
    /// Switch the chat pane to another conversation.
    SelectConversation(String),
    /// Start a conversation, optionally seeded with a first prompt.
    NewConversation(Option<String>),
}

/// Accept a send unless the text is blank or a send is already in flight.
/// The text is forwarded untrimmed.
pub fn send_message(text: &str, in_flight: bool) -> Option<Intent> {
    if in_flight {
        debug!("send ignored: council still deliberating");
        return None;
    }
    if text.trim().is_empty() {
        debug!("send ignored: empty input");
        return None;
    }
    Some(Intent::SendMessage(text.to_string()))
}

/// Accept a selection unless it targets the conversation already shown.
pub fn select_conversation(id: &str, current: Option<&str>) -> Option<Intent> {
    if current == Some(id) {
        debug!(id, "select ignored: already active");
        return None;
    }
    Some(Intent::SelectConversation(id.to_string()))
}

/// Accept a new conversation unless a send is in flight.
pub fn new_conversation(prompt: Option<String>, in_flight: bool) -> Option<Intent> {
    if in_flight {
        debug!("new conversation ignored: council still deliberating");
        return None;
    }
    Some(Intent::NewConversation(prompt))
}

/// Sending half of the intent bus. Cheap to clone.
#[derive(Debug, Clone)]
pub struct IntentBus {
    tx: mpsc::UnboundedSender<Intent>,
}

impl IntentBus {
    /// Create a bus and its receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Intent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Post an accepted intent. Returns `true` if one was posted.
    ///
    /// A closed receiver means the runner is shutting down; the intent is
    /// dropped.
    pub fn emit(&self, intent: Option<Intent>) -> bool {
        let Some(intent) = intent else {
            return false;
        };
        debug!(?intent, "intent emitted");
        if self.tx.send(intent).is_err() {
            debug!("intent bus closed, dropping intent");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_rejects_blank_text() {
        assert_eq!(send_message("", false), None);
        assert_eq!(send_message("   \n\t", false), None);
    }

    #[test]
    fn send_rejects_while_in_flight() {
        assert_eq!(send_message("hello", true), None);
    }

    #[test]
    fn send_keeps_original_text() {
        assert_eq!(
            send_message("  hello  ", false),
            Some(Intent::SendMessage("  hello  ".into()))
        );
    }

    #[test]
    fn reselecting_active_is_noop() {
        assert_eq!(select_conversation("c1", Some("c1")), None);
        assert_eq!(
            select_conversation("c2", Some("c1")),
            Some(Intent::SelectConversation("c2".into()))
        );
        assert_eq!(
            select_conversation("c1", None),
            Some(Intent::SelectConversation("c1".into()))
        );
    }

    #[test]
    fn new_conversation_guarded_by_in_flight() {
        assert_eq!(new_conversation(None, true), None);
        assert_eq!(
            new_conversation(Some("p".into()), false),
            Some(Intent::NewConversation(Some("p".into())))
        );
    }

    #[tokio::test]
    async fn bus_delivers_accepted_intents_only() {
        let (bus, mut rx) = IntentBus::channel();
        assert!(!bus.emit(send_message("", false)));
        assert!(bus.emit(send_message("hi", false)));
        assert_eq!(rx.recv().await, Some(Intent::SendMessage("hi".into())));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn bus_with_closed_receiver_drops() {
        let (bus, rx) = IntentBus::channel();
        drop(rx);
        assert!(!bus.emit(Some(Intent::NewConversation(None))));
    }
}
