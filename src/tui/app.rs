//! TuiApp — the TEA model.
//!
//! All UI state lives here. Update receives TuiMessages and mutates state;
//! view reads it. Conversation data is never edited locally: gestures
//! become intents on the bus and the next snapshot shows the result.

use chrono::{DateTime, Local};

use crate::controller::Snapshot;
use crate::conversation::grouping::display_order;
use crate::conversation::Conversation;
use crate::intent::{self, IntentBus};

use super::event::TuiMessage;
use super::input_line::InputLine;
use super::suggestions::SUGGESTIONS;

/// Which pane receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Chat,
    Input,
}

/// The main TUI application state (TEA model).
pub struct TuiApp {
    /// Whether the app should quit.
    pub should_quit: bool,
    pub focus: Focus,
    /// Latest controller state.
    pub snapshot: Snapshot,
    /// Clock used for date grouping; refreshed every tick.
    pub now: DateTime<Local>,
    /// Cursor in the sidebar, over conversations in display order.
    pub sidebar_selected: usize,
    /// Highlighted suggestion card in empty states.
    pub suggestion_selected: usize,
    pub input: InputLine,
    /// Scroll offset for the chat pane.
    pub message_scroll: u16,
    /// When true, scroll the chat pane to the bottom on next render.
    pub message_auto_scroll: bool,
    /// Chat viewport height (set by renderer, used by PageUp/PageDown).
    pub viewport_height: u16,
    /// Spinner animation frame.
    pub spinner_frame: usize,
    /// Last controller error, shown in the status bar until the next success.
    pub last_error: Option<String>,
    bus: IntentBus,
}

impl TuiApp {
    pub fn new(bus: IntentBus) -> Self {
        Self {
            should_quit: false,
            focus: Focus::Chat,
            snapshot: Snapshot::default(),
            now: Local::now(),
            sidebar_selected: 0,
            suggestion_selected: 0,
            input: InputLine::new(),
            message_scroll: 0,
            message_auto_scroll: true,
            viewport_height: 0,
            spinner_frame: 0,
            last_error: None,
            bus,
        }
    }

    /// Handle a TUI message (TEA update).
    pub fn update(&mut self, msg: TuiMessage) {
        match msg {
            TuiMessage::Input(key) => super::input::handle_key(self, key),
            TuiMessage::Paste(text) => {
                if self.focus == Focus::Input && self.input_enabled() {
                    self.input.insert_str(&text);
                }
            }
            TuiMessage::Snapshot(snapshot) => self.apply_snapshot(snapshot),
            TuiMessage::ControllerError(err) => self.last_error = Some(err),
            TuiMessage::Tick => {
                self.spinner_frame = self.spinner_frame.wrapping_add(1);
                self.now = Local::now();
            }
        }
    }

    /// Replace the snapshot, following the selection and scroll position.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        let changed_conversation =
            snapshot.current_conversation_id != self.snapshot.current_conversation_id;
        let changed_messages = snapshot.conversation.as_ref().map(|c| &c.messages)
            != self.snapshot.conversation.as_ref().map(|c| &c.messages);
        if changed_conversation || changed_messages {
            self.message_auto_scroll = true;
        }
        if changed_conversation {
            self.suggestion_selected = 0;
        }

        self.snapshot = snapshot;

        if changed_conversation {
            if let Some(idx) = self.current_index() {
                self.sidebar_selected = idx;
            }
        }
        let count = self.snapshot.conversations.len();
        self.sidebar_selected = self.sidebar_selected.min(count.saturating_sub(1));
        if self.focus == Focus::Input && !self.input_visible() {
            self.focus = Focus::Chat;
        }
    }

    /// The selected conversation is waiting on the council.
    pub fn is_loading(&self) -> bool {
        self.snapshot.is_loading
    }

    /// Some conversation is waiting on the council; sends and new
    /// conversations are refused until it answers.
    pub fn is_busy(&self) -> bool {
        self.snapshot.busy
    }

    /// Conversations in the order the sidebar shows them.
    pub fn sidebar_conversations(&self) -> Vec<&Conversation> {
        display_order(&self.snapshot.conversations, &self.now)
    }

    fn current_index(&self) -> Option<usize> {
        let current = self.snapshot.current_conversation_id.as_deref()?;
        self.sidebar_conversations()
            .iter()
            .position(|c| c.id == current)
    }

    /// Empty states (no conversation, or one without messages) show cards.
    pub fn showing_suggestions(&self) -> bool {
        self.snapshot
            .conversation
            .as_ref()
            .map_or(true, |c| c.messages.is_empty())
    }

    /// The input form exists whenever a conversation is selected.
    pub fn input_visible(&self) -> bool {
        self.snapshot.conversation.is_some()
    }

    /// The input form is disabled while the council deliberates.
    pub fn input_enabled(&self) -> bool {
        self.input_visible() && !self.is_loading()
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Sidebar => Focus::Chat,
            Focus::Chat if self.input_visible() => Focus::Input,
            Focus::Chat | Focus::Input => Focus::Sidebar,
        };
    }

    pub fn sidebar_up(&mut self) {
        self.sidebar_selected = self.sidebar_selected.saturating_sub(1);
    }

    pub fn sidebar_down(&mut self) {
        let count = self.snapshot.conversations.len();
        if self.sidebar_selected + 1 < count {
            self.sidebar_selected += 1;
        }
    }

    /// Select the conversation under the sidebar cursor.
    pub fn select_highlighted(&mut self) -> bool {
        let Some(id) = self
            .sidebar_conversations()
            .get(self.sidebar_selected)
            .map(|c| c.id.clone())
        else {
            return false;
        };
        let current = self.snapshot.current_conversation_id.as_deref();
        self.bus.emit(intent::select_conversation(&id, current))
    }

    pub fn new_conversation(&mut self) -> bool {
        self.bus
            .emit(intent::new_conversation(None, self.is_busy()))
    }

    /// Submit the input form. The buffer clears only when the send was
    /// accepted.
    pub fn submit_input(&mut self) -> bool {
        if !self.input_visible() || self.input.is_blank() {
            return false;
        }
        let sent = self
            .bus
            .emit(intent::send_message(self.input.content(), self.is_busy()));
        if sent {
            self.input.clear();
        }
        sent
    }

    pub fn suggestion_prev(&mut self) {
        self.suggestion_selected = self.suggestion_selected.saturating_sub(1);
    }

    pub fn suggestion_next(&mut self) {
        if self.suggestion_selected + 1 < SUGGESTIONS.len() {
            self.suggestion_selected += 1;
        }
    }

    /// Act on the highlighted suggestion card.
    ///
    /// With no conversation selected this starts a new one seeded with the
    /// prompt; in an empty conversation it sends the prompt.
    pub fn choose_suggestion(&mut self) -> bool {
        if !self.showing_suggestions() {
            return false;
        }
        let prompt = SUGGESTIONS[self.suggestion_selected.min(SUGGESTIONS.len() - 1)].prompt;
        let intent = if self.snapshot.conversation.is_none() {
            intent::new_conversation(Some(prompt.to_string()), self.is_busy())
        } else {
            intent::send_message(prompt, self.is_busy())
        };
        self.bus.emit(intent)
    }

    pub fn scroll_messages_up(&mut self) {
        self.message_auto_scroll = false;
        self.message_scroll = self.message_scroll.saturating_sub(1);
    }

    pub fn scroll_messages_down(&mut self) {
        self.message_auto_scroll = false;
        self.message_scroll = self.message_scroll.saturating_add(1);
    }

    pub fn page_messages_up(&mut self) {
        self.message_auto_scroll = false;
        self.message_scroll = self
            .message_scroll
            .saturating_sub(self.viewport_height.max(1));
    }

    pub fn page_messages_down(&mut self) {
        self.message_auto_scroll = false;
        self.message_scroll = self
            .message_scroll
            .saturating_add(self.viewport_height.max(1));
    }

    /// Jump back to the bottom and follow new content.
    pub fn follow_messages(&mut self) {
        self.message_auto_scroll = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ConversationDetail, Message};
    use crate::intent::Intent;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn app() -> (TuiApp, UnboundedReceiver<Intent>) {
        let (bus, rx) = IntentBus::channel();
        (TuiApp::new(bus), rx)
    }

    fn conv(id: &str, created_at: &str) -> Conversation {
        Conversation {
            id: id.into(),
            title: Some(format!("title {id}")),
            created_at: created_at.into(),
            message_count: 0,
        }
    }

    fn detail(id: &str, messages: Vec<Message>) -> ConversationDetail {
        ConversationDetail {
            id: id.into(),
            title: None,
            created_at: "2024-06-10T10:00:00".into(),
            messages,
        }
    }

    fn key(code: KeyCode) -> TuiMessage {
        TuiMessage::Input(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn app_default_state() {
        let (app, _rx) = app();
        assert!(!app.should_quit);
        assert_eq!(app.focus, Focus::Chat);
        assert!(app.showing_suggestions());
        assert!(!app.input_visible());
    }

    #[test]
    fn ctrl_c_quits() {
        let (mut app, _rx) = app();
        app.update(TuiMessage::Input(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert!(app.should_quit);
    }

    #[test]
    fn suggestion_without_conversation_starts_one() {
        let (mut app, mut rx) = app();
        app.suggestion_next();
        assert!(app.choose_suggestion());
        assert_eq!(
            rx.try_recv().unwrap(),
            Intent::NewConversation(Some(SUGGESTIONS[1].prompt.to_string()))
        );
    }

    #[test]
    fn suggestion_in_empty_conversation_sends() {
        let (mut app, mut rx) = app();
        app.apply_snapshot(Snapshot {
            conversations: vec![conv("c1", "2024-06-10T10:00:00")],
            conversation: Some(detail("c1", vec![])),
            is_loading: false,
            busy: false,
            current_conversation_id: Some("c1".into()),
        });
        assert!(app.choose_suggestion());
        assert_eq!(
            rx.try_recv().unwrap(),
            Intent::SendMessage(SUGGESTIONS[0].prompt.to_string())
        );
    }

    #[test]
    fn suggestion_blocked_while_loading() {
        let (mut app, mut rx) = app();
        app.apply_snapshot(Snapshot {
            is_loading: true,
            busy: true,
            ..Snapshot::default()
        });
        assert!(!app.choose_suggestion());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn no_suggestions_once_messages_exist() {
        let (mut app, _rx) = app();
        app.apply_snapshot(Snapshot {
            conversations: vec![conv("c1", "2024-06-10T10:00:00")],
            conversation: Some(detail("c1", vec![Message::user("hi")])),
            is_loading: false,
            busy: false,
            current_conversation_id: Some("c1".into()),
        });
        assert!(!app.showing_suggestions());
        assert!(!app.choose_suggestion());
    }

    #[test]
    fn submit_clears_only_on_accept() {
        let (mut app, mut rx) = app();
        app.apply_snapshot(Snapshot {
            conversations: vec![conv("c1", "2024-06-10T10:00:00")],
            conversation: Some(detail("c1", vec![])),
            is_loading: false,
            busy: false,
            current_conversation_id: Some("c1".into()),
        });

        app.input.set_content("   ");
        assert!(!app.submit_input());
        assert_eq!(app.input.content(), "   ");

        app.input.set_content("Why?");
        assert!(app.submit_input());
        assert_eq!(app.input.content(), "");
        assert_eq!(rx.try_recv().unwrap(), Intent::SendMessage("Why?".into()));

        app.snapshot.is_loading = true;
        app.snapshot.busy = true;
        app.input.set_content("again");
        assert!(!app.submit_input());
        assert_eq!(app.input.content(), "again");
    }

    #[test]
    fn other_conversation_deliberating_keeps_input_open() {
        let (mut app, mut rx) = app();
        app.apply_snapshot(Snapshot {
            conversations: vec![
                conv("c1", "2024-06-10T10:00:00"),
                conv("c2", "2024-06-10T09:00:00"),
            ],
            conversation: Some(detail("c2", vec![])),
            is_loading: false,
            busy: true,
            current_conversation_id: Some("c2".into()),
        });
        assert!(!app.is_loading());
        assert!(app.input_enabled());

        app.input.set_content("queued?");
        assert!(!app.submit_input());
        assert_eq!(app.input.content(), "queued?");
        assert!(!app.new_conversation());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn sidebar_selection_walks_display_order() {
        let (mut app, mut rx) = app();
        app.now = Local::now();
        let today = app.now.format("%Y-%m-%dT%H:%M:%S").to_string();
        app.apply_snapshot(Snapshot {
            conversations: vec![conv("old", "2001-01-01T00:00:00"), conv("new", &today)],
            conversation: None,
            is_loading: false,
            busy: false,
            current_conversation_id: None,
        });
        // Display order puts Today before Older.
        assert_eq!(app.sidebar_conversations()[0].id, "new");

        app.update(key(KeyCode::Tab)); // chat -> sidebar (no input visible)
        assert_eq!(app.focus, Focus::Sidebar);
        app.update(key(KeyCode::Down));
        app.update(key(KeyCode::Down));
        assert_eq!(app.sidebar_selected, 1);
        app.update(key(KeyCode::Enter));
        assert_eq!(
            rx.try_recv().unwrap(),
            Intent::SelectConversation("old".into())
        );
    }

    #[test]
    fn reselecting_current_emits_nothing() {
        let (mut app, mut rx) = app();
        app.apply_snapshot(Snapshot {
            conversations: vec![conv("c1", "2024-06-10T10:00:00")],
            conversation: Some(detail("c1", vec![])),
            is_loading: false,
            busy: false,
            current_conversation_id: Some("c1".into()),
        });
        assert!(!app.select_highlighted());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn new_selection_moves_sidebar_cursor() {
        let (mut app, _rx) = app();
        let convs = vec![
            conv("a", "2024-06-10T10:00:00"),
            conv("b", "2024-06-10T09:00:00"),
        ];
        app.apply_snapshot(Snapshot {
            conversations: convs,
            conversation: Some(detail("b", vec![])),
            is_loading: false,
            busy: false,
            current_conversation_id: Some("b".into()),
        });
        assert_eq!(app.sidebar_conversations()[app.sidebar_selected].id, "b");
    }

    #[test]
    fn snapshot_change_reenables_auto_scroll() {
        let (mut app, _rx) = app();
        app.scroll_messages_up();
        assert!(!app.message_auto_scroll);
        app.apply_snapshot(Snapshot {
            conversations: vec![conv("c1", "2024-06-10T10:00:00")],
            conversation: Some(detail("c1", vec![Message::user("x")])),
            is_loading: true,
            busy: true,
            current_conversation_id: Some("c1".into()),
        });
        assert!(app.message_auto_scroll);
    }

    #[test]
    fn focus_leaves_input_when_it_disappears() {
        let (mut app, _rx) = app();
        app.apply_snapshot(Snapshot {
            conversations: vec![conv("c1", "2024-06-10T10:00:00")],
            conversation: Some(detail("c1", vec![])),
            is_loading: false,
            busy: false,
            current_conversation_id: Some("c1".into()),
        });
        app.focus = Focus::Input;
        app.apply_snapshot(Snapshot::default());
        assert_eq!(app.focus, Focus::Chat);
    }

    #[test]
    fn tick_advances_spinner() {
        let (mut app, _rx) = app();
        app.update(TuiMessage::Tick);
        app.update(TuiMessage::Tick);
        assert_eq!(app.spinner_frame, 2);
    }

    #[test]
    fn controller_error_is_recorded() {
        let (mut app, _rx) = app();
        app.update(TuiMessage::ControllerError("boom".into()));
        assert_eq!(app.last_error.as_deref(), Some("boom"));
    }
}
