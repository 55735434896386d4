//! Conversation data model — the read-only snapshot the UI renders.
//!
//! Shapes mirror the council backend's JSON so a snapshot deserializes
//! straight into these types. `created_at` stays a raw string: parsing
//! happens in [`grouping`], where an unparsable value degrades to the
//! `Older` bucket instead of failing the whole list.

pub mod grouping;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A conversation as listed in the sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub message_count: u32,
}

impl Conversation {
    /// Title for display, falling back to the untitled placeholder.
    pub fn display_title(&self) -> &str {
        display_title(self.title.as_deref())
    }
}

/// The selected conversation, including its messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationDetail {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ConversationDetail {
    pub fn display_title(&self) -> &str {
        display_title(self.title.as_deref())
    }
}

fn display_title(title: Option<&str>) -> &str {
    match title {
        Some(t) if !t.trim().is_empty() => t,
        _ => "New Conversation",
    }
}

/// Who authored a message. Unknown roles are preserved verbatim so they
/// round-trip, but nothing renders them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
    Other(String),
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => Role::Other(s),
        }
    }
}

impl From<Role> for String {
    fn from(r: Role) -> Self {
        match r {
            Role::User => "user".into(),
            Role::Assistant => "assistant".into(),
            Role::Other(s) => s,
        }
    }
}

/// One chat message. User messages carry `content`; assistant messages
/// carry stage data and loading flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage1: Option<Vec<Stage1Response>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage2: Option<Vec<Stage2Ranking>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage3: Option<Stage3Result>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loading: Option<StageLoading>,
}

impl Message {
    /// A user message with markdown content.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            stage1: None,
            stage2: None,
            stage3: None,
            metadata: None,
            loading: None,
        }
    }

    /// An assistant message with no stages resolved yet.
    pub fn pending_assistant() -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            stage1: None,
            stage2: None,
            stage3: None,
            metadata: None,
            loading: Some(StageLoading {
                stage1: true,
                ..StageLoading::default()
            }),
        }
    }
}

/// Stage 1: one model's individual answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage1Response {
    pub model: String,
    pub response: String,
}

/// Stage 2: one model's ranking of the anonymized stage 1 answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage2Ranking {
    pub model: String,
    pub ranking: String,
    #[serde(default)]
    pub parsed_ranking: Vec<String>,
}

/// Stage 3: the chairman's synthesized answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage3Result {
    pub model: String,
    pub response: String,
}

/// Mean position of one model across all peer rankings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRanking {
    pub model: String,
    pub average_rank: f64,
    pub rankings_count: u32,
}

/// Stage 2 side data: label de-anonymization and aggregate scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_to_model: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_rankings: Option<Vec<AggregateRanking>>,
}

/// Per-stage in-flight flags. Missing flags are false, so `{}` is valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageLoading {
    #[serde(default)]
    pub stage1: bool,
    #[serde(default)]
    pub stage2: bool,
    #[serde(default)]
    pub stage3: bool,
}
