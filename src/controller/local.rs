//! Offline echo council.
//!
//! Holds conversations in memory and walks each sent message through the
//! three stages on a timer, so the UI's loading and result states can be
//! exercised without a backend. No model is called: members echo the
//! prompt, rank by answer length (their own answer last), and the chairman
//! reports the winner.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info};

use super::{Controller, ControllerError, ControllerResult, Snapshot};
use crate::config::CouncilConfig;
use crate::conversation::{
    AggregateRanking, Conversation, ConversationDetail, Message, MessageMetadata, Role,
    Stage1Response, Stage2Ranking, Stage3Result,
};
use crate::intent::Intent;
use crate::pipeline::ranking::{label_for, parse_ranking, short_model_name, FINAL_RANKING_HEADER};

/// Longest title derived from a first prompt, in characters.
const TITLE_MAX_CHARS: usize = 48;

/// The message currently moving through the stages.
#[derive(Debug, Clone)]
struct InFlight {
    conversation_id: String,
    prompt: String,
    last_step: Instant,
}

/// In-memory controller with a simulated council.
pub struct LocalController {
    config: CouncilConfig,
    /// Newest first, like the backend's listing.
    conversations: Vec<ConversationDetail>,
    current: Option<String>,
    in_flight: Option<InFlight>,
}

impl LocalController {
    pub fn new(config: CouncilConfig) -> Self {
        Self {
            config,
            conversations: Vec::new(),
            current: None,
            in_flight: None,
        }
    }

    fn stage_delay(&self) -> Duration {
        Duration::from_millis(self.config.stage_delay_ms)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut ConversationDetail> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    fn create(&mut self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.conversations.insert(
            0,
            ConversationDetail {
                id: id.clone(),
                title: None,
                created_at: chrono::Utc::now().to_rfc3339(),
                messages: Vec::new(),
            },
        );
        info!(id = %id, "conversation created");
        id
    }

    fn send(&mut self, text: String) -> ControllerResult<()> {
        if self.in_flight.is_some() {
            return Err(ControllerError::Busy);
        }
        let id = self
            .current
            .clone()
            .ok_or(ControllerError::NoConversationSelected)?;
        let conv = self
            .find_mut(&id)
            .ok_or_else(|| ControllerError::ConversationNotFound(id.clone()))?;

        if conv.title.is_none() {
            conv.title = Some(title_from_prompt(&text));
        }
        conv.messages.push(Message::user(text.clone()));
        conv.messages.push(Message::pending_assistant());

        debug!(id = %id, "council started");
        self.in_flight = Some(InFlight {
            conversation_id: id,
            prompt: text,
            last_step: Instant::now(),
        });
        Ok(())
    }

    /// Move the in-flight message one stage forward. Returns `false` when
    /// nothing is in flight.
    pub fn advance(&mut self) -> bool {
        let Some(flight) = self.in_flight.clone() else {
            return false;
        };
        let models = self.config.council_models.clone();
        let chairman = self.config.chairman_model.clone();

        let Some(message) = self
            .find_mut(&flight.conversation_id)
            .and_then(|c| c.messages.last_mut())
            .filter(|m| m.role == Role::Assistant)
        else {
            self.in_flight = None;
            return false;
        };

        let loading = message.loading.get_or_insert_with(Default::default);
        let finished = if message.stage1.is_none() {
            message.stage1 = Some(stage1_responses(&models, &flight.prompt));
            loading.stage1 = false;
            loading.stage2 = true;
            false
        } else if message.stage2.is_none() {
            let responses = message.stage1.as_deref().unwrap_or_default();
            let (rankings, metadata) = stage2_rankings(&models, responses);
            message.stage2 = Some(rankings);
            message.metadata = Some(metadata);
            loading.stage2 = false;
            loading.stage3 = true;
            false
        } else {
            let aggregate = message
                .metadata
                .as_ref()
                .and_then(|m| m.aggregate_rankings.as_deref())
                .unwrap_or_default();
            let responses = message.stage1.as_deref().unwrap_or_default();
            message.stage3 = Some(stage3_result(&chairman, aggregate, responses));
            loading.stage3 = false;
            true
        };

        if finished {
            debug!(id = %flight.conversation_id, "council finished");
            self.in_flight = None;
        } else if let Some(f) = self.in_flight.as_mut() {
            f.last_step = Instant::now();
        }
        true
    }
}

#[async_trait]
impl Controller for LocalController {
    async fn dispatch(&mut self, intent: Intent) -> ControllerResult<()> {
        match intent {
            Intent::NewConversation(prompt) => {
                if self.in_flight.is_some() {
                    return Err(ControllerError::Busy);
                }
                let id = self.create();
                self.current = Some(id);
                if let Some(prompt) = prompt {
                    self.send(prompt)?;
                }
                Ok(())
            }
            Intent::SelectConversation(id) => {
                if !self.conversations.iter().any(|c| c.id == id) {
                    return Err(ControllerError::ConversationNotFound(id));
                }
                self.current = Some(id);
                Ok(())
            }
            Intent::SendMessage(text) => self.send(text),
        }
    }

    async fn tick(&mut self) -> ControllerResult<()> {
        let due = self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.last_step.elapsed() >= self.stage_delay());
        if due {
            self.advance();
        }
        Ok(())
    }

    fn snapshot(&self) -> Snapshot {
        let conversations = self
            .conversations
            .iter()
            .map(|c| Conversation {
                id: c.id.clone(),
                title: c.title.clone(),
                created_at: c.created_at.clone(),
                message_count: c.messages.len() as u32,
            })
            .collect();
        let conversation = self
            .current
            .as_ref()
            .and_then(|id| self.conversations.iter().find(|c| &c.id == id))
            .cloned();
        Snapshot {
            conversations,
            conversation,
            is_loading: self
                .in_flight
                .as_ref()
                .is_some_and(|f| Some(&f.conversation_id) == self.current.as_ref()),
            busy: self.in_flight.is_some(),
            current_conversation_id: self.current.clone(),
        }
    }
}

/// First line of the prompt, shortened to fit the sidebar.
fn title_from_prompt(prompt: &str) -> String {
    let first = prompt.trim().lines().next().unwrap_or_default().trim();
    if first.chars().count() <= TITLE_MAX_CHARS {
        return first.to_string();
    }
    let cut: String = first.chars().take(TITLE_MAX_CHARS - 3).collect();
    format!("{}...", cut.trim_end())
}

fn quote(text: &str) -> String {
    text.lines()
        .map(|l| format!("> {l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn stage1_responses(models: &[String], prompt: &str) -> Vec<Stage1Response> {
    models
        .iter()
        .map(|model| Stage1Response {
            model: model.clone(),
            response: format!(
                "**{}** heard the question:\n\n{}\n\nThis council runs offline, so its members \
                 can only echo the prompt. Point the client at a council backend for real answers.",
                short_model_name(model),
                quote(prompt.trim()),
            ),
        })
        .collect()
}

/// Each member prefers longer answers and puts its own answer last.
fn member_order(member: usize, responses: &[Stage1Response]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..responses.len()).filter(|&i| i != member).collect();
    order.sort_by(|&a, &b| {
        responses[b]
            .response
            .len()
            .cmp(&responses[a].response.len())
            .then(a.cmp(&b))
    });
    if member < responses.len() {
        order.push(member);
    }
    order
}

fn stage2_rankings(
    models: &[String],
    responses: &[Stage1Response],
) -> (Vec<Stage2Ranking>, MessageMetadata) {
    let label_to_model: BTreeMap<String, String> = responses
        .iter()
        .enumerate()
        .map(|(i, r)| (label_for(i), r.model.clone()))
        .collect();

    let rankings: Vec<Stage2Ranking> = models
        .iter()
        .enumerate()
        .map(|(member, model)| {
            let list = member_order(member, responses)
                .iter()
                .enumerate()
                .map(|(pos, &i)| format!("{}. {}", pos + 1, label_for(i)))
                .collect::<Vec<_>>()
                .join("\n");
            let ranking = format!(
                "{} compared {} anonymous responses and favored the most detailed.\n\n\
                 {FINAL_RANKING_HEADER}\n{list}",
                short_model_name(model),
                responses.len(),
            );
            let parsed_ranking = parse_ranking(&ranking);
            Stage2Ranking {
                model: model.clone(),
                ranking,
                parsed_ranking,
            }
        })
        .collect();

    let aggregate_rankings = aggregate(&rankings, &label_to_model);
    (
        rankings,
        MessageMetadata {
            label_to_model: Some(label_to_model),
            aggregate_rankings: Some(aggregate_rankings),
        },
    )
}

/// Mean 1-based position per model, best first, ties by model name.
fn aggregate(
    rankings: &[Stage2Ranking],
    label_to_model: &BTreeMap<String, String>,
) -> Vec<AggregateRanking> {
    let mut positions: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for ranking in rankings {
        for (pos, label) in ranking.parsed_ranking.iter().enumerate() {
            if let Some(model) = label_to_model.get(label) {
                positions.entry(model.as_str()).or_default().push(pos + 1);
            }
        }
    }

    let mut out: Vec<AggregateRanking> = positions
        .into_iter()
        .map(|(model, pos)| AggregateRanking {
            model: model.to_string(),
            average_rank: pos.iter().sum::<usize>() as f64 / pos.len() as f64,
            rankings_count: pos.len() as u32,
        })
        .collect();
    out.sort_by(|a, b| {
        a.average_rank
            .total_cmp(&b.average_rank)
            .then_with(|| a.model.cmp(&b.model))
    });
    out
}

fn stage3_result(
    chairman: &str,
    aggregate: &[AggregateRanking],
    responses: &[Stage1Response],
) -> Stage3Result {
    let response = match aggregate.first() {
        Some(top) => {
            let answer = responses
                .iter()
                .find(|r| r.model == top.model)
                .map(|r| r.response.as_str())
                .unwrap_or_default();
            format!(
                "Chairman **{}** reviewed the council.\n\nTop-ranked member: **{}** \
                 (average rank {:.2} across {} rankings).\n\n{}",
                short_model_name(chairman),
                short_model_name(&top.model),
                top.average_rank,
                top.rankings_count,
                answer,
            )
        }
        None => format!(
            "Chairman **{}** found no rankings to synthesize.",
            short_model_name(chairman)
        ),
    };
    Stage3Result {
        model: chairman.to_string(),
        response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{render_plan, BlockKind};

    fn config() -> CouncilConfig {
        CouncilConfig {
            council_models: vec!["a/short".into(), "b/much-longer-name".into(), "c/mid-name".into()],
            chairman_model: "a/short".into(),
            stage_delay_ms: 0,
            tick_ms: 10,
        }
    }

    fn last_kinds(ctrl: &LocalController) -> Vec<BlockKind> {
        let snap = ctrl.snapshot();
        let conv = snap.conversation.unwrap();
        render_plan(conv.messages.last().unwrap())
            .iter()
            .map(|b| b.kind())
            .collect()
    }

    #[tokio::test]
    async fn new_conversation_selects_it() {
        let mut ctrl = LocalController::new(config());
        ctrl.dispatch(Intent::NewConversation(None)).await.unwrap();
        let snap = ctrl.snapshot();
        assert_eq!(snap.conversations.len(), 1);
        assert_eq!(snap.current_conversation_id.as_deref(), Some(snap.conversations[0].id.as_str()));
        assert!(!snap.is_loading);
        assert!(chrono::DateTime::parse_from_rfc3339(&snap.conversations[0].created_at).is_ok());
    }

    #[tokio::test]
    async fn send_without_selection_fails() {
        let mut ctrl = LocalController::new(config());
        let err = ctrl
            .dispatch(Intent::SendMessage("hi".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::NoConversationSelected));
    }

    #[tokio::test]
    async fn select_unknown_fails() {
        let mut ctrl = LocalController::new(config());
        let err = ctrl
            .dispatch(Intent::SelectConversation("ghost".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::ConversationNotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn stages_populate_monotonically() {
        let mut ctrl = LocalController::new(config());
        ctrl.dispatch(Intent::NewConversation(Some("Why is the sky blue?".into())))
            .await
            .unwrap();

        let snap = ctrl.snapshot();
        assert!(snap.is_loading);
        assert_eq!(snap.conversations[0].message_count, 2);
        assert_eq!(snap.conversations[0].title.as_deref(), Some("Why is the sky blue?"));
        assert_eq!(last_kinds(&ctrl), vec![BlockKind::Stage1Loading]);

        assert!(ctrl.advance());
        assert_eq!(
            last_kinds(&ctrl),
            vec![BlockKind::Stage1Result, BlockKind::Stage2Loading]
        );

        assert!(ctrl.advance());
        assert_eq!(
            last_kinds(&ctrl),
            vec![
                BlockKind::Stage1Result,
                BlockKind::Stage2Result,
                BlockKind::Stage3Loading
            ]
        );

        assert!(ctrl.advance());
        assert_eq!(
            last_kinds(&ctrl),
            vec![
                BlockKind::Stage1Result,
                BlockKind::Stage2Result,
                BlockKind::Stage3Result
            ]
        );
        assert!(!ctrl.snapshot().is_loading);
        assert!(!ctrl.advance());
    }

    #[tokio::test]
    async fn busy_while_in_flight() {
        let mut ctrl = LocalController::new(config());
        ctrl.dispatch(Intent::NewConversation(Some("one".into())))
            .await
            .unwrap();
        assert!(matches!(
            ctrl.dispatch(Intent::SendMessage("two".into())).await,
            Err(ControllerError::Busy)
        ));
        assert!(matches!(
            ctrl.dispatch(Intent::NewConversation(None)).await,
            Err(ControllerError::Busy)
        ));
    }

    #[tokio::test]
    async fn loading_follows_the_selected_conversation() {
        let mut ctrl = LocalController::new(config());
        ctrl.dispatch(Intent::NewConversation(None)).await.unwrap();
        let idle = ctrl.snapshot().current_conversation_id.unwrap();
        ctrl.dispatch(Intent::NewConversation(Some("busy one".into())))
            .await
            .unwrap();
        let deliberating = ctrl.snapshot().current_conversation_id.unwrap();

        ctrl.dispatch(Intent::SelectConversation(idle.clone()))
            .await
            .unwrap();
        let snap = ctrl.snapshot();
        assert_eq!(snap.current_conversation_id.as_deref(), Some(idle.as_str()));
        assert!(snap.conversation.unwrap().messages.is_empty());
        assert!(!snap.is_loading);
        assert!(snap.busy);
        assert!(matches!(
            ctrl.dispatch(Intent::SendMessage("meanwhile".into())).await,
            Err(ControllerError::Busy)
        ));

        ctrl.dispatch(Intent::SelectConversation(deliberating))
            .await
            .unwrap();
        let snap = ctrl.snapshot();
        assert!(snap.is_loading);
        assert!(snap.busy);
    }

    #[tokio::test]
    async fn tick_advances_when_delay_elapsed() {
        let mut ctrl = LocalController::new(config());
        ctrl.dispatch(Intent::NewConversation(Some("q".into())))
            .await
            .unwrap();
        for _ in 0..3 {
            ctrl.tick().await.unwrap();
        }
        assert!(!ctrl.snapshot().is_loading);
        assert_eq!(last_kinds(&ctrl).last(), Some(&BlockKind::Stage3Result));
    }

    #[test]
    fn members_rank_own_answer_last() {
        let models = config().council_models;
        let responses = stage1_responses(&models, "q");
        for member in 0..models.len() {
            assert_eq!(member_order(member, &responses).last(), Some(&member));
        }
    }

    #[test]
    fn aggregate_sorted_best_first() {
        let models = config().council_models;
        let responses = stage1_responses(&models, "q");
        let (rankings, metadata) = stage2_rankings(&models, &responses);
        assert_eq!(rankings.len(), 3);
        assert!(rankings.iter().all(|r| r.parsed_ranking.len() == 3));

        let agg = metadata.aggregate_rankings.unwrap();
        assert_eq!(agg.len(), 3);
        assert!(agg.windows(2).all(|w| w[0].average_rank <= w[1].average_rank));
        assert_eq!(agg[0].model, "b/much-longer-name");
        assert!(agg.iter().all(|a| a.rankings_count == 3));

        let labels = metadata.label_to_model.unwrap();
        assert_eq!(labels.get("Response A").map(String::as_str), Some("a/short"));
    }

    #[test]
    fn titles_are_first_line_and_bounded() {
        assert_eq!(title_from_prompt("  Hello\nsecond line"), "Hello");
        let long = "x".repeat(100);
        let title = title_from_prompt(&long);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS);
        assert!(title.ends_with("..."));
    }
}
