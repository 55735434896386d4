//! Render plans for council pipeline messages.
//!
//! An assistant message moves through three stages (individual answers,
//! peer rankings, synthesis). The plan says which blocks to draw for the
//! message as it stands right now: loading indicators and results, stage
//! by stage, in fixed order. Pure derivation, no state: the same message
//! always yields the same plan.

pub mod ranking;

use std::collections::BTreeMap;

use crate::conversation::{
    AggregateRanking, Message, Role, Stage1Response, Stage2Ranking, Stage3Result,
};

/// Tag of a render block, independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Stage1Loading,
    Stage1Result,
    Stage2Loading,
    Stage2Result,
    Stage3Loading,
    Stage3Result,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Stage1Loading => "stage1-loading",
            BlockKind::Stage1Result => "stage1-result",
            BlockKind::Stage2Loading => "stage2-loading",
            BlockKind::Stage2Result => "stage2-result",
            BlockKind::Stage3Loading => "stage3-loading",
            BlockKind::Stage3Result => "stage3-result",
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One visual block, borrowing its payload from the message.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderBlock<'a> {
    Stage1Loading,
    Stage1Result(&'a [Stage1Response]),
    Stage2Loading,
    Stage2Result {
        rankings: &'a [Stage2Ranking],
        label_to_model: Option<&'a BTreeMap<String, String>>,
        aggregate_rankings: Option<&'a [AggregateRanking]>,
    },
    Stage3Loading,
    Stage3Result(&'a Stage3Result),
}

impl RenderBlock<'_> {
    pub fn kind(&self) -> BlockKind {
        match self {
            RenderBlock::Stage1Loading => BlockKind::Stage1Loading,
            RenderBlock::Stage1Result(_) => BlockKind::Stage1Result,
            RenderBlock::Stage2Loading => BlockKind::Stage2Loading,
            RenderBlock::Stage2Result { .. } => BlockKind::Stage2Result,
            RenderBlock::Stage3Loading => BlockKind::Stage3Loading,
            RenderBlock::Stage3Result(_) => BlockKind::Stage3Result,
        }
    }
}

/// Ordered blocks for one assistant message (at most six).
pub type RenderPlan<'a> = Vec<RenderBlock<'a>>;

/// Build the render plan for an assistant message.
///
/// Each stage contributes its loading block when the flag is set and its
/// result block when data is present. Both may appear for the same stage;
/// keeping them exclusive is the controller's job.
pub fn render_plan(message: &Message) -> RenderPlan<'_> {
    let loading = message.loading.unwrap_or_default();
    let metadata = message.metadata.as_ref();
    let mut plan = Vec::with_capacity(6);

    if loading.stage1 {
        plan.push(RenderBlock::Stage1Loading);
    }
    if let Some(responses) = &message.stage1 {
        plan.push(RenderBlock::Stage1Result(responses));
    }

    if loading.stage2 {
        plan.push(RenderBlock::Stage2Loading);
    }
    if let Some(rankings) = &message.stage2 {
        plan.push(RenderBlock::Stage2Result {
            rankings,
            label_to_model: metadata.and_then(|m| m.label_to_model.as_ref()),
            aggregate_rankings: metadata.and_then(|m| m.aggregate_rankings.as_deref()),
        });
    }

    if loading.stage3 {
        plan.push(RenderBlock::Stage3Loading);
    }
    if let Some(result) = &message.stage3 {
        plan.push(RenderBlock::Stage3Result(result));
    }

    plan
}

/// What to draw for any message in a conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePlan<'a> {
    User { content: &'a str },
    Assistant(RenderPlan<'a>),
    /// Unknown role: draw nothing, siblings unaffected.
    Unrenderable,
}

pub fn plan_message(message: &Message) -> MessagePlan<'_> {
    match &message.role {
        Role::User => MessagePlan::User {
            content: &message.content,
        },
        Role::Assistant => MessagePlan::Assistant(render_plan(message)),
        Role::Other(role) => {
            tracing::debug!(role = %role, "skipping message with unrecognized role");
            MessagePlan::Unrenderable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::StageLoading;
    use crate::conversation::MessageMetadata;

    fn assistant() -> Message {
        Message {
            role: Role::Assistant,
            content: String::new(),
            stage1: None,
            stage2: None,
            stage3: None,
            metadata: None,
            loading: None,
        }
    }

    fn stage1() -> Vec<Stage1Response> {
        vec![Stage1Response {
            model: "m1".into(),
            response: "answer".into(),
        }]
    }

    fn stage2() -> Vec<Stage2Ranking> {
        vec![Stage2Ranking {
            model: "m1".into(),
            ranking: "FINAL RANKING:\n1. Response A".into(),
            parsed_ranking: vec!["Response A".into()],
        }]
    }

    fn kinds(plan: &RenderPlan) -> Vec<&'static str> {
        plan.iter().map(|b| b.kind().as_str()).collect()
    }

    #[test]
    fn only_stage1_loading() {
        let mut msg = assistant();
        msg.loading = Some(StageLoading {
            stage1: true,
            ..Default::default()
        });
        assert_eq!(kinds(&render_plan(&msg)), vec!["stage1-loading"]);
    }

    #[test]
    fn two_results_no_stage3() {
        let mut msg = assistant();
        msg.stage1 = Some(stage1());
        msg.stage2 = Some(stage2());
        msg.loading = Some(StageLoading::default());
        assert_eq!(
            kinds(&render_plan(&msg)),
            vec!["stage1-result", "stage2-result"]
        );
    }

    #[test]
    fn missing_loading_object_is_all_false() {
        let mut msg = assistant();
        msg.stage3 = Some(Stage3Result {
            model: "chair".into(),
            response: "final".into(),
        });
        assert_eq!(kinds(&render_plan(&msg)), vec!["stage3-result"]);
    }

    #[test]
    fn loading_and_result_for_same_stage_both_render() {
        let mut msg = assistant();
        msg.stage1 = Some(stage1());
        msg.loading = Some(StageLoading {
            stage1: true,
            stage2: true,
            stage3: false,
        });
        assert_eq!(
            kinds(&render_plan(&msg)),
            vec!["stage1-loading", "stage1-result", "stage2-loading"]
        );
    }

    #[test]
    fn full_plan_is_ordered_by_stage() {
        let mut msg = assistant();
        msg.stage1 = Some(stage1());
        msg.stage2 = Some(stage2());
        msg.stage3 = Some(Stage3Result {
            model: "chair".into(),
            response: "final".into(),
        });
        msg.loading = Some(StageLoading {
            stage1: true,
            stage2: true,
            stage3: true,
        });
        assert_eq!(
            kinds(&render_plan(&msg)),
            vec![
                "stage1-loading",
                "stage1-result",
                "stage2-loading",
                "stage2-result",
                "stage3-loading",
                "stage3-result",
            ]
        );
    }

    #[test]
    fn stage2_passes_metadata_through() {
        let mut labels = BTreeMap::new();
        labels.insert("Response A".to_string(), "m1".to_string());
        let aggregate = vec![AggregateRanking {
            model: "m1".into(),
            average_rank: 1.0,
            rankings_count: 1,
        }];
        let mut msg = assistant();
        msg.stage2 = Some(stage2());
        msg.metadata = Some(MessageMetadata {
            label_to_model: Some(labels.clone()),
            aggregate_rankings: Some(aggregate.clone()),
        });

        let plan = render_plan(&msg);
        match &plan[0] {
            RenderBlock::Stage2Result {
                label_to_model,
                aggregate_rankings,
                rankings,
            } => {
                assert_eq!(*label_to_model, Some(&labels));
                assert_eq!(*aggregate_rankings, Some(aggregate.as_slice()));
                assert_eq!(rankings.len(), 1);
            }
            other => panic!("expected stage2 result, got {other:?}"),
        }
    }

    #[test]
    fn stage2_without_metadata() {
        let mut msg = assistant();
        msg.stage2 = Some(stage2());
        let plan = render_plan(&msg);
        assert!(matches!(
            plan[0],
            RenderBlock::Stage2Result {
                label_to_model: None,
                aggregate_rankings: None,
                ..
            }
        ));
    }

    #[test]
    fn plan_is_idempotent() {
        let mut msg = assistant();
        msg.stage1 = Some(stage1());
        msg.loading = Some(StageLoading {
            stage2: true,
            ..Default::default()
        });
        assert_eq!(render_plan(&msg), render_plan(&msg));
        assert_eq!(plan_message(&msg), plan_message(&msg));
    }

    #[test]
    fn message_plans_by_role() {
        let user = Message::user("hello");
        assert_eq!(plan_message(&user), MessagePlan::User { content: "hello" });

        let mut odd = Message::user("ignored");
        odd.role = Role::Other("tool".into());
        assert_eq!(plan_message(&odd), MessagePlan::Unrenderable);

        let pending = Message::pending_assistant();
        match plan_message(&pending) {
            MessagePlan::Assistant(plan) => assert_eq!(kinds(&plan), vec!["stage1-loading"]),
            other => panic!("unexpected plan {other:?}"),
        }
    }
}
