//! Stage block views — one render-plan block in, styled lines out.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use super::markdown::render_markdown;
use crate::conversation::{AggregateRanking, Stage1Response, Stage2Ranking, Stage3Result};
use crate::pipeline::ranking::{deanonymize, ranked_labels, short_model_name};
use crate::pipeline::RenderBlock;

/// Braille spinner frames, advanced on every tick.
pub const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn spinner(frame: usize) -> &'static str {
    SPINNER[frame % SPINNER.len()]
}

/// Lines for a single render block.
pub fn render_block(block: &RenderBlock<'_>, frame: usize) -> Vec<Line<'static>> {
    match block {
        RenderBlock::Stage1Loading => {
            loading_line("Running Stage 1: Collecting individual responses...", frame)
        }
        RenderBlock::Stage1Result(responses) => stage1(responses),
        RenderBlock::Stage2Loading => loading_line("Running Stage 2: Peer rankings...", frame),
        RenderBlock::Stage2Result {
            rankings,
            label_to_model,
            aggregate_rankings,
        } => stage2(rankings, *label_to_model, *aggregate_rankings),
        RenderBlock::Stage3Loading => loading_line("Running Stage 3: Final synthesis...", frame),
        RenderBlock::Stage3Result(result) => stage3(result),
    }
}

pub fn loading_line(text: &str, frame: usize) -> Vec<Line<'static>> {
    vec![Line::from(vec![
        Span::styled(
            format!("{} ", spinner(frame)),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(text.to_string(), Style::default().fg(Color::Yellow)),
    ])]
}

fn stage_title(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
    ))
}

fn model_rule(model: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("── {} ──", short_model_name(model)),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

fn dim(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(text.into(), Style::default().fg(Color::DarkGray)))
}

fn stage1(responses: &[Stage1Response]) -> Vec<Line<'static>> {
    let mut lines = vec![stage_title("Stage 1: Individual Responses")];
    for r in responses {
        lines.push(Line::from(""));
        lines.push(model_rule(&r.model));
        lines.extend(render_markdown(&r.response));
    }
    lines
}

fn stage2(
    rankings: &[Stage2Ranking],
    label_to_model: Option<&std::collections::BTreeMap<String, String>>,
    aggregate: Option<&[AggregateRanking]>,
) -> Vec<Line<'static>> {
    let mut lines = vec![
        stage_title("Stage 2: Peer Rankings"),
        dim("Each model ranked the anonymized responses (Response A, B, C, ...)."),
    ];
    if label_to_model.is_some() {
        lines.push(dim("Model names are substituted for readability; the evaluation saw only labels."));
    }

    for r in rankings {
        lines.push(Line::from(""));
        lines.push(model_rule(&r.model));
        let text = match label_to_model {
            Some(map) => deanonymize(&r.ranking, map),
            None => r.ranking.clone(),
        };
        lines.extend(render_markdown(&text));

        let labels = ranked_labels(&r.parsed_ranking, &r.ranking);
        if !labels.is_empty() {
            lines.push(dim("Extracted ranking:"));
            for (i, label) in labels.iter().enumerate() {
                let name = label_to_model
                    .and_then(|m| m.get(label))
                    .map(|m| short_model_name(m).to_string())
                    .unwrap_or_else(|| label.clone());
                lines.push(Line::from(format!("  {}. {}", i + 1, name)));
            }
        }
    }

    if let Some(aggregate) = aggregate.filter(|a| !a.is_empty()) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Aggregate Rankings (Street Cred)",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
        lines.push(dim("Combined results across all peer evaluations (lower is better):"));
        for (i, agg) in aggregate.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  #{} ", i + 1),
                    Style::default().fg(Color::Green),
                ),
                Span::styled(
                    short_model_name(&agg.model).to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(
                        "  avg {:.2} ({} votes)",
                        agg.average_rank, agg.rankings_count
                    ),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        }
    }
    lines
}

fn stage3(result: &Stage3Result) -> Vec<Line<'static>> {
    let mut lines = vec![
        stage_title("Stage 3: Final Council Answer"),
        dim(format!("Chairman: {}", short_model_name(&result.model))),
    ];
    lines.extend(render_markdown(&result.response));
    lines
}
