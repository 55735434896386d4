//! Stage 2 display helpers.
//!
//! Peer rankings are written against anonymous labels (`Response A`,
//! `Response B`, ...). These helpers only change how a ranking reads;
//! they never recompute scores.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

/// Header that opens the machine-readable part of a ranking.
pub const FINAL_RANKING_HEADER: &str = "FINAL RANKING:";

/// Anonymous label for the stage 1 answer at `index` (0 → `Response A`).
pub fn label_for(index: usize) -> String {
    let letter = (b'A' + (index % 26) as u8) as char;
    format!("Response {letter}")
}

/// Provider-less model name: `openai/gpt-5.1` → `gpt-5.1`.
pub fn short_model_name(model: &str) -> &str {
    model.rsplit_once('/').map(|(_, name)| name).unwrap_or(model)
}

/// Replace each anonymous label in `text` with the short model name it
/// stands for. Longer labels are substituted first so `Response A`
/// never clobbers a hypothetical `Response AB`.
pub fn deanonymize(text: &str, label_to_model: &BTreeMap<String, String>) -> String {
    let mut labels: Vec<(&String, &String)> = label_to_model.iter().collect();
    labels.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

    let mut out = text.to_string();
    for (label, model) in labels {
        out = out.replace(label.as_str(), short_model_name(model));
    }
    out
}

fn numbered_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\.\s*(Response [A-Z])").expect("static regex"))
}

fn bare_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Response [A-Z]").expect("static regex"))
}

/// Extract the ordered labels from a ranking's `FINAL RANKING:` section.
///
/// Prefers numbered entries (`1. Response C`); falls back to any label
/// mention after the header, then anywhere in the text.
pub fn parse_ranking(text: &str) -> Vec<String> {
    let section = text
        .find(FINAL_RANKING_HEADER)
        .map(|i| &text[i + FINAL_RANKING_HEADER.len()..]);

    if let Some(section) = section {
        let numbered: Vec<String> = numbered_label_re()
            .captures_iter(section)
            .map(|c| c[1].to_string())
            .collect();
        if !numbered.is_empty() {
            return numbered;
        }
        let bare = collect_bare(section);
        if !bare.is_empty() {
            return bare;
        }
    }
    collect_bare(text)
}

fn collect_bare(text: &str) -> Vec<String> {
    bare_label_re()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Ranked labels for display: the backend's parse when present,
/// otherwise parsed locally from the raw text.
pub fn ranked_labels(parsed: &[String], raw: &str) -> Vec<String> {
    if parsed.is_empty() {
        parse_ranking(raw)
    } else {
        parsed.to_vec()
    }
}
