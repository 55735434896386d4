//! Markdown rendering for message bodies.
//!
//! Thin wrapper around `tui-markdown`: converts markdown text into owned,
//! styled ratatui `Line`s. Pipe-delimited tables (which `tui-markdown`
//! does not lay out) are intercepted and drawn with box-drawing borders;
//! council answers lean on comparison tables heavily.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

/// Parse markdown text and return styled lines suitable for a `Paragraph`.
pub fn render_markdown(text: &str) -> Vec<Line<'static>> {
    let mut result = Vec::new();
    let mut prose = String::new();

    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;
    let mut in_fence = false;

    while i < lines.len() {
        let line = lines[i];
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }
        if !in_fence && is_table_line(line) {
            flush_prose(&mut prose, &mut result);
            let start = i;
            while i < lines.len() && is_table_line(lines[i]) {
                i += 1;
            }
            result.extend(render_table_block(&lines[start..i]));
        } else {
            prose.push_str(line);
            prose.push('\n');
            i += 1;
        }
    }
    flush_prose(&mut prose, &mut result);
    result
}

fn flush_prose(prose: &mut String, out: &mut Vec<Line<'static>>) {
    if !prose.trim().is_empty() {
        out.extend(render_markdown_raw(prose));
    }
    prose.clear();
}

/// A line belongs to a markdown table if it starts with `|`.
fn is_table_line(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

/// Split a table row into trimmed cells, dropping the outer pipes.
fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|c| c.trim().to_string()).collect()
}

/// Separator rows are all dashes and colons (`|---|:--:|`).
fn is_separator(cells: &[String]) -> bool {
    cells.iter().all(|c| {
        !c.is_empty() && c.chars().all(|ch| ch == '-' || ch == ':' || ch == ' ')
    })
}

/// Render a pipe-delimited table as box-drawing art.
fn render_table_block(lines: &[&str]) -> Vec<Line<'static>> {
    let rows: Vec<Vec<String>> = lines
        .iter()
        .map(|l| split_cells(l))
        .filter(|cells| !is_separator(cells))
        .collect();
    if rows.is_empty() {
        return Vec::new();
    }

    // Column widths by display width (emoji and CJK are double-width).
    let col_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut col_widths = vec![3usize; col_count];
    for row in &rows {
        for (j, cell) in row.iter().enumerate() {
            col_widths[j] = col_widths[j].max(cell.width());
        }
    }

    let border = Style::default().fg(Color::DarkGray);
    let mut result = vec![Line::from(Span::styled(
        build_border(&col_widths, '┌', '┬', '┐'),
        border,
    ))];

    for (i, row) in rows.iter().enumerate() {
        let style = if i == 0 {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let mut spans = vec![Span::styled("│", border)];
        for (j, width) in col_widths.iter().enumerate() {
            let cell = row.get(j).map(String::as_str).unwrap_or("");
            let pad = width.saturating_sub(cell.width());
            spans.push(Span::styled(format!(" {}{} ", cell, " ".repeat(pad)), style));
            spans.push(Span::styled("│", border));
        }
        result.push(Line::from(spans));

        if i == 0 && rows.len() > 1 {
            result.push(Line::from(Span::styled(
                build_border(&col_widths, '├', '┼', '┤'),
                border,
            )));
        }
    }

    result.push(Line::from(Span::styled(
        build_border(&col_widths, '└', '┴', '┘'),
        border,
    )));
    result
}

/// Horizontal border: left + (─ × (width + 2)) joined by mid + right.
fn build_border(col_widths: &[usize], left: char, mid: char, right: char) -> String {
    let mut s = String::new();
    s.push(left);
    for (i, w) in col_widths.iter().enumerate() {
        s.extend(std::iter::repeat('─').take(w + 2));
        if i + 1 < col_widths.len() {
            s.push(mid);
        }
    }
    s.push(right);
    s
}

/// Render plain markdown via tui-markdown, converting to owned spans.
fn render_markdown_raw(text: &str) -> Vec<Line<'static>> {
    tui_markdown::from_str(text)
        .lines
        .into_iter()
        .map(|line| {
            let spans: Vec<Span<'static>> = line
                .spans
                .into_iter()
                .map(|span| Span::styled(span.content.into_owned(), span.style))
                .collect();
            Line::from(spans).style(line.style)
        })
        .collect()
}

/// Plain text of rendered lines, one line per row.
pub fn lines_to_text(lines: &[Line]) -> String {
    lines
        .iter()
        .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
