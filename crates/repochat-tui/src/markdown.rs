//! Markdown to ratatui lines
//!
//! Covers what the analyzer's answers actually use: headings, lists (including
//! task lists), block quotes, fenced code, pipe tables, and the inline
//! **bold**, *italic*, `code` and ~strikethrough~ markers. Anything else is
//! shown as plain text.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const CODE_STYLE: Style = Style::new().fg(Color::Green);
const QUOTE_STYLE: Style = Style::new().fg(Color::DarkGray).add_modifier(Modifier::ITALIC);
const TABLE_RULE: &str = " │ ";

/// Render a whole markdown document into display lines.
pub fn render_markdown(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for raw in text.lines() {
        let trimmed = raw.trim_start();

        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }
        if in_code_block {
            lines.push(Line::from(Span::styled(format!("  {}", raw), CODE_STYLE)));
            continue;
        }

        lines.push(render_block_line(trimmed, raw));
    }

    lines
}

fn render_block_line(trimmed: &str, raw: &str) -> Line<'static> {
    if trimmed.is_empty() {
        return Line::default();
    }

    // Headings
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) && trimmed[hashes..].starts_with(' ') {
        let style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        return Line::from(parse_inline(trimmed[hashes..].trim(), style));
    }

    // Block quotes
    if let Some(rest) = trimmed.strip_prefix('>') {
        let mut spans = vec![Span::styled("▎ ", QUOTE_STYLE)];
        spans.extend(parse_inline(rest.trim_start(), QUOTE_STYLE));
        return Line::from(spans);
    }

    // Tables: drop the |---|---| separator, draw the rest as plain rows
    if trimmed.starts_with('|') {
        if is_table_separator(trimmed) {
            return Line::from(Span::styled(
                "─".repeat(trimmed.chars().count()),
                Style::default().fg(Color::DarkGray),
            ));
        }
        return render_table_row(trimmed);
    }

    // Bullet and task lists
    let indent = " ".repeat(raw.len() - trimmed.len());
    for bullet in ["- ", "* ", "+ "] {
        if let Some(item) = trimmed.strip_prefix(bullet) {
            let (marker, item) = if let Some(rest) = item.strip_prefix("[ ] ") {
                ("☐ ", rest)
            } else if let Some(rest) = item
                .strip_prefix("[x] ")
                .or_else(|| item.strip_prefix("[X] "))
            {
                ("☑ ", rest)
            } else {
                ("• ", item)
            };
            let mut spans = vec![Span::raw(format!("{}{}", indent, marker))];
            spans.extend(parse_inline(item, Style::default()));
            return Line::from(spans);
        }
    }

    let mut spans = Vec::new();
    if !indent.is_empty() {
        spans.push(Span::raw(indent));
    }
    spans.extend(parse_inline(trimmed, Style::default()));
    Line::from(spans)
}

fn is_table_separator(row: &str) -> bool {
    row.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

fn render_table_row(row: &str) -> Line<'static> {
    let inner = row.trim().trim_start_matches('|').trim_end_matches('|');
    let mut spans = Vec::new();
    for (i, cell) in inner.split('|').enumerate() {
        if i > 0 {
            spans.push(Span::styled(TABLE_RULE, Style::default().fg(Color::DarkGray)));
        }
        spans.extend(parse_inline(cell.trim(), Style::default()));
    }
    Line::from(spans)
}

/// Find the next occurrence of `delim` at or after `from`.
fn find_closing(chars: &[char], from: usize, delim: &[char]) -> Option<usize> {
    if delim.is_empty() || chars.len() < delim.len() {
        return None;
    }
    (from..=chars.len() - delim.len()).find(|&i| chars[i..i + delim.len()] == *delim)
}

/// Parse inline markers on one line into styled spans.
pub fn parse_inline(text: &str, base: Style) -> Vec<Span<'static>> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut plain = String::new();
    let mut i = 0;

    let flush = |plain: &mut String, spans: &mut Vec<Span<'static>>| {
        if !plain.is_empty() {
            spans.push(Span::styled(std::mem::take(plain), base));
        }
    };

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let prev = if i > 0 { Some(chars[i - 1]) } else { None };

        let (delim, style): (&[char], Style) = match (c, next) {
            ('`', _) => (&['`'][..], CODE_STYLE),
            ('*', Some('*')) => (&['*', '*'][..], base.add_modifier(Modifier::BOLD)),
            ('~', Some('~')) => (&['~', '~'][..], base.add_modifier(Modifier::CROSSED_OUT)),
            ('~', _) => (&['~'][..], base.add_modifier(Modifier::CROSSED_OUT)),
            ('*', Some(n)) if !n.is_whitespace() => (&['*'][..], base.add_modifier(Modifier::ITALIC)),
            ('_', Some(n))
                if !n.is_whitespace() && !prev.is_some_and(|p| p.is_alphanumeric()) =>
            {
                (&['_'][..], base.add_modifier(Modifier::ITALIC))
            }
            _ => {
                plain.push(c);
                i += 1;
                continue;
            }
        };

        let start = i + delim.len();
        let mut closing = find_closing(&chars, start, delim);
        // "***" closes bold around a trailing italic: the bold marker is the last two
        if let Some(end) = closing.as_mut() {
            if delim.len() == 2 && delim[0] == '*' {
                while chars.get(*end + 2) == Some(&'*') {
                    *end += 1;
                }
            }
        }

        match closing {
            Some(end) if end > start => {
                flush(&mut plain, &mut spans);
                let inner: String = chars[start..end].iter().collect();
                if c == '`' {
                    spans.push(Span::styled(inner, style));
                } else {
                    spans.extend(parse_inline(&inner, style));
                }
                i = end + delim.len();
            }
            _ => {
                // No closing marker, treat as literal
                plain.extend(delim.iter());
                i = start;
            }
        }
    }

    flush(&mut plain, &mut spans);
    spans
}
