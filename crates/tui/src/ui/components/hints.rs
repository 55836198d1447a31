use ratatui::{style::Style, text::Span};

use crate::{app::Focus, ui::theme::Theme};

/// A keyboard hint consisting of a key and its action.
#[derive(Debug, Clone)]
pub struct KeyHint {
    pub key: &'static str,
    pub action: &'static str,
}

impl KeyHint {
    pub const fn new(key: &'static str, action: &'static str) -> Self {
        Self { key, action }
    }
}

pub fn hints_to_spans(hints: &[KeyHint], theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();

    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(hint.key, Style::default().fg(theme.accent)));
        spans.push(Span::raw(format!(" {}", hint.action)));
    }

    spans
}

pub fn hint_separator(theme: &Theme) -> Span<'static> {
    Span::styled("  │  ", Style::default().fg(theme.border))
}

/// Hints for the focused control.
pub fn for_focus(focus: Focus) -> Vec<KeyHint> {
    match focus {
        Focus::FormKind => vec![
            KeyHint::new("←→", "income/expense"),
            KeyHint::new("Enter", "add"),
        ],
        Focus::FilterKind => vec![
            KeyHint::new("←→", "type"),
            KeyHint::new("Esc", "all"),
        ],
        Focus::FormAmount | Focus::FormDescription => vec![
            KeyHint::new("type", "edit"),
            KeyHint::new("Enter", "add"),
        ],
        Focus::FilterDate => vec![
            KeyHint::new("YYYY-MM-DD", "date"),
            KeyHint::new("Esc", "clear"),
        ],
        Focus::Table => vec![
            KeyHint::new("↑↓", "select"),
            KeyHint::new("d", "delete"),
            KeyHint::new("q", "quit"),
        ],
    }
}

pub fn global() -> Vec<KeyHint> {
    vec![
        KeyHint::new("Tab", "next"),
        KeyHint::new("Ctrl+E", "export"),
        KeyHint::new("Ctrl+R", "refresh"),
        KeyHint::new("Ctrl+C", "quit"),
    ]
}
