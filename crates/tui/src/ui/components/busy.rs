use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::{
    store::Store,
    ui::{components::centered_rect, theme::Theme},
};

/// Blocking overlay shown while a mutation is in flight.
pub fn render(frame: &mut Frame<'_>, area: Rect, store: &Store) {
    if !store.any_mutation_in_flight() {
        return;
    }
    let Some(kind) = store.mutation.kind else {
        return;
    };

    let theme = Theme::default();
    let label = format!("{}…", kind.label());
    let width = label.chars().count() as u16 + 6;
    let popup = centered_rect(width, 3, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.accent));
    let content = Paragraph::new(Line::from(label))
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(theme.text)
                .add_modifier(Modifier::BOLD),
        )
        .block(block);

    frame.render_widget(Clear, popup);
    frame.render_widget(content, popup);
}
