pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{app::AppState, sync::Resource};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};
pub use theme::Theme;

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let area = frame.area();
    let theme = Theme::default();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Bottom bar
        ])
        .split(area);

    render_title_bar(frame, layout[0], state, &theme);
    screens::transactions::render(frame, layout[1], state);
    render_bottom_bar(frame, layout[2], state, &theme);

    components::busy::render(frame, area, &state.store);
    components::toast::render(frame, area, state.toast.as_ref());
}

fn render_title_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let syncing = Resource::ALL
        .into_iter()
        .any(|resource| state.store.is_loading(resource));

    let mut spans = vec![
        Span::styled(
            "Transaction Manager",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(state.base_url.as_str(), Style::default().fg(theme.text_muted)),
    ];
    if syncing {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("syncing…", Style::default().fg(theme.dim)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let mut parts = components::hints::hints_to_spans(
        &components::hints::for_focus(state.focus),
        theme,
    );
    parts.push(components::hints::hint_separator(theme));
    parts.extend(components::hints::hints_to_spans(
        &components::hints::global(),
        theme,
    ));

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}
