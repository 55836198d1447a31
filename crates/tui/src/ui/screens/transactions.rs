use api_types::transaction::{Transaction, TransactionKind};
use chrono_tz::Tz;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
};

use crate::{
    app::{AppState, Focus},
    filter,
    store::OpStatus,
    sync::Resource,
    ui::{
        components::{
            card::{Card, StatCard},
            money::{format_amount, kind_style, styled_kind},
        },
        theme::Theme,
    },
};

pub const EMPTY_TABLE_MESSAGE: &str = "No transactions found";

const COLUMNS: [&str; 5] = ["Type", "Amount", "Description", "Date", "Actions"];

/// One line of the history table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRow {
    Entry {
        kind: TransactionKind,
        amount: String,
        description: String,
        date: String,
    },
    Placeholder,
}

/// Rows for the displayed list; an empty list yields a single placeholder.
pub fn table_rows(displayed: &[Transaction], tz: &Tz) -> Vec<TableRow> {
    if displayed.is_empty() {
        return vec![TableRow::Placeholder];
    }
    displayed
        .iter()
        .map(|tx| TableRow::Entry {
            kind: tx.kind,
            amount: format_amount(tx.amount),
            description: tx.description.clone(),
            date: filter::local_day(tx, tz).format("%Y-%m-%d").to_string(),
        })
        .collect()
}

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Summary cards
            Constraint::Length(6), // Form and filters
            Constraint::Min(4),    // History
        ])
        .split(area);

    render_summary(frame, layout[0], state, &theme);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(layout[1]);
    render_form(frame, middle[0], state, &theme);
    render_filters(frame, middle[1], state, &theme);

    render_table(frame, layout[2], state, &theme);
}

fn loading_title(title: &str, status: &OpStatus) -> String {
    match status {
        OpStatus::InFlight => format!("{title} …"),
        OpStatus::Failed(_) => format!("{title} !"),
        _ => title.to_string(),
    }
}

fn render_summary(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let store = &state.store;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    StatCard::new(
        loading_title("Current Balance", store.status(Resource::Balance)),
        format_amount(store.balance.value),
        theme,
    )
    .render(frame, cols[0]);

    let summary_status = store.status(Resource::Summary);
    StatCard::new(
        loading_title("Total Income", summary_status),
        format_amount(store.summary.value.income),
        theme,
    )
    .value_style(Style::default().fg(theme.positive))
    .render(frame, cols[1]);

    StatCard::new(
        loading_title("Total Expense", summary_status),
        format_amount(store.summary.value.expense),
        theme,
    )
    .value_style(Style::default().fg(theme.negative))
    .render(frame, cols[2]);
}

fn field_line<'a>(
    label: &'a str,
    value: Span<'a>,
    focused: bool,
    editable: bool,
    theme: &Theme,
) -> Line<'a> {
    let marker = if focused { "› " } else { "  " };
    let label_style = if focused {
        Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text_muted)
    };
    let mut spans = vec![
        Span::styled(marker, Style::default().fg(theme.accent)),
        Span::styled(format!("{label:<12}"), label_style),
        value,
    ];
    if focused && editable {
        spans.push(Span::styled("▏", Style::default().fg(theme.accent)));
    }
    Line::from(spans)
}

fn text_value<'a>(value: &'a str, placeholder: &'a str, theme: &Theme) -> Span<'a> {
    if value.is_empty() {
        Span::styled(placeholder, Style::default().fg(theme.dim))
    } else {
        Span::styled(value, Style::default().fg(theme.text))
    }
}

fn render_form(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let form = &state.form;
    let focus = state.focus;

    let mut lines = vec![
        field_line(
            "Type",
            Span::styled(
                format!("< {} >", form.kind.label()),
                kind_style(form.kind, theme),
            ),
            focus == Focus::FormKind,
            false,
            theme,
        ),
        field_line(
            "Amount",
            text_value(&form.amount, "Amount", theme),
            focus == Focus::FormAmount,
            true,
            theme,
        ),
        field_line(
            "Description",
            text_value(&form.description, "Description", theme),
            focus == Focus::FormDescription,
            true,
            theme,
        ),
    ];
    if let Some(err) = &form.error {
        lines.push(Line::from(Span::styled(
            format!("  {err}"),
            Style::default().fg(theme.error),
        )));
    }

    Card::new("Add New Transaction", theme)
        .focused(focus.is_form())
        .render_with(frame, area, Paragraph::new(lines));
}

fn render_filters(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let focus = state.focus;
    let date_style = if state.filter_date_invalid() {
        Style::default().fg(theme.error)
    } else {
        Style::default().fg(theme.text)
    };
    let date_value = if state.filter_date_input.is_empty() {
        Span::styled("YYYY-MM-DD", Style::default().fg(theme.dim))
    } else {
        Span::styled(state.filter_date_input.as_str(), date_style)
    };

    let lines = vec![
        field_line(
            "Type",
            Span::styled(
                format!("< {} >", state.store.filter().kind.label()),
                Style::default().fg(theme.text),
            ),
            focus == Focus::FilterKind,
            false,
            theme,
        ),
        field_line(
            "Date",
            date_value,
            focus == Focus::FilterDate,
            true,
            theme,
        ),
    ];

    Card::new("Filter Transactions", theme)
        .focused(matches!(focus, Focus::FilterKind | Focus::FilterDate))
        .render_with(frame, area, Paragraph::new(lines));
}

fn render_table(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let store = &state.store;
    let title = loading_title(
        "Transaction History",
        store.status(Resource::Transactions),
    );
    let card = Card::new(title, theme).focused(state.focus == Focus::Table);
    let inner = card.inner(area);
    frame.render_widget(card.block(), area);

    let widths = [
        Constraint::Length(9),
        Constraint::Length(12),
        Constraint::Min(12),
        Constraint::Length(12),
        Constraint::Length(8),
    ];
    let header = Row::new(COLUMNS.map(Cell::from)).style(
        Style::default()
            .fg(theme.text_muted)
            .add_modifier(Modifier::BOLD),
    );

    let rows = table_rows(store.displayed(), store.tz());
    if rows == [TableRow::Placeholder] {
        frame.render_widget(
            Table::new(Vec::<Row>::new(), widths).header(header),
            inner,
        );
        let below_header = Rect {
            y: inner.y.saturating_add(1),
            height: inner.height.saturating_sub(1).min(1),
            ..inner
        };
        frame.render_widget(
            Paragraph::new(EMPTY_TABLE_MESSAGE)
                .alignment(Alignment::Center)
                .style(Style::default().fg(theme.dim)),
            below_header,
        );
        return;
    }

    let rows = rows.into_iter().filter_map(|row| match row {
        TableRow::Entry {
            kind,
            amount,
            description,
            date,
        } => Some(Row::new(vec![
            Cell::from(styled_kind(kind, theme)),
            Cell::from(amount),
            Cell::from(description),
            Cell::from(date),
            Cell::from(Span::styled("Delete", Style::default().fg(theme.error))),
        ])),
        TableRow::Placeholder => None,
    });

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");

    let mut table_state = TableState::default().with_selected(Some(state.selected));
    frame.render_stateful_widget(table, inner, &mut table_state);
}

#[cfg(test)]
mod tests {
    use api_types::transaction::parse_timestamp;

    use super::*;

    fn tx(id: &str, kind: TransactionKind, amount: f64, date: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            kind,
            amount,
            description: format!("note {id}"),
            date: parse_timestamp(date).unwrap(),
        }
    }

    #[test]
    fn empty_list_yields_one_placeholder() {
        assert_eq!(table_rows(&[], &Tz::UTC), vec![TableRow::Placeholder]);
    }

    #[test]
    fn entries_are_formatted_for_display() {
        let rows = table_rows(
            &[tx("1", TransactionKind::Income, 100.0, "2024-01-01T22:30:00Z")],
            &chrono_tz::Asia::Tokyo,
        );
        assert_eq!(
            rows,
            vec![TableRow::Entry {
                kind: TransactionKind::Income,
                amount: "$100".to_string(),
                description: "note 1".to_string(),
                date: "2024-01-02".to_string(),
            }]
        );
    }
}
