use api_types::transaction::TransactionKind;
use ratatui::{style::Style, text::Span};

use crate::ui::theme::Theme;

/// `$` followed by the shortest decimal rendering of the amount.
#[must_use]
pub fn format_amount(amount: f64) -> String {
    format!("${amount}")
}

#[must_use]
pub fn kind_style(kind: TransactionKind, theme: &Theme) -> Style {
    match kind {
        TransactionKind::Income => Style::default().fg(theme.positive),
        TransactionKind::Expense => Style::default().fg(theme.negative),
    }
}

/// Capitalised kind label coloured by direction.
#[must_use]
pub fn styled_kind(kind: TransactionKind, theme: &Theme) -> Span<'static> {
    Span::styled(kind.label(), kind_style(kind, theme))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_like_plain_numbers() {
        assert_eq!(format_amount(100.0), "$100");
        assert_eq!(format_amount(25.5), "$25.5");
        assert_eq!(format_amount(0.0), "$0");
    }

    #[test]
    fn kinds_use_distinct_colours() {
        let theme = Theme::default();
        assert_eq!(styled_kind(TransactionKind::Income, &theme).content, "Income");
        assert_ne!(
            kind_style(TransactionKind::Income, &theme),
            kind_style(TransactionKind::Expense, &theme)
        );
    }
}
