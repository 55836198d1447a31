use api_types::transaction::{Transaction, TransactionKind};
use chrono::NaiveDate;
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeFilter {
    #[default]
    All,
    Income,
    Expense,
}

impl TypeFilter {
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All Types",
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }

    pub fn matches(self, kind: TransactionKind) -> bool {
        match self {
            Self::All => true,
            Self::Income => kind == TransactionKind::Income,
            Self::Expense => kind == TransactionKind::Expense,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Income,
            Self::Income => Self::Expense,
            Self::Expense => Self::All,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::All => Self::Expense,
            Self::Income => Self::All,
            Self::Expense => Self::Income,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterState {
    pub kind: TypeFilter,
    pub date: Option<NaiveDate>,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.kind == TypeFilter::All && self.date.is_none()
    }

    fn keeps(&self, tx: &Transaction, tz: &Tz) -> bool {
        if !self.kind.matches(tx.kind) {
            return false;
        }
        match self.date {
            Some(day) => local_day(tx, tz) == day,
            None => true,
        }
    }
}

/// Calendar day of the transaction timestamp in `tz`.
pub fn local_day(tx: &Transaction, tz: &Tz) -> NaiveDate {
    tx.date.with_timezone(tz).date_naive()
}

/// Derives the displayed list; order is preserved.
pub fn apply(transactions: &[Transaction], filter: &FilterState, tz: &Tz) -> Vec<Transaction> {
    if filter.is_empty() {
        return transactions.to_vec();
    }
    transactions
        .iter()
        .filter(|tx| filter.keeps(tx, tz))
        .cloned()
        .collect()
}

/// Parses the date filter input; blank means "no date filter".
pub fn parse_date_input(input: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map(Some)
}
