use api_types::transaction::{TransactionKind, TransactionNew};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Amount is required.")]
    MissingAmount,
    #[error("Amount must be a number.")]
    InvalidAmount,
    #[error("Amount cannot be negative.")]
    NegativeAmount,
    #[error("Description is required.")]
    MissingDescription,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionForm {
    pub kind: TransactionKind,
    pub amount: String,
    pub description: String,
    pub error: Option<FormError>,
}

impl Default for TransactionForm {
    fn default() -> Self {
        Self {
            kind: TransactionKind::Income,
            amount: String::new(),
            description: String::new(),
            error: None,
        }
    }
}

impl TransactionForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Builds the request body, stamping `now` as the transaction date.
    pub fn to_payload(&self, now: DateTime<Utc>) -> Result<TransactionNew, FormError> {
        let raw_amount = self.amount.trim();
        if raw_amount.is_empty() {
            return Err(FormError::MissingAmount);
        }
        let amount = raw_amount
            .parse::<f64>()
            .ok()
            .filter(|amount| amount.is_finite())
            .ok_or(FormError::InvalidAmount)?;
        if amount < 0.0 {
            return Err(FormError::NegativeAmount);
        }

        let description = self.description.trim();
        if description.is_empty() {
            return Err(FormError::MissingDescription);
        }

        Ok(TransactionNew {
            kind: self.kind,
            amount,
            description: description.to_string(),
            date: now,
        })
    }
}
