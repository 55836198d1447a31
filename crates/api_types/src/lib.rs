use serde::{Deserialize, Serialize};

pub mod summary {
    use super::*;

    /// Aggregate totals over every stored transaction, computed server-side.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct Summary {
        pub income: f64,
        pub expense: f64,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct BalanceResponse {
        pub balance: f64,
    }
}

pub mod transaction {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::Deserializer;

    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Income,
        Expense,
    }

    impl TransactionKind {
        /// Capitalised label used for display.
        pub fn label(self) -> &'static str {
            match self {
                Self::Income => "Income",
                Self::Expense => "Expense",
            }
        }

        pub fn toggle(self) -> Self {
            match self {
                Self::Income => Self::Expense,
                Self::Expense => Self::Income,
            }
        }
    }

    /// A stored transaction as returned by `GET /transactions`.
    ///
    /// The backend keys documents by `_id`; plain `id` is accepted too.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Transaction {
        #[serde(rename = "_id", alias = "id")]
        pub id: String,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub amount: f64,
        pub description: String,
        #[serde(deserialize_with = "deserialize_timestamp")]
        pub date: DateTime<Utc>,
    }

    /// Request body for `POST /transactions`.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct TransactionNew {
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub amount: f64,
        pub description: String,
        pub date: DateTime<Utc>,
    }

    /// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
    fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid timestamp: {raw}"))
        })
    }

    pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

}
