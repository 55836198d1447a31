use api_types::{summary::Summary, transaction::Transaction};
use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::{
    filter::{self, FilterState, TypeFilter},
    sync::{Cause, Event, Fetched, MutationOutcome, Resource, Token},
};

/// Lifecycle of one request-backed operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OpStatus {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed(String),
}

impl OpStatus {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }
}

/// A read-only mirror of one backend resource.
#[derive(Debug, Default)]
pub struct Slot<T> {
    pub value: T,
    pub status: OpStatus,
    latest: Token,
}

impl<T> Slot<T> {
    fn begin(&mut self, token: Token) {
        self.latest = self.latest.max(token);
        self.status = OpStatus::InFlight;
    }

    /// Applies a completion; `None` when the token has been superseded.
    fn complete<E: std::fmt::Display>(
        &mut self,
        token: Token,
        result: Result<T, E>,
    ) -> Option<Result<(), String>> {
        if token != self.latest {
            return None;
        }
        match result {
            Ok(value) => {
                self.value = value;
                self.status = OpStatus::Succeeded;
                Some(Ok(()))
            }
            Err(err) => {
                let reason = err.to_string();
                self.status = OpStatus::Failed(reason.clone());
                Some(Err(reason))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Add,
    Delete,
    Export,
}

impl MutationKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Add => "Adding transaction",
            Self::Delete => "Deleting transaction",
            Self::Export => "Exporting CSV",
        }
    }
}

#[derive(Debug, Default)]
pub struct MutationSlot {
    pub kind: Option<MutationKind>,
    pub status: OpStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} is still running", .0.label())]
pub struct Busy(pub MutationKind);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

/// Side effects the owner of the store must carry out after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Invalidate(Cause),
    ResetForm,
    Notify { level: Level, message: String },
}

#[derive(Debug)]
pub struct Store {
    pub transactions: Slot<Vec<Transaction>>,
    pub balance: Slot<f64>,
    pub summary: Slot<Summary>,
    pub mutation: MutationSlot,
    filter: FilterState,
    displayed: Vec<Transaction>,
    tz: Tz,
    resync_on_failed_delete: bool,
}

impl Store {
    pub fn new(tz: Tz, resync_on_failed_delete: bool) -> Self {
        Self {
            transactions: Slot::default(),
            balance: Slot::default(),
            summary: Slot::default(),
            mutation: MutationSlot::default(),
            filter: FilterState::default(),
            displayed: Vec::new(),
            tz,
            resync_on_failed_delete,
        }
    }

    pub fn tz(&self) -> &Tz {
        &self.tz
    }

    pub fn filter(&self) -> FilterState {
        self.filter
    }

    pub fn displayed(&self) -> &[Transaction] {
        &self.displayed
    }

    pub fn status(&self, resource: Resource) -> &OpStatus {
        match resource {
            Resource::Transactions => &self.transactions.status,
            Resource::Balance => &self.balance.status,
            Resource::Summary => &self.summary.status,
        }
    }

    pub fn is_loading(&self, resource: Resource) -> bool {
        self.status(resource).is_in_flight()
    }

    pub fn any_mutation_in_flight(&self) -> bool {
        self.mutation.status.is_in_flight()
    }

    pub fn set_type_filter(&mut self, kind: TypeFilter) {
        self.filter.kind = kind;
        self.refilter();
    }

    pub fn set_date_filter(&mut self, date: Option<NaiveDate>) {
        self.filter.date = date;
        self.refilter();
    }

    fn refilter(&mut self) {
        self.displayed = filter::apply(&self.transactions.value, &self.filter, &self.tz);
    }

    /// Claims the mutation slot; rejected while another mutation runs.
    pub fn begin_mutation(&mut self, kind: MutationKind) -> Result<(), Busy> {
        if self.mutation.status.is_in_flight()
            && let Some(running) = self.mutation.kind
        {
            return Err(Busy(running));
        }
        self.mutation.kind = Some(kind);
        self.mutation.status = OpStatus::InFlight;
        Ok(())
    }

    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::FetchStarted { resource, token } => {
                match resource {
                    Resource::Transactions => self.transactions.begin(token),
                    Resource::Balance => self.balance.begin(token),
                    Resource::Summary => self.summary.begin(token),
                }
                Vec::new()
            }
            Event::Fetched { token, fetched } => self.apply_fetched(token, fetched),
            Event::MutationFinished(outcome) => self.apply_mutation(outcome),
        }
    }

    fn apply_fetched(&mut self, token: Token, fetched: Fetched) -> Vec<Effect> {
        let resource = fetched.resource();
        let applied = match fetched {
            Fetched::Transactions(result) => {
                let applied = self.transactions.complete(token, result);
                if matches!(applied, Some(Ok(()))) {
                    self.refilter();
                }
                applied
            }
            Fetched::Balance(result) => self.balance.complete(token, result),
            Fetched::Summary(result) => self.summary.complete(token, result),
        };

        match applied {
            None => {
                tracing::debug!(resource = resource.label(), token, "discarding stale response");
                Vec::new()
            }
            Some(Ok(())) => Vec::new(),
            Some(Err(reason)) => {
                tracing::warn!(resource = resource.label(), %reason, "fetch failed");
                vec![Effect::Notify {
                    level: Level::Error,
                    message: format!("Error fetching {}: {reason}", resource.label()),
                }]
            }
        }
    }

    fn apply_mutation(&mut self, outcome: MutationOutcome) -> Vec<Effect> {
        match outcome {
            MutationOutcome::Added(Ok(())) => {
                self.finish_mutation(OpStatus::Succeeded);
                tracing::info!("transaction added");
                vec![
                    Effect::ResetForm,
                    Effect::Invalidate(Cause::Added),
                    Effect::Notify {
                        level: Level::Success,
                        message: "Transaction added".to_string(),
                    },
                ]
            }
            MutationOutcome::Added(Err(err)) => {
                tracing::warn!(error = %err, "adding transaction failed");
                self.finish_mutation(OpStatus::Failed(err.to_string()));
                vec![Effect::Notify {
                    level: Level::Error,
                    message: format!("Error adding transaction: {err}"),
                }]
            }
            MutationOutcome::Deleted { id, result: Ok(()) } => {
                tracing::info!(%id, "transaction deleted");
                self.finish_mutation(OpStatus::Succeeded);
                vec![
                    Effect::Invalidate(Cause::Deleted),
                    Effect::Notify {
                        level: Level::Success,
                        message: "Transaction deleted".to_string(),
                    },
                ]
            }
            MutationOutcome::Deleted {
                id,
                result: Err(err),
            } => {
                tracing::warn!(%id, error = %err, "deleting transaction failed");
                self.finish_mutation(OpStatus::Failed(err.to_string()));
                let mut effects = Vec::new();
                if self.resync_on_failed_delete {
                    effects.push(Effect::Invalidate(Cause::Deleted));
                }
                effects.push(Effect::Notify {
                    level: Level::Error,
                    message: format!("Error deleting transaction: {err}"),
                });
                effects
            }
            MutationOutcome::Exported(Ok(report)) => {
                self.finish_mutation(OpStatus::Succeeded);
                vec![Effect::Notify {
                    level: Level::Success,
                    message: report.summary(),
                }]
            }
            MutationOutcome::Exported(Err(err)) => {
                tracing::warn!(error = %err, "csv export failed");
                self.finish_mutation(OpStatus::Failed(err.to_string()));
                vec![Effect::Notify {
                    level: Level::Error,
                    message: format!("Error exporting CSV: {err}"),
                }]
            }
        }
    }

    fn finish_mutation(&mut self, status: OpStatus) {
        self.mutation.status = status;
    }
}
