//! Request plumbing between the UI loop and the backend.
//!
//! Reads are driven by [`Invalidation`]s published on an [`InvalidationBus`].
//! Each [`Fetcher`] subscribes to the bus, tags every request it issues with
//! a monotonically increasing [`Token`] and reports back over the event
//! channel. Mutations run as one-shot tasks through [`Mutations`].

use std::path::PathBuf;

use api_types::{
    summary::Summary,
    transaction::{Transaction, TransactionNew},
};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};

use crate::{
    client::{Backend, ClientError},
    export::{self, ExportError, ExportReport},
};

pub type Token = u64;

const BUS_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Transactions,
    Balance,
    Summary,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Self::Transactions, Self::Balance, Self::Summary];

    pub fn label(self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Balance => "balance",
            Self::Summary => "summary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    Mount,
    Manual,
    Added,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalidation {
    pub cause: Cause,
}

#[derive(Debug, Clone)]
pub struct InvalidationBus {
    tx: broadcast::Sender<Invalidation>,
}

impl Default for InvalidationBus {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }
}

impl InvalidationBus {
    pub fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.tx.subscribe()
    }

    /// Returns how many subscribers received the signal.
    pub fn publish(&self, cause: Cause) -> usize {
        tracing::debug!(?cause, "invalidating read views");
        self.tx.send(Invalidation { cause }).unwrap_or(0)
    }
}

#[derive(Debug)]
pub enum Fetched {
    Transactions(Result<Vec<Transaction>, ClientError>),
    Balance(Result<f64, ClientError>),
    Summary(Result<Summary, ClientError>),
}

impl Fetched {
    pub fn resource(&self) -> Resource {
        match self {
            Self::Transactions(_) => Resource::Transactions,
            Self::Balance(_) => Resource::Balance,
            Self::Summary(_) => Resource::Summary,
        }
    }
}

#[derive(Debug)]
pub enum MutationOutcome {
    Added(Result<(), ClientError>),
    Deleted {
        id: String,
        result: Result<(), ClientError>,
    },
    Exported(Result<ExportReport, ExportError>),
}

#[derive(Debug)]
pub enum Event {
    FetchStarted { resource: Resource, token: Token },
    Fetched { token: Token, fetched: Fetched },
    MutationFinished(MutationOutcome),
}

pub type EventSender = mpsc::UnboundedSender<Event>;

pub struct Fetcher<B> {
    resource: Resource,
    backend: B,
    events: EventSender,
    last_token: Token,
}

impl<B: Backend> Fetcher<B> {
    pub fn new(resource: Resource, backend: B, events: EventSender) -> Self {
        Self {
            resource,
            backend,
            events,
            last_token: 0,
        }
    }

    /// Subscribes before spawning so no invalidation published after this
    /// call is missed.
    pub fn spawn(self, bus: &InvalidationBus) -> JoinHandle<()> {
        let rx = bus.subscribe();
        tokio::spawn(self.run(rx))
    }

    async fn run(mut self, mut rx: broadcast::Receiver<Invalidation>) {
        loop {
            match rx.recv().await {
                Ok(invalidation) => {
                    tracing::trace!(resource = self.resource.label(), cause = ?invalidation.cause, "refetch");
                    if !self.issue() {
                        break;
                    }
                }
                // Missed signals collapse into a single refetch.
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(resource = self.resource.label(), missed, "invalidations lagged");
                    if !self.issue() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Returns false once the UI side of the event channel is gone.
    fn issue(&mut self) -> bool {
        self.last_token += 1;
        let token = self.last_token;
        let resource = self.resource;
        if self
            .events
            .send(Event::FetchStarted { resource, token })
            .is_err()
        {
            return false;
        }

        let backend = self.backend.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let fetched = match resource {
                Resource::Transactions => Fetched::Transactions(backend.transactions().await),
                Resource::Balance => Fetched::Balance(backend.balance().await),
                Resource::Summary => Fetched::Summary(backend.summary().await),
            };
            let _ = events.send(Event::Fetched { token, fetched });
        });
        true
    }
}

/// Spawns one fetcher per read resource.
pub fn spawn_fetchers<B: Backend>(
    backend: &B,
    events: &EventSender,
    bus: &InvalidationBus,
) -> Vec<JoinHandle<()>> {
    Resource::ALL
        .into_iter()
        .map(|resource| Fetcher::new(resource, backend.clone(), events.clone()).spawn(bus))
        .collect()
}

#[derive(Clone)]
pub struct Mutations<B> {
    backend: B,
    events: EventSender,
    export_dir: PathBuf,
}

impl<B: Backend> Mutations<B> {
    pub fn new(backend: B, events: EventSender, export_dir: PathBuf) -> Self {
        Self {
            backend,
            events,
            export_dir,
        }
    }

    pub fn add(&self, payload: TransactionNew) {
        let backend = self.backend.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = backend.create_transaction(payload).await;
            let _ = events.send(Event::MutationFinished(MutationOutcome::Added(result)));
        });
    }

    pub fn delete(&self, id: String) {
        let backend = self.backend.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = backend.delete_transaction(&id).await;
            let _ = events.send(Event::MutationFinished(MutationOutcome::Deleted { id, result }));
        });
    }

    pub fn export(&self) {
        let backend = self.backend.clone();
        let events = self.events.clone();
        let dir = self.export_dir.clone();
        tokio::spawn(async move {
            let result = export::export_csv(&backend, &dir).await;
            let _ = events.send(Event::MutationFinished(MutationOutcome::Exported(result)));
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::testing::FakeBackend;

    async fn recv(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn publish_without_subscribers_reaches_nobody() {
        let bus = InvalidationBus::default();
        assert_eq!(bus.publish(Cause::Manual), 0);
        let _rx = bus.subscribe();
        assert_eq!(bus.publish(Cause::Manual), 1);
    }

    #[tokio::test]
    async fn fetcher_issues_increasing_tokens() {
        let backend = FakeBackend::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let bus = InvalidationBus::default();
        Fetcher::new(Resource::Balance, backend.clone(), tx).spawn(&bus);

        bus.publish(Cause::Mount);
        bus.publish(Cause::Manual);

        let mut started = Vec::new();
        let mut finished = Vec::new();
        while finished.len() < 2 {
            match recv(&mut rx).await {
                Event::FetchStarted { resource, token } => {
                    assert_eq!(resource, Resource::Balance);
                    started.push(token);
                }
                Event::Fetched { token, fetched } => {
                    assert_eq!(fetched.resource(), Resource::Balance);
                    finished.push(token);
                }
                Event::MutationFinished(_) => unreachable!(),
            }
        }
        assert_eq!(started, [1, 2]);
        finished.sort_unstable();
        assert_eq!(finished, [1, 2]);
        assert_eq!(backend.calls().balance, 2);
    }

    #[tokio::test]
    async fn each_fetcher_runs_once_per_invalidation() {
        let backend = FakeBackend::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let bus = InvalidationBus::default();
        spawn_fetchers(&backend, &tx, &bus);

        assert_eq!(bus.publish(Cause::Added), 3);

        let mut completed = Vec::new();
        while completed.len() < 3 {
            if let Event::Fetched { fetched, .. } = recv(&mut rx).await {
                completed.push(fetched.resource());
            }
        }
        let calls = backend.calls();
        assert_eq!((calls.transactions, calls.balance, calls.summary), (1, 1, 1));
    }

    #[tokio::test]
    async fn delete_reports_identifier_and_failure() {
        let backend = FakeBackend::default();
        backend.fail_deletes();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mutations = Mutations::new(backend.clone(), tx, PathBuf::from("."));

        mutations.delete("2".to_string());

        match recv(&mut rx).await {
            Event::MutationFinished(MutationOutcome::Deleted { id, result }) => {
                assert_eq!(id, "2");
                assert!(result.is_err());
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(backend.deleted_ids(), ["2".to_string()]);
    }
}
