use std::time::{Duration, Instant};

use api_types::transaction::Transaction;
use chrono::Utc;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    client::Backend,
    config::AppConfig,
    error::Result,
    filter::{self, TypeFilter},
    form::TransactionForm,
    store::{Effect, Level, MutationKind, Store},
    sync::{self, Cause, Event, InvalidationBus, Mutations},
};

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    FormKind,
    FormAmount,
    FormDescription,
    FilterKind,
    FilterDate,
    Table,
}

impl Focus {
    const ORDER: [Focus; 6] = [
        Self::FormKind,
        Self::FormAmount,
        Self::FormDescription,
        Self::FilterKind,
        Self::FilterDate,
        Self::Table,
    ];

    fn position(self) -> usize {
        Self::ORDER
            .iter()
            .position(|focus| *focus == self)
            .unwrap_or_default()
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn is_form(self) -> bool {
        matches!(
            self,
            Self::FormKind | Self::FormAmount | Self::FormDescription
        )
    }
}

#[derive(Debug, Clone)]
pub struct ToastState {
    pub message: String,
    pub level: Level,
    shown_at: Instant,
}

#[derive(Debug)]
pub struct AppState {
    pub store: Store,
    pub form: TransactionForm,
    pub focus: Focus,
    pub selected: usize,
    pub filter_date_input: String,
    pub toast: Option<ToastState>,
    pub base_url: String,
}

impl AppState {
    pub fn selected_transaction(&self) -> Option<&Transaction> {
        self.store.displayed().get(self.selected)
    }

    /// Non-empty input that is not a `YYYY-MM-DD` date.
    pub fn filter_date_invalid(&self) -> bool {
        filter::parse_date_input(&self.filter_date_input).is_err()
    }

    fn clamp_selection(&mut self) {
        let len = self.store.displayed().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    fn notify(&mut self, level: Level, message: impl Into<String>) {
        self.toast = Some(ToastState {
            message: message.into(),
            level,
            shown_at: Instant::now(),
        });
    }
}

/// Owns the UI state and the channels feeding it.
pub struct Session<B> {
    pub state: AppState,
    bus: InvalidationBus,
    mutations: Mutations<B>,
    events: mpsc::UnboundedReceiver<Event>,
    fetchers: Vec<JoinHandle<()>>,
}

impl<B: Backend> Session<B> {
    /// Spawns the fetchers; must run inside a tokio runtime.
    pub fn start(backend: B, config: &AppConfig) -> Result<Self> {
        let (tx, events) = mpsc::unbounded_channel();
        let bus = InvalidationBus::default();
        let fetchers = sync::spawn_fetchers(&backend, &tx, &bus);
        let mutations = Mutations::new(backend, tx, config.export_dir.clone());

        let state = AppState {
            store: Store::new(config.tz()?, config.resync_on_failed_delete),
            form: TransactionForm::default(),
            focus: Focus::FormKind,
            selected: 0,
            filter_date_input: String::new(),
            toast: None,
            base_url: config.base_url.clone(),
        };

        Ok(Self {
            state,
            bus,
            mutations,
            events,
            fetchers,
        })
    }

    /// Initial load of every read view.
    pub fn mount(&mut self) {
        self.bus.publish(Cause::Mount);
    }

    pub fn refresh(&mut self) {
        self.bus.publish(Cause::Manual);
    }

    pub fn submit_form(&mut self) {
        let payload = match self.state.form.to_payload(Utc::now()) {
            Ok(payload) => payload,
            Err(err) => {
                self.state.form.error = Some(err);
                return;
            }
        };
        if self.claim(MutationKind::Add) {
            self.state.form.error = None;
            self.mutations.add(payload);
        }
    }

    pub fn delete_selected(&mut self) {
        if let Some(id) = self.state.selected_transaction().map(|tx| tx.id.clone()) {
            self.delete(id);
        }
    }

    pub fn delete(&mut self, id: String) {
        if self.claim(MutationKind::Delete) {
            self.mutations.delete(id);
        }
    }

    pub fn export(&mut self) {
        if self.claim(MutationKind::Export) {
            self.mutations.export();
        }
    }

    fn claim(&mut self, kind: MutationKind) -> bool {
        match self.state.store.begin_mutation(kind) {
            Ok(()) => true,
            Err(busy) => {
                tracing::info!(requested = ?kind, "{busy}");
                self.state.notify(Level::Info, busy.to_string());
                false
            }
        }
    }

    pub fn set_type_filter(&mut self, kind: TypeFilter) {
        self.state.store.set_type_filter(kind);
        self.state.clamp_selection();
    }

    pub fn push_filter_date(&mut self, ch: char) {
        self.state.filter_date_input.push(ch);
        self.sync_filter_date();
    }

    pub fn pop_filter_date(&mut self) {
        self.state.filter_date_input.pop();
        self.sync_filter_date();
    }

    pub fn clear_filter_date(&mut self) {
        self.state.filter_date_input.clear();
        self.sync_filter_date();
    }

    /// Incomplete input counts as no date filter.
    fn sync_filter_date(&mut self) {
        let date = filter::parse_date_input(&self.state.filter_date_input).unwrap_or(None);
        self.state.store.set_date_filter(date);
        self.state.clamp_selection();
    }

    pub fn select_next(&mut self) {
        let len = self.state.store.displayed().len();
        if len == 0 {
            return;
        }
        self.state.selected = (self.state.selected + 1).min(len - 1);
    }

    pub fn select_prev(&mut self) {
        self.state.selected = self.state.selected.saturating_sub(1);
    }

    /// Applies every event already queued; returns how many were handled.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    pub fn expire_toast(&mut self, now: Instant) {
        if self
            .state
            .toast
            .as_ref()
            .is_some_and(|toast| now.duration_since(toast.shown_at) >= TOAST_TTL)
        {
            self.state.toast = None;
        }
    }

    fn handle(&mut self, event: Event) {
        for effect in self.state.store.apply(event) {
            match effect {
                Effect::Invalidate(cause) => {
                    self.bus.publish(cause);
                }
                Effect::ResetForm => self.state.form.reset(),
                Effect::Notify { level, message } => self.state.notify(level, message),
            }
        }
        self.state.clamp_selection();
    }
}

impl<B> Drop for Session<B> {
    fn drop(&mut self) {
        for fetcher in &self.fetchers {
            fetcher.abort();
        }
    }
}
