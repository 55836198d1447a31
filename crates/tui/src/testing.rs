//! In-memory backend used by unit tests.

use std::sync::{Arc, Mutex, MutexGuard};

use api_types::{
    summary::Summary,
    transaction::{Transaction, TransactionNew},
};
use reqwest::StatusCode;

use crate::{
    client::{Backend, ClientError},
    config::AppConfig,
};

/// Default settings pinned to UTC calendar days.
pub fn utc_config() -> AppConfig {
    AppConfig {
        timezone: Some("UTC".to_string()),
        ..AppConfig::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    pub transactions: usize,
    pub balance: usize,
    pub summary: usize,
    pub creates: usize,
    pub deletes: usize,
    pub exports: usize,
}

#[derive(Debug, Default)]
struct Inner {
    transactions: Vec<Transaction>,
    balance: f64,
    summary: Summary,
    export: Vec<u8>,
    fail_reads: bool,
    fail_creates: bool,
    fail_deletes: bool,
    calls: Calls,
    created: Vec<TransactionNew>,
    deleted: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<Inner>>,
}

fn rejected() -> ClientError {
    ClientError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "rejected".to_string(),
    }
}

impl FakeBackend {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn set_transactions(&self, transactions: Vec<Transaction>) {
        self.lock().transactions = transactions;
    }

    pub fn set_aggregates(&self, balance: f64, summary: Summary) {
        let mut inner = self.lock();
        inner.balance = balance;
        inner.summary = summary;
    }

    pub fn set_export(&self, payload: Vec<u8>) {
        self.lock().export = payload;
    }

    pub fn fail_reads(&self) {
        self.lock().fail_reads = true;
    }

    pub fn fail_creates(&self) {
        self.lock().fail_creates = true;
    }

    pub fn fail_deletes(&self) {
        self.lock().fail_deletes = true;
    }

    pub fn calls(&self) -> Calls {
        self.lock().calls
    }

    pub fn created(&self) -> Vec<TransactionNew> {
        self.lock().created.clone()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }
}

impl Backend for FakeBackend {
    async fn transactions(&self) -> Result<Vec<Transaction>, ClientError> {
        let mut inner = self.lock();
        inner.calls.transactions += 1;
        if inner.fail_reads {
            return Err(rejected());
        }
        Ok(inner.transactions.clone())
    }

    async fn balance(&self) -> Result<f64, ClientError> {
        let mut inner = self.lock();
        inner.calls.balance += 1;
        if inner.fail_reads {
            return Err(rejected());
        }
        Ok(inner.balance)
    }

    async fn summary(&self) -> Result<Summary, ClientError> {
        let mut inner = self.lock();
        inner.calls.summary += 1;
        if inner.fail_reads {
            return Err(rejected());
        }
        Ok(inner.summary)
    }

    async fn create_transaction(&self, payload: TransactionNew) -> Result<(), ClientError> {
        let mut inner = self.lock();
        inner.calls.creates += 1;
        if inner.fail_creates {
            return Err(rejected());
        }
        inner.created.push(payload);
        Ok(())
    }

    async fn delete_transaction(&self, id: &str) -> Result<(), ClientError> {
        let mut inner = self.lock();
        inner.calls.deletes += 1;
        inner.deleted.push(id.to_string());
        if inner.fail_deletes {
            return Err(rejected());
        }
        inner.transactions.retain(|tx| tx.id != id);
        Ok(())
    }

    async fn export_transactions(&self) -> Result<Vec<u8>, ClientError> {
        let mut inner = self.lock();
        inner.calls.exports += 1;
        if inner.fail_reads {
            return Err(rejected());
        }
        Ok(inner.export.clone())
    }
}
