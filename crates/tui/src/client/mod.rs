use std::{future::Future, time::Duration};

use api_types::{
    summary::{BalanceResponse, Summary},
    transaction::{Transaction, TransactionNew},
};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, de::DeserializeOwned};

use crate::error::{AppError, Result};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("server not reachable: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("{status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Remote collaborator holding transactions and the aggregates derived
/// from them.
pub trait Backend: Clone + Send + Sync + 'static {
    fn transactions(
        &self,
    ) -> impl Future<Output = std::result::Result<Vec<Transaction>, ClientError>> + Send;

    fn balance(&self) -> impl Future<Output = std::result::Result<f64, ClientError>> + Send;

    fn summary(&self) -> impl Future<Output = std::result::Result<Summary, ClientError>> + Send;

    fn create_transaction(
        &self,
        payload: TransactionNew,
    ) -> impl Future<Output = std::result::Result<(), ClientError>> + Send;

    fn delete_transaction(
        &self,
        id: &str,
    ) -> impl Future<Output = std::result::Result<(), ClientError>> + Send;

    /// Raw CSV payload of every transaction.
    fn export_transactions(
        &self,
    ) -> impl Future<Output = std::result::Result<Vec<u8>, ClientError>> + Send;
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    prefix: Vec<String>,
    http: reqwest::Client,
}

impl Client {
    pub fn new(base_url: &str, api_prefix: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| AppError::Setting(format!("invalid base_url: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Setting(format!(
                "base_url cannot carry paths: {base_url}"
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url,
            prefix: api_prefix
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
            http: builder.build()?,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> std::result::Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ClientError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty();
            path.extend(self.prefix.iter());
            path.extend(segments);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> std::result::Result<T, ClientError> {
        let bytes = self.get_bytes(segments).await?;
        serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))
    }

    async fn get_bytes(&self, segments: &[&str]) -> std::result::Result<Vec<u8>, ClientError> {
        let endpoint = self.endpoint(segments)?;
        tracing::debug!(%endpoint, "GET");
        let res = self
            .http
            .get(endpoint)
            .send()
            .await
            .map_err(ClientError::Transport)?;
        let res = ensure_success(res).await?;
        let bytes = res.bytes().await.map_err(ClientError::Transport)?;
        Ok(bytes.to_vec())
    }
}

async fn ensure_success(
    res: reqwest::Response,
) -> std::result::Result<reqwest::Response, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let text = res.text().await.unwrap_or_default();
    let body = match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(err) => err.error,
        Err(_) if text.trim().is_empty() => "unknown error".to_string(),
        Err(_) => text.trim().to_string(),
    };
    Err(ClientError::Status { status, body })
}

impl Backend for Client {
    async fn transactions(&self) -> std::result::Result<Vec<Transaction>, ClientError> {
        self.get_json(&["transactions"]).await
    }

    async fn balance(&self) -> std::result::Result<f64, ClientError> {
        self.get_json::<BalanceResponse>(&["balance"])
            .await
            .map(|res| res.balance)
    }

    async fn summary(&self) -> std::result::Result<Summary, ClientError> {
        self.get_json(&["summary"]).await
    }

    async fn create_transaction(
        &self,
        payload: TransactionNew,
    ) -> std::result::Result<(), ClientError> {
        let endpoint = self.endpoint(&["transactions"])?;
        tracing::debug!(%endpoint, "POST");
        let res = self
            .http
            .post(endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(ClientError::Transport)?;
        ensure_success(res).await.map(|_| ())
    }

    async fn delete_transaction(&self, id: &str) -> std::result::Result<(), ClientError> {
        let endpoint = self.endpoint(&["transactions", id])?;
        tracing::debug!(%endpoint, "DELETE");
        let res = self
            .http
            .delete(endpoint)
            .send()
            .await
            .map_err(ClientError::Transport)?;
        ensure_success(res).await.map(|_| ())
    }

    async fn export_transactions(&self) -> std::result::Result<Vec<u8>, ClientError> {
        self.get_bytes(&["transactions", "export"]).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use api_types::transaction::{TransactionKind, parse_timestamp};
    use axum::{
        Json, Router,
        body::Bytes,
        extract::{Path, State},
        http::StatusCode as AxumStatus,
        routing::{delete, get},
    };
    use serde_json::{Value, json};

    use super::*;
    use crate::{
        store::{OpStatus, Store},
        sync::{Event, Fetched, Resource},
    };

    type Hits = Arc<Mutex<Vec<String>>>;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn backend_router(hits: Hits) -> Router {
        Router::new()
            .route(
                "/api/transactions",
                get(|State(hits): State<Hits>| async move {
                    hits.lock().unwrap().push("GET /api/transactions".to_string());
                    Json(json!([
                        {"_id": "1", "type": "income", "amount": 100, "description": "salary", "date": "2024-01-01T09:00:00.000Z"},
                        {"_id": "2", "type": "expense", "amount": 40, "description": "food", "date": "2024-01-02T12:00:00.000Z"}
                    ]))
                })
                .post(|State(hits): State<Hits>, Json(body): Json<Value>| async move {
                    hits.lock().unwrap().push(format!("POST /api/transactions {body}"));
                    (AxumStatus::CREATED, Json(json!({"_id": "3"})))
                }),
            )
            .route(
                "/api/transactions/export",
                get(|| async { "type,amount\nincome,100\nexpense,40\n" }),
            )
            .route(
                "/api/transactions/{id}",
                delete(|State(hits): State<Hits>, Path(id): Path<String>| async move {
                    hits.lock().unwrap().push(format!("DELETE /api/transactions/{id}"));
                    if id == "missing" {
                        AxumStatus::NOT_FOUND
                    } else {
                        AxumStatus::NO_CONTENT
                    }
                }),
            )
            .route(
                "/api/balance",
                get(|| async { Json(json!({"balance": 60})) }),
            )
            .route(
                "/api/summary",
                get(|| async { Json(json!({"income": 100, "expense": 40})) }),
            )
            .with_state(hits)
    }

    async fn client_with_hits() -> (Client, Hits) {
        let hits: Hits = Arc::default();
        let base = spawn(backend_router(hits.clone())).await;
        (Client::new(&base, "api", None).unwrap(), hits)
    }

    #[tokio::test]
    async fn reads_decode_every_resource() {
        let (client, _hits) = client_with_hits().await;

        let transactions = client.transactions().await.unwrap();
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[1].kind, TransactionKind::Expense);

        assert_eq!(client.balance().await.unwrap(), 60.0);
        assert_eq!(
            client.summary().await.unwrap(),
            Summary {
                income: 100.0,
                expense: 40.0
            }
        );
    }

    #[tokio::test]
    async fn create_posts_json_body() {
        let (client, hits) = client_with_hits().await;
        let payload = TransactionNew {
            kind: TransactionKind::Expense,
            amount: 25.0,
            description: "coffee".to_string(),
            date: parse_timestamp("2024-03-01T08:00:00Z").unwrap(),
        };

        client.create_transaction(payload).await.unwrap();

        let hits = hits.lock().unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].starts_with("POST /api/transactions"));
        assert!(hits[0].contains(r#""type":"expense""#));
        assert!(hits[0].contains(r#""description":"coffee""#));
    }

    #[tokio::test]
    async fn delete_targets_identifier_path() {
        let (client, hits) = client_with_hits().await;

        client.delete_transaction("2").await.unwrap();

        assert_eq!(
            hits.lock().unwrap().as_slice(),
            ["DELETE /api/transactions/2".to_string()]
        );
    }

    #[tokio::test]
    async fn delete_failure_carries_status() {
        let (client, _hits) = client_with_hits().await;

        let err = client.delete_transaction("missing").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Status { status, .. } if status == StatusCode::NOT_FOUND
        ));
    }

    #[tokio::test]
    async fn export_returns_raw_payload() {
        let (client, _hits) = client_with_hits().await;

        let bytes = client.export_transactions().await.unwrap();
        assert_eq!(bytes, b"type,amount\nincome,100\nexpense,40\n");
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        let router = Router::new().route("/api/balance", get(|| async { Bytes::from("nope") }));
        let base = spawn(router).await;
        let client = Client::new(&base, "api", None).unwrap();

        assert!(matches!(
            client.balance().await,
            Err(ClientError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn server_error_message_is_extracted() {
        let router = Router::new().route(
            "/summary",
            get(|| async {
                (
                    AxumStatus::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "db down"})),
                )
            }),
        );
        let base = spawn(router).await;
        let client = Client::new(&base, "", None).unwrap();

        match client.summary().await {
            Err(ClientError::Status { status, body }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "db down");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_response_times_out_as_failed_fetch() {
        let router = Router::new().route(
            "/api/balance",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({"balance": 60}))
            }),
        );
        let base = spawn(router).await;
        let client = Client::new(&base, "api", Some(Duration::from_millis(100))).unwrap();

        let result = client.balance().await;
        assert!(matches!(&result, Err(ClientError::Transport(err)) if err.is_timeout()));

        let mut store = Store::new(chrono_tz::Tz::UTC, true);
        store.apply(Event::FetchStarted {
            resource: Resource::Balance,
            token: 1,
        });
        store.apply(Event::Fetched {
            token: 1,
            fetched: Fetched::Balance(result),
        });
        assert!(matches!(
            store.status(Resource::Balance),
            OpStatus::Failed(_)
        ));
        assert_eq!(store.balance.value, 0.0);
    }

    #[test]
    fn endpoint_joins_prefix_and_encodes_ids() {
        let client = Client::new("http://localhost:5000/", "/api/", None).unwrap();
        let url = client.endpoint(&["transactions", "a b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/transactions/a%20b");

        let root = Client::new("http://localhost:5000", "", None).unwrap();
        assert_eq!(
            root.endpoint(&["balance"]).unwrap().as_str(),
            "http://localhost:5000/balance"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(matches!(
            Client::new("not a url", "api", None),
            Err(AppError::Setting(_))
        ));
    }
}
