use std::collections::VecDeque;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::transport::{ApiRequest, ApiResponse, ApiTransport, TransportError};

/// Queue-backed transport for tests: responses are served in push order and
/// every request is recorded for assertions.
#[derive(Debug, Default)]
pub struct StubTransport {
    requests: Mutex<Vec<ApiRequest>>,
    responses: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
}

impl StubTransport {
    pub async fn push_response(&self, status: u16, body: Value) {
        self.push_raw_response(status, body.to_string()).await;
    }

    pub async fn push_raw_response(&self, status: u16, body: impl Into<String>) {
        self.responses.lock().await.push_back(Ok(ApiResponse {
            status,
            body: body.into(),
        }));
    }

    pub async fn push_failure(&self, message: impl Into<String>) {
        self.responses
            .lock()
            .await
            .push_back(Err(TransportError(message.into())));
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    pub async fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl ApiTransport for StubTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().await.push(request);
        let mut responses = self.responses.lock().await;
        if let Some(response) = responses.pop_front() {
            return response;
        }

        Err(TransportError(
            "stub transport has no more queued responses".to_owned(),
        ))
    }
}

pub fn user_json(id: &str, username: &str, first_name: &str, last_name: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "first_name": first_name,
        "last_name": last_name,
        "email": format!("{username}@example.com"),
    })
}

pub fn ticket_json(id: &str, title: &str, status: &str, last_updated: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "No ink",
        "status": status,
        "department": "IT",
        "created_by": user_json("u-1", "nino", "Nino", "Beridze"),
        "comments": [],
        "last_updated": last_updated,
    })
}

pub fn comment_json(id: &str, author: &str, message: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "author": author,
        "message": message,
        "created_at": created_at,
    })
}
