use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use helpdesk_domain::HelpdeskError;

use crate::config::HelpdeskConfig;

const USER_AGENT: &str = "helpdesk-client";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("could not reach the helpdesk service: {0}")]
pub struct TransportError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMethod {
    Get,
    Post,
    Patch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: ApiMethod,
    pub path: String,
    pub token: Option<String>,
    pub json_body: Option<Value>,
    pub form_body: Option<Vec<(String, String)>>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: ApiMethod::Get,
            path: path.into(),
            token: None,
            json_body: None,
            form_body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: ApiMethod::Post,
            path: path.into(),
            token: None,
            json_body: Some(body),
            form_body: None,
        }
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: ApiMethod::Patch,
            path: path.into(),
            token: None,
            json_body: Some(body),
            form_body: None,
        }
    }

    pub fn post_form(path: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self {
            method: ApiMethod::Post,
            path: path.into(),
            token: None,
            json_body: None,
            form_body: Some(fields),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// The service reports failures as `{"detail": "..."}`; anything else
/// collapses to a generic message carrying the HTTP status.
pub fn error_detail(response: &ApiResponse) -> String {
    serde_json::from_str::<ErrorBody>(&response.body)
        .ok()
        .and_then(|body| body.detail)
        .filter(|detail| !detail.trim().is_empty())
        .unwrap_or_else(|| format!("the helpdesk service returned HTTP {}", response.status))
}

#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestApiTransport {
    base_url: String,
    client: reqwest::Client,
}

impl ReqwestApiTransport {
    pub fn new(config: &HelpdeskConfig) -> Result<Self, HelpdeskError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| {
                HelpdeskError::ValidationFailed(format!(
                    "failed to build helpdesk HTTP client: {error}"
                ))
            })?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ApiTransport for ReqwestApiTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.endpoint(&request.path);
        let mut builder = match request.method {
            ApiMethod::Get => self.client.get(&url),
            ApiMethod::Post => self.client.post(&url),
            ApiMethod::Patch => self.client.patch(&url),
        };
        if let Some(token) = &request.token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = &request.json_body {
            builder = builder.json(body);
        }
        if let Some(fields) = &request.form_body {
            builder = builder.form(fields);
        }

        let response = builder
            .send()
            .await
            .map_err(|error| TransportError(error.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|error| TransportError(error.to_string()))?;

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{error_detail, ApiRequest, ApiResponse, ReqwestApiTransport};
    use crate::config::HelpdeskConfig;

    #[test]
    fn error_detail_surfaces_the_service_detail_field() {
        let response = ApiResponse {
            status: 422,
            body: json!({ "detail": "department is unknown" }).to_string(),
        };
        assert_eq!(error_detail(&response), "department is unknown");
    }

    #[test]
    fn error_detail_falls_back_to_a_generic_message() {
        let response = ApiResponse {
            status: 500,
            body: "<html>Internal Server Error</html>".to_owned(),
        };
        assert_eq!(
            error_detail(&response),
            "the helpdesk service returned HTTP 500"
        );

        let empty_detail = ApiResponse {
            status: 400,
            body: json!({ "detail": "  " }).to_string(),
        };
        assert_eq!(
            error_detail(&empty_detail),
            "the helpdesk service returned HTTP 400"
        );
    }

    #[test]
    fn endpoint_joins_base_url_and_path_with_a_single_slash() {
        let config = HelpdeskConfig {
            api_url: "http://localhost:8000/".to_owned(),
            ..HelpdeskConfig::default()
        };
        let transport = ReqwestApiTransport::new(&config).expect("build transport");
        assert_eq!(
            transport.endpoint("/tickets/12"),
            "http://localhost:8000/tickets/12"
        );
    }

    #[test]
    fn with_token_attaches_the_bearer_credential() {
        let request = ApiRequest::get("/tickets").with_token("secret");
        assert_eq!(request.token.as_deref(), Some("secret"));
    }
}
