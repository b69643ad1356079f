use std::sync::Arc;

use serde::Deserialize;

use helpdesk_domain::HelpdeskError;

use crate::session::SessionGuard;
use crate::transport::{error_detail, ApiRequest, ApiTransport};

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

/// Credential exchange against the external auth service: a password grant
/// returning the bearer token the rest of the core operates with.
pub struct AuthGateway {
    transport: Arc<dyn ApiTransport>,
    guard: SessionGuard,
}

impl AuthGateway {
    pub fn new(transport: Arc<dyn ApiTransport>, guard: SessionGuard) -> Self {
        Self { transport, guard }
    }

    pub fn guard(&self) -> &SessionGuard {
        &self.guard
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(), HelpdeskError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(HelpdeskError::ValidationFailed(
                "username and password are required".to_owned(),
            ));
        }

        let request = ApiRequest::post_form(
            "/login",
            vec![
                ("username".to_owned(), username.to_owned()),
                ("password".to_owned(), password.to_owned()),
                ("grant_type".to_owned(), "password".to_owned()),
            ],
        );
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|error| HelpdeskError::LoginFailed(error.to_string()))?;

        if !response.is_success() {
            return Err(HelpdeskError::LoginFailed(error_detail(&response)));
        }

        let payload: LoginResponse = serde_json::from_str(&response.body).map_err(|_| {
            HelpdeskError::LoginFailed(
                "the sign-in response did not include an access token".to_owned(),
            )
        })?;
        self.guard.install(payload.access_token);
        Ok(())
    }

    pub fn logout(&self) {
        self.guard.sign_out();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::AuthGateway;
    use crate::session::SessionGuard;
    use crate::test_support::StubTransport;
    use crate::transport::ApiMethod;
    use helpdesk_domain::HelpdeskError;

    fn gateway(stub: &Arc<StubTransport>) -> AuthGateway {
        AuthGateway::new(stub.clone(), SessionGuard::in_memory())
    }

    #[tokio::test]
    async fn login_sends_the_password_grant_form_and_installs_the_token() {
        let stub = Arc::new(StubTransport::default());
        stub.push_response(200, json!({ "access_token": "fresh-token" }))
            .await;
        let auth = gateway(&stub);

        auth.login("nino", "s3cret").await.expect("login");
        assert_eq!(auth.guard().require_token().expect("token"), "fresh-token");

        let requests = stub.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, ApiMethod::Post);
        assert_eq!(requests[0].path, "/login");
        assert!(requests[0].token.is_none());
        let form = requests[0].form_body.as_ref().expect("form body");
        assert!(form.contains(&("grant_type".to_owned(), "password".to_owned())));
    }

    #[tokio::test]
    async fn logout_clears_the_installed_token() {
        let stub = Arc::new(StubTransport::default());
        stub.push_response(200, json!({ "access_token": "fresh-token" }))
            .await;
        let auth = gateway(&stub);

        auth.login("nino", "s3cret").await.expect("login");
        auth.logout();
        assert!(auth.guard().current_token().is_none());
    }

    #[tokio::test]
    async fn login_with_blank_credentials_fails_without_a_request() {
        let stub = Arc::new(StubTransport::default());
        let auth = gateway(&stub);

        let error = auth.login("  ", "s3cret").await.expect_err("blank username");
        assert!(matches!(error, HelpdeskError::ValidationFailed(_)));
        assert_eq!(stub.request_count().await, 0);
    }

    #[tokio::test]
    async fn login_surfaces_the_rejection_detail() {
        let stub = Arc::new(StubTransport::default());
        stub.push_response(400, json!({ "detail": "wrong password" }))
            .await;
        let auth = gateway(&stub);

        let error = auth.login("nino", "nope").await.expect_err("rejected");
        assert_eq!(error, HelpdeskError::LoginFailed("wrong password".to_owned()));
        assert!(auth.guard().current_token().is_none());
    }

    #[tokio::test]
    async fn login_without_a_token_in_the_response_fails() {
        let stub = Arc::new(StubTransport::default());
        stub.push_response(200, json!({ "token_type": "bearer" }))
            .await;
        let auth = gateway(&stub);

        let error = auth.login("nino", "s3cret").await.expect_err("no token");
        assert!(matches!(error, HelpdeskError::LoginFailed(_)));
        assert!(auth.guard().current_token().is_none());
    }
}
