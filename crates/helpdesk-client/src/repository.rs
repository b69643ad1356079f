use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use serde_json::json;
use tracing::debug;

use helpdesk_domain::{
    apply_comment, apply_created, apply_status_patch, trimmed_comment_message,
    validate_new_ticket, Comment, HelpdeskError, NewTicket, Ticket, TicketId, TicketStatus,
    TransitionPolicy, User,
};

use crate::session::SessionGuard;
use crate::transport::{error_detail, ApiRequest, ApiResponse, ApiTransport};

#[derive(Debug, Default)]
struct TicketCache {
    tickets: Vec<Ticket>,
    last_synced_at: Option<SystemTime>,
    last_sync_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TicketCacheSnapshot {
    pub tickets: Vec<Ticket>,
    pub last_synced_at: Option<SystemTime>,
    pub last_sync_error: Option<String>,
}

/// Client-side synchronized view of the ticket collection. The cache holds
/// tickets in insertion order and is only ever replaced wholesale by a full
/// refresh or patched through the pure apply functions; the server stays the
/// source of truth. No operation retries on its own.
pub struct TicketRepository {
    transport: Arc<dyn ApiTransport>,
    guard: SessionGuard,
    policy: TransitionPolicy,
    cache: Arc<RwLock<TicketCache>>,
}

impl TicketRepository {
    pub fn new(transport: Arc<dyn ApiTransport>, guard: SessionGuard) -> Self {
        Self::with_policy(transport, guard, TransitionPolicy::default())
    }

    pub fn with_policy(
        transport: Arc<dyn ApiTransport>,
        guard: SessionGuard,
        policy: TransitionPolicy,
    ) -> Self {
        Self {
            transport,
            guard,
            policy,
            cache: Arc::new(RwLock::new(TicketCache::default())),
        }
    }

    pub fn guard(&self) -> &SessionGuard {
        &self.guard
    }

    pub fn cache_snapshot(&self) -> TicketCacheSnapshot {
        let cache = self.cache.read().expect("ticket cache lock");
        TicketCacheSnapshot {
            tickets: cache.tickets.clone(),
            last_synced_at: cache.last_synced_at,
            last_sync_error: cache.last_sync_error.clone(),
        }
    }

    pub fn cached_ticket(&self, id: &TicketId) -> Option<Ticket> {
        self.cache
            .read()
            .expect("ticket cache lock")
            .tickets
            .iter()
            .find(|ticket| &ticket.id == id)
            .cloned()
    }

    pub async fn list_tickets(&self) -> Result<Vec<Ticket>, HelpdeskError> {
        let result = self.fetch_all().await;
        if let Err(error) = &result {
            let mut cache = self.cache.write().expect("ticket cache lock");
            cache.last_sync_error = Some(error.to_string());
        }
        result
    }

    async fn fetch_all(&self) -> Result<Vec<Ticket>, HelpdeskError> {
        let response = self
            .execute_authorized(
                |token| ApiRequest::get("/tickets").with_token(token),
                HelpdeskError::FetchFailed,
            )
            .await?;
        if !response.is_success() {
            return Err(HelpdeskError::FetchFailed(error_detail(&response)));
        }
        let fetched: Vec<Ticket> = serde_json::from_str(&response.body).map_err(|error| {
            HelpdeskError::FetchFailed(format!("malformed ticket list payload: {error}"))
        })?;

        // Full refresh replaces the collection wholesale; the last refresh
        // wins over any optimistic update still in flight.
        let mut cache = self.cache.write().expect("ticket cache lock");
        cache.tickets = fetched.clone();
        cache.last_synced_at = Some(SystemTime::now());
        cache.last_sync_error = None;
        Ok(fetched)
    }

    pub async fn get_ticket(&self, id: &TicketId) -> Result<Ticket, HelpdeskError> {
        let path = format!("/tickets/{id}");
        let response = self
            .execute_authorized(
                move |token| ApiRequest::get(path).with_token(token),
                HelpdeskError::FetchFailed,
            )
            .await?;
        if response.is_not_found() {
            return Err(HelpdeskError::NotFound(id.as_str().to_owned()));
        }
        if !response.is_success() {
            return Err(HelpdeskError::FetchFailed(error_detail(&response)));
        }
        serde_json::from_str(&response.body).map_err(|error| {
            HelpdeskError::FetchFailed(format!("malformed ticket payload: {error}"))
        })
    }

    pub async fn current_user(&self) -> Result<User, HelpdeskError> {
        if let Some(user) = self.guard.cached_user() {
            return Ok(user);
        }
        let response = self
            .execute_authorized(
                |token| ApiRequest::get("/me").with_token(token),
                HelpdeskError::FetchFailed,
            )
            .await?;
        if !response.is_success() {
            return Err(HelpdeskError::FetchFailed(error_detail(&response)));
        }
        let user: User = serde_json::from_str(&response.body).map_err(|error| {
            HelpdeskError::FetchFailed(format!("malformed user payload: {error}"))
        })?;
        self.guard.cache_user(user.clone());
        Ok(user)
    }

    pub async fn create_ticket(&self, draft: NewTicket) -> Result<Ticket, HelpdeskError> {
        validate_new_ticket(&draft)?;

        let reporter = self.current_user().await.map_err(|error| match error {
            HelpdeskError::Unauthenticated => HelpdeskError::Unauthenticated,
            other => {
                HelpdeskError::CreateFailed(format!("could not resolve the reporting user: {other}"))
            }
        })?;

        let mut body = json!({
            "title": draft.title,
            "description": draft.description,
            "department": draft.department,
            "created_by": reporter.id,
        });
        if let Some(assigned_to) = &draft.assigned_to {
            body["assigned_to"] = json!(assigned_to);
        }

        let response = self
            .execute_authorized(
                move |token| ApiRequest::post("/tickets", body).with_token(token),
                HelpdeskError::CreateFailed,
            )
            .await?;
        if !response.is_success() {
            return Err(HelpdeskError::CreateFailed(error_detail(&response)));
        }
        let created: Ticket = serde_json::from_str(&response.body).map_err(|error| {
            HelpdeskError::CreateFailed(format!("malformed created-ticket payload: {error}"))
        })?;

        let mut cache = self.cache.write().expect("ticket cache lock");
        cache.tickets = apply_created(std::mem::take(&mut cache.tickets), created.clone());
        debug!(ticket_id = %created.id, "created ticket cached");
        Ok(created)
    }

    pub async fn patch_status(
        &self,
        id: &TicketId,
        status: TicketStatus,
    ) -> Result<Ticket, HelpdeskError> {
        if let Some(cached) = self.cached_ticket(id) {
            self.policy.check(cached.status, status)?;
        }

        let path = format!("/tickets/{id}");
        let body = json!({ "status": status });
        let response = self
            .execute_authorized(
                move |token| ApiRequest::patch(path, body).with_token(token),
                HelpdeskError::UpdateFailed,
            )
            .await?;
        if !response.is_success() {
            return Err(HelpdeskError::UpdateFailed(error_detail(&response)));
        }
        let confirmed: Ticket = serde_json::from_str(&response.body).map_err(|error| {
            HelpdeskError::UpdateFailed(format!("malformed updated-ticket payload: {error}"))
        })?;

        let mut cache = self.cache.write().expect("ticket cache lock");
        let merged = match cache.tickets.iter().position(|ticket| &ticket.id == id) {
            Some(index) => {
                let merged = apply_status_patch(cache.tickets[index].clone(), &confirmed);
                cache.tickets[index] = merged.clone();
                merged
            }
            None => {
                cache.tickets.push(confirmed.clone());
                confirmed
            }
        };
        debug!(ticket_id = %merged.id, status = merged.status.as_str(), "ticket status cached");
        Ok(merged)
    }

    /// String-input variant of `patch_status` for callers holding raw form
    /// values; anything outside the closed status set fails locally.
    pub async fn patch_status_value(
        &self,
        id: &TicketId,
        raw_status: &str,
    ) -> Result<Ticket, HelpdeskError> {
        let status = TicketStatus::parse(raw_status)?;
        self.patch_status(id, status).await
    }

    /// Returns `Ok(None)` for whitespace-only messages: the submission is
    /// dropped without a request or an error, per the dashboard's behavior.
    pub async fn add_comment(
        &self,
        id: &TicketId,
        message: &str,
    ) -> Result<Option<Comment>, HelpdeskError> {
        let Some(message) = trimmed_comment_message(message) else {
            return Ok(None);
        };

        let author = self.current_user().await.map_err(|error| match error {
            HelpdeskError::Unauthenticated => HelpdeskError::Unauthenticated,
            other => {
                HelpdeskError::CommentFailed(format!("could not resolve the comment author: {other}"))
            }
        })?;

        let path = format!("/tickets/{id}/comments");
        let body = json!({ "message": message, "author": author.display_name() });
        let response = self
            .execute_authorized(
                move |token| ApiRequest::post(path, body).with_token(token),
                HelpdeskError::CommentFailed,
            )
            .await?;
        if !response.is_success() {
            return Err(HelpdeskError::CommentFailed(error_detail(&response)));
        }
        let comment: Comment = serde_json::from_str(&response.body).map_err(|error| {
            HelpdeskError::CommentFailed(format!("malformed comment payload: {error}"))
        })?;

        let mut cache = self.cache.write().expect("ticket cache lock");
        if let Some(index) = cache.tickets.iter().position(|ticket| &ticket.id == id) {
            cache.tickets[index] = apply_comment(cache.tickets[index].clone(), comment.clone());
        }
        Ok(Some(comment))
    }

    // Shared preamble of every operation: the session gate, the request, and
    // the uniform authorization-rejection route. Transport failures map to
    // the operation's own error kind via `failure`.
    async fn execute_authorized(
        &self,
        request_for: impl FnOnce(String) -> ApiRequest,
        failure: fn(String) -> HelpdeskError,
    ) -> Result<ApiResponse, HelpdeskError> {
        let token = self.guard.require_token()?;
        let response = self
            .transport
            .execute(request_for(token))
            .await
            .map_err(|error| failure(error.to_string()))?;
        if response.is_unauthorized() {
            self.guard.on_unauthorized();
            return Err(HelpdeskError::Unauthenticated);
        }
        Ok(response)
    }
}
