use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::warn;

use helpdesk_domain::{HelpdeskError, User};

use crate::config::HelpdeskConfig;

/// Persistence seam for the bearer token so a session survives process
/// restarts. Store IO is best-effort: failures are logged, never fatal.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.read().expect("memory token store lock").clone()
    }

    fn save(&self, token: &str) {
        *self.token.write().expect("memory token store lock") = Some(token.to_owned());
    }

    fn clear(&self) {
        *self.token.write().expect("memory token store lock") = None;
    }
}

#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let token = raw.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_owned())
        }
    }

    fn save(&self, token: &str) {
        if let Some(parent) = self.path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                warn!(error = %error, path = %self.path.display(), "could not create token directory");
                return;
            }
        }
        if let Err(error) = fs::write(&self.path, token) {
            warn!(error = %error, path = %self.path.display(), "could not persist session token");
        }
    }

    fn clear(&self) {
        if let Err(error) = fs::remove_file(&self.path) {
            if error.kind() != io::ErrorKind::NotFound {
                warn!(error = %error, path = %self.path.display(), "could not remove persisted session token");
            }
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<User>,
}

/// Process-wide session state: one bearer token, one cached current user.
/// Every core operation asks the guard for the token before touching the
/// network, and routes 401 responses back through `on_unauthorized`.
#[derive(Clone)]
pub struct SessionGuard {
    state: Arc<RwLock<SessionState>>,
    store: Arc<dyn TokenStore>,
}

impl fmt::Debug for SessionGuard {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionGuard")
            .field("token", &self.current_token().map(|_| "<redacted>"))
            .finish()
    }
}

impl SessionGuard {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let token = store.load();
        Self {
            state: Arc::new(RwLock::new(SessionState { token, user: None })),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::default()))
    }

    pub fn for_config(config: &HelpdeskConfig) -> Self {
        match &config.token_file {
            Some(path) => Self::new(Arc::new(FileTokenStore::new(path.clone()))),
            None => Self::in_memory(),
        }
    }

    pub fn current_token(&self) -> Option<String> {
        self.state.read().expect("session state lock").token.clone()
    }

    pub fn require_token(&self) -> Result<String, HelpdeskError> {
        self.current_token().ok_or(HelpdeskError::Unauthenticated)
    }

    pub fn install(&self, token: impl Into<String>) {
        let token = token.into();
        self.store.save(&token);
        let mut state = self.state.write().expect("session state lock");
        state.token = Some(token);
        state.user = None;
    }

    /// Reaction to an authorization rejection from any operation. Idempotent:
    /// concurrent 401s tear the session down once and log once.
    pub fn on_unauthorized(&self) {
        if self.teardown() {
            warn!("helpdesk session rejected by the service; sign in again");
        }
    }

    pub fn sign_out(&self) {
        self.teardown();
    }

    fn teardown(&self) -> bool {
        let had_session = {
            let mut state = self.state.write().expect("session state lock");
            state.user = None;
            state.token.take().is_some()
        };
        if had_session {
            self.store.clear();
        }
        had_session
    }

    pub fn cached_user(&self) -> Option<User> {
        self.state.read().expect("session state lock").user.clone()
    }

    pub fn cache_user(&self, user: User) {
        self.state.write().expect("session state lock").user = Some(user);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{FileTokenStore, SessionGuard, TokenStore};
    use crate::config::HelpdeskConfig;
    use helpdesk_domain::HelpdeskError;

    #[test]
    fn require_token_fails_until_a_token_is_installed() {
        let guard = SessionGuard::in_memory();
        assert_eq!(
            guard.require_token().expect_err("no session yet"),
            HelpdeskError::Unauthenticated
        );

        guard.install("token-1");
        assert_eq!(guard.require_token().expect("token"), "token-1");
    }

    #[test]
    fn on_unauthorized_destroys_the_session_and_is_idempotent() {
        let guard = SessionGuard::in_memory();
        guard.install("token-1");

        guard.on_unauthorized();
        assert!(guard.current_token().is_none());
        assert!(guard.cached_user().is_none());

        // a second concurrent discovery of the rejection must not fault
        guard.on_unauthorized();
        assert!(guard.current_token().is_none());
    }

    #[test]
    fn install_resets_the_cached_user_from_the_previous_session() {
        let guard = SessionGuard::in_memory();
        guard.install("token-1");
        guard.cache_user(helpdesk_domain::User {
            id: helpdesk_domain::UserId::from("u-1"),
            username: "nino".to_owned(),
            first_name: "Nino".to_owned(),
            last_name: "Beridze".to_owned(),
            email: "nino@example.com".to_owned(),
        });

        guard.install("token-2");
        assert!(guard.cached_user().is_none());
    }

    #[test]
    fn file_store_round_trips_the_token_across_guards() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("session").join("token");

        let store = Arc::new(FileTokenStore::new(path.clone()));
        let guard = SessionGuard::new(store);
        guard.install("persisted-token");

        // a fresh guard over the same path sees the persisted session
        let reloaded = SessionGuard::new(Arc::new(FileTokenStore::new(path.clone())));
        assert_eq!(reloaded.require_token().expect("token"), "persisted-token");

        reloaded.on_unauthorized();
        let after_expiry = SessionGuard::new(Arc::new(FileTokenStore::new(path)));
        assert!(after_expiry.current_token().is_none());
    }

    #[test]
    fn for_config_picks_the_file_store_when_a_token_file_is_set() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("token");
        std::fs::write(&path, "cfg-token\n").expect("seed token file");

        let config = HelpdeskConfig {
            token_file: Some(path),
            ..HelpdeskConfig::default()
        };
        let guard = SessionGuard::for_config(&config);
        assert_eq!(guard.require_token().expect("token"), "cfg-token");
    }

    #[test]
    fn file_store_ignores_blank_token_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("token");
        std::fs::write(&path, "  \n").expect("write blank file");
        assert!(FileTokenStore::new(path).load().is_none());
    }
}
