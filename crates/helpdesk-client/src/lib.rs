pub mod auth;
pub mod config;
pub mod repository;
pub mod session;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use auth::AuthGateway;
pub use config::HelpdeskConfig;
pub use repository::{TicketCacheSnapshot, TicketRepository};
pub use session::{FileTokenStore, MemoryTokenStore, SessionGuard, TokenStore};
pub use transport::{
    ApiMethod, ApiRequest, ApiResponse, ApiTransport, ReqwestApiTransport, TransportError,
};
