pub mod auth;
pub mod backend_client;

pub use auth::AuthSession;
pub use backend_client::{eq_filter, extract_error_message, BackendClient};
