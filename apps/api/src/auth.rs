mod bootstrap;
mod session;

pub use bootstrap::bootstrap_handler;
pub use session::logout_handler;

pub const SESSION_USER_KEY: &str = "user_identity";
/// Absolute session creation timestamp, checked by `require_auth`.
pub const SESSION_CREATED_AT_KEY: &str = "session_created_at";
/// Anti-forgery token issued with the table listing.
pub const SESSION_FORM_TOKEN_KEY: &str = "table_action_token";
pub const SESSION_ABSOLUTE_TIMEOUT_SECONDS: i64 = 8 * 60 * 60;
