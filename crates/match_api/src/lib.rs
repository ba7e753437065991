//! MatchCast Live: HTTP surface
//!
//! JSON routes over the shared fixture cache and prediction engine. Request
//! faults come back as `{success: false, message}`; upstream fetch failures
//! never do, they only change the cache's mode and message.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
