//! Common library for the HRMS punch client
//!
//! This crate provides the device-local persistence shared by the HTTP
//! client and the punch orchestrator: a small key-value store, the session
//! context holding the token pair, and the remaining per-device flags.

pub mod error;
pub mod session;
pub mod state;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use session::{Session, SessionStore};
pub use state::LocalState;
pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Example usage of the session store
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use common::{FileStore, Session, SessionStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStore::open("hrms-state.json").await?;
///     let sessions = SessionStore::new(Arc::new(store));
///     sessions
///         .save(&Session::new("access", "refresh", "jane@example.com"))
///         .await?;
///     println!("Signed in: {}", sessions.access_token().await?.is_some());
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
