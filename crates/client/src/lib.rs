//! Client side of the shared task board: a typed API wrapper, the local board
//! cache and a background poller keeping it fresh.

pub mod api;
pub mod cache;
pub mod poller;
pub mod session;

pub use api::{BoardClient, ClientError};
pub use cache::BoardCache;
pub use poller::{DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL, spawn_poller};
pub use session::BoardSession;
