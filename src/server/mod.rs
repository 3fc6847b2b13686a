// src/server/mod.rs

//! Development server and reload notifier.
//!
//! - [`events`]: the `ReloadEvent` produced by unit runs and its wire format.
//! - [`notifier`]: registry of connected clients and fan-out of events.
//! - [`http`]: axum router serving the output root, the reload client and
//!   the SSE endpoint.

pub mod events;
pub mod http;
pub mod notifier;

pub use events::{ReloadEvent, ReloadKind};
pub use http::{router, serve};
pub use notifier::{ReloadNotifier, Subscription};
