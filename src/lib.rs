//! # session-gate
//!
//! Client-side session gating for a server-rendered web application.
//!
//! The gate reads a cached session (bearer credential, display name, subject
//! id, roles) from an injected key-value store. It decides page-level access,
//! renders the user's identity, hides mutating controls on view-only listing
//! pages, and wraps outgoing requests with the bearer header plus 401/403
//! handling.
//!
//! Browser integration (localStorage, `window.location`, `fetch`) lives
//! behind the `hydrate` feature; the default `native` feature provides a
//! `reqwest` transport and the `session-gate` CLI.

pub mod config;
pub mod error;
pub mod gate;
pub mod navigator;
pub mod page;
pub mod session;
pub mod store;
pub mod surface;
pub mod transport;
pub mod view;

pub use config::GateConfig;
pub use error::GateError;
pub use gate::{PageOutcome, RequestOutcome, SessionGate};
pub use page::PageKind;
pub use session::SessionRecord;
pub use store::{MemoryStore, SessionStore};
