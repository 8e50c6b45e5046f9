//! # Vault Backend
//!
//! Backend-facing primitives: canonical path construction, the untyped
//! key/value payload representation, and the HTTP transport used to read
//! and write engine configuration.

pub mod path;
pub mod payload;
pub mod transport;

pub use path::{build_path, cleanse_path};
pub use payload::{is_equivalent, BackendPayload, DecodeError, PayloadValue};
pub use transport::{TransportError, VaultClient, VaultTransport};
