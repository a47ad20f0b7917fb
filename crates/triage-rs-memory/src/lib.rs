//! Shared key-value memory used to hand patient state between skills.

pub mod error;
pub mod file;
pub mod keys;
pub mod store;

/// Memory error type.
pub use error::MemoryError;
/// File-backed store.
pub use file::FileMemoryStore;
/// Key helpers for patient-scoped entries.
pub use keys::{context_key, history_key};
/// Store interface, default in-process implementation and typed helpers.
pub use store::{InMemoryStore, MemoryStore, get_json, set_json};
