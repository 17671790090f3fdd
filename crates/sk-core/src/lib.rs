//! StyleKeeper Core Library
//!
//! This crate provides the style persistence and re-application engine for the
//! StyleKeeper page restyler. It owns the active CSS override, writes it into
//! the main document and every same-origin frame, and keeps it alive while the
//! host page rewrites its own DOM.
//!
//! # Architecture
//!
//! The engine never touches a browser API directly. The document, the
//! key-value storage and the debounce timer are reached through the traits in
//! [`dom`], [`store`] and [`reapply`]; the `sk-wasm` crate supplies the real
//! browser implementations. All operations run to completion on a single
//! thread, so the engine holds plain `&mut self` state with no locking.
//!
//! # Modules
//!
//! - `sanitize`: textual denylist applied to every CSS input
//! - `dom`: document / frame / page abstractions
//! - `inject`: the single managed style node of a document
//! - `frames`: mirroring the override into same-origin frames
//! - `store`: typed write-through persistence over a key-value backend
//! - `history`: bounded, cursor-navigable log of applied overrides
//! - `presets`: named CSS snippets with a built-in seed
//! - `sites`: per-domain override bindings
//! - `reapply`: debounced mutation-driven reconciliation loop
//! - `transfer`: export / import of the whole persisted state
//! - `controller`: the public entry points tying everything together

pub mod config;
pub mod controller;
pub mod dom;
pub mod error;
pub mod frames;
pub mod history;
pub mod host;
pub mod inject;
pub mod presets;
pub mod reapply;
pub mod sanitize;
pub mod sites;
pub mod store;
pub mod transfer;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use controller::{ActiveState, ApplyOutcome, HistoryStep, StyleController};
pub use error::{DomError, PresetError, StorageError, StyleError};
pub use frames::PropagationReport;
pub use history::{HistoryLedger, Navigation};
pub use sanitize::sanitize;
pub use store::{MemoryBackend, PersistentStore, StorageBackend};
pub use types::{HistoryEntry, MutationKinds, StyleOverride, Theme};
