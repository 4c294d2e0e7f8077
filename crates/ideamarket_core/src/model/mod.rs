//! Idea and task records owned by the idea store.
//!
//! # Responsibility
//! - Define stored record shapes and their creation/patch inputs.
//! - Fix the JSON shape written to the durable key-value store.
//!
//! # Invariants
//! - `id` and `created_at` are assigned by the store, never by callers.
//! - Patches carry field presence explicitly; `None` keeps the stored value.

pub mod idea;
pub mod task;

/// Opaque record identifier, unique within its collection.
pub type RecordId = String;
