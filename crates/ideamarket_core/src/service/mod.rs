//! Idea/task store and the read views built on it.
//!
//! # Responsibility
//! - Own the idea and task collections for one session.
//! - Keep memory and the durable key-value store in step on every mutation.
//! - Derive progress, dashboard and board projections on demand.

pub mod idea_store;
pub mod views;
