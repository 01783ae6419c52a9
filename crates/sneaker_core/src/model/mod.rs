//! Domain model for catalog items, collection entries and sessions.
//!
//! # Responsibility
//! - Define the serialized shapes stored under `catalog:*` and
//!   `collection:*` keys.
//! - Validate untrusted input (scan payloads, legacy records) before it can
//!   reach a repository write.
//!
//! # Invariants
//! - Every persisted record carries a non-blank `id`.
//! - Field names serialize in camelCase (`imageUrl`, `addedAt`, ...).

pub mod collection;
pub mod item;
pub mod session;
