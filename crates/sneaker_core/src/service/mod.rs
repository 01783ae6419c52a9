//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep host/UI layers decoupled from key layout and storage details.

pub mod sneaker_service;
