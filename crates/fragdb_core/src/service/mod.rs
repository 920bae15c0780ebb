//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, geometry conversion and store calls into the
//!   operations callers perform.
//! - Keep callers decoupled from storage details.

pub mod fragment_service;
