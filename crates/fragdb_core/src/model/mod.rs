//! Fragment domain model.
//!
//! # Responsibility
//! - Define the records exchanged between repository, store and facade.
//! - Keep the two-source id scheme in one place (`id`).

pub mod fragment;
pub mod id;
