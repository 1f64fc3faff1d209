//! Domain model for the recipe catalog.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep write-side input shapes separate from read-side projections.
//!
//! # Invariants
//! - Every persisted entity is identified by a surrogate integer id
//!   assigned by storage, never by the caller.
//! - A recipe owns its instructions and ingredient links; ingredients are
//!   shared and referenced, never owned.

pub mod recipe;
