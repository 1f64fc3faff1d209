//! Recipe name search entry points.
//!
//! # Responsibility
//! - Build safe SQL LIKE patterns for substring search on recipe names.
//! - Keep search result shaping inside core.

pub mod name_query;
