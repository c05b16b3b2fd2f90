//! HTTP handlers, grouped by route prefix.

pub mod health;
pub mod pos;
