//! Domain models for Threadline.
//!
//! These are the core types shared across all crates.

pub mod feed;
pub mod membership;
pub mod organization;
pub mod user;
