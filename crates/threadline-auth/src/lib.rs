//! Threadline Auth: feed permission decisions, authorization contexts,
//! identity tokens and the membership service that enforces them.
//!
//! Decisions are plain data ([`PermissionResult`]). Only
//! [`PermissionResult::ensure_permitted`] turns a denial into an error, so
//! read paths can branch on a decision while write paths abort on it.

pub mod config;
pub mod context;
pub mod decision;
pub mod error;
pub mod identity;
pub mod ownership;
pub mod permission;
pub mod service;

pub use config::AuthConfig;
pub use context::{AuthContext, FeedAuth, RequestAuthContext, SnapshotAuthContext};
pub use decision::Principal;
pub use error::AuthError;
pub use identity::{Identity, IdentityClaims};
pub use permission::{DenialReason, PermissionResult};
pub use service::FeedService;
