//! # API Shared
//!
//! Shared utilities and definitions for Lawmark APIs.
//!
//! Contains:
//! - Wire types with OpenAPI schemas (`wire` module) and their conversions to and from core types
//! - Shared services like `HealthService`
//! - Caller identification and API key checks
//!
//! Used by `api-rest` and the `lawmark` CLI.

pub mod auth;
pub mod health;
pub mod wire;

pub use auth::{AuthError, Caller};
pub use health::{HealthRes, HealthService};
