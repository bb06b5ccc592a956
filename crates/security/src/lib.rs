//! Security policies for FemtoClaw.
//!
//! Provides:
//! - **Allowlists**: sender validation per channel

pub mod allowlist;

pub use allowlist::{AllowlistPolicy, DenyReason, SenderCheckResult};
