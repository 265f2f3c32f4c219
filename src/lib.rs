//! AuthGate Backend Library
//!
//! Credential-issuance and session-lifecycle gateway: signed bearer tokens,
//! single-active-session refresh rotation, revocation, rate limiting, and
//! role-hierarchy access checks.

pub mod auth;
pub mod middleware;
pub mod models;
