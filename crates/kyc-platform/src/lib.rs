//! Merchant onboarding and KYC review platform.
//!
//! The library is organized around the onboarding workflow: a client-side
//! wizard state machine with per-step validation, the application lifecycle
//! it drives, and the reviewer console that closes the loop with a decision.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
