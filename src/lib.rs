//! serve-loadgen - Synthetic persona traffic generator
//!
//! Drives weighted persona sessions (visitors, power users, app viewers,
//! API clients) against a Serve platform deployment. Each virtual user is a
//! small state machine that acquires anti-forgery tokens, authenticates,
//! creates and tears down resources, and classifies every response against
//! a declarative success expectation; failures are recorded, never fatal to
//! the run.

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod html;
pub mod http;
pub mod identity;
pub mod logging;
pub mod persona;
pub mod plan;
pub mod report;
pub mod runner;
pub mod session;
pub mod token;
pub mod version;
