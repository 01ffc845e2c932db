//! PawForge Gateway Library
//!
//! Server side of the pet photo stylization service: the admission gate that
//! rate limits generation requests, the HTTP endpoints in front of it, and
//! the client for the remote image model.

pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod metrics;
pub mod prompts;
pub mod rate_limit;
pub mod server;
