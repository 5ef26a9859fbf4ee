//! monigate gateway library entry.
//!
//! This crate wires the credential store, rate limiter, metrics, audit trail,
//! and artifact reader into a middleware pipeline in front of a read-only
//! monitoring API. It is consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod artifacts;
pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod obs;
pub mod pipeline;
pub mod policy;
pub mod router;
