//! Obliq HTTP server
//!
//! The thin outer shell: environment configuration, a two-route axum
//! surface (`/healthz`, `POST /v1/escalations/sweep`) and an optional
//! in-process ticker. All escalation semantics live in
//! [`obliq_escalation`]; this crate only authenticates, invokes and
//! serializes.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod http;
pub mod sender;

pub use config::ServerConfig;
pub use http::{router, spawn_ticker, AppState, SweepBody};
pub use sender::LogSender;
