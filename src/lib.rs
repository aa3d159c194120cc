//! Event-sourced tic-tac-toe on an N×N board.
//!
//! - [`domain::game`] - the `Game` aggregate, its events, repository and service
//! - [`event_sourcing`] - generic aggregate/event traits and the optimistic-concurrency event stores
//! - [`config`] - environment configuration
//! - [`metrics`] - Prometheus metrics
//! - [`utils`] - caller-side retry policy

pub mod config;
pub mod domain;
pub mod event_sourcing;
pub mod metrics;
pub mod utils;
