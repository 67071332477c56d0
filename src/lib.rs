//! TSI Chart - time-series chart service for facility sensors
//!
//! This library exposes the core modules for testing and reuse.

pub mod auth;
pub mod chart;
pub mod common;
pub mod config;
pub mod error;
pub mod routes;
pub mod tsi;
