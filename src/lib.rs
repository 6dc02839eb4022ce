//! Low-stock alerting backend.
//!
//! Combines per-warehouse stock, per-product thresholds and recent sales
//! velocity into a list of products at risk of stockout.

pub mod config;
pub mod constants;
pub mod database;
pub mod handlers;
pub mod models;
pub mod services;
