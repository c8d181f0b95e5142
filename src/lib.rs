//! # Hospital Resource Forecasting Backend
//!
//! High-performance hospital resource demand forecasting and staff
//! allocation engine.
//!
//! This crate forecasts short-horizon hospital resource demand (admissions,
//! bed occupancy, oxygen level) with one regression model per (target,
//! horizon) pair, and derives cost-minimizing staff allocations from those
//! forecasts with an integer linear program. The backend exposes a REST API
//! via Axum for dashboard frontends.
//!
//! ## Features
//!
//! - **Feature Building**: calendar, lag, rolling, and interaction features
//!   over the historical series
//! - **Forecasting**: independently trained models for 3 targets × 3
//!   horizons with held-out MAE/MSE reporting
//! - **Staff Optimization**: LP-based allocation under coverage, budget,
//!   and staffing constraints
//! - **Synthetic Data**: seeded generation of realistic hospital series
//! - **HTTP API**: RESTful endpoints for frontend integration
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: serializable types exchanged with callers
//! - [`models`]: core domain data model
//! - [`algorithms`]: numeric kernels (ridge regression)
//! - [`db`]: repository pattern for history and model persistence
//! - [`services`]: feature building, training, forecasting, optimization
//! - [`http`]: Axum-based HTTP server and request handlers
//! - [`config`]: versioned staffing rules and forecast settings

pub mod api;

pub mod algorithms;

pub mod config;

pub mod db;
pub mod models;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
