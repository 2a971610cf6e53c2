//! # League Standings Backend
//!
//! Backend for a multi-tenant sports league: teams, players, tournaments,
//! matchdays and matches stored as documents, with league tables kept in step
//! with every match write.
//!
//! ## Features
//!
//! - **Standings**: ranked tables from completed matches under a per-tournament
//!   points policy, persisted after each match write or computed up to a matchday
//! - **Denormalization**: team name and logo copies on players, matches and
//!   standings follow the team document
//! - **Counters**: derived child counts maintained in the same atomic batch as
//!   the child write
//! - **HTTP API**: RESTful endpoints under `/v1`
//!
//! ## Architecture
//!
//! - [`api`]: identifier types and stored document shapes
//! - [`db`]: document store contract, path layout, and backends
//! - [`services`]: standings, propagation, triggers, and league CRUD
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod db;
pub mod models;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
