//! NASA open-API gateway and the view-model layer that consumes it.

pub mod aggregator;
pub mod clients;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod upstream;
pub mod utils;
