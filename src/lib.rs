// Library interface for vndb_proxy
// The binary and the integration tests both build on these modules

pub mod app_state;
pub mod config;
pub mod error;
pub mod http_client;
pub mod legacy;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod query;
pub mod random;
pub mod routes;
pub mod tags;
