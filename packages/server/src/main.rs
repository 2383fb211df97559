#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone WeaRisk metrics server.
//!
//! Reads `wearisk.toml` (or `WEARISK_CONFIG`) plus `WEARISK_*` overrides
//! and serves the risk API until stopped.

use wearisk_config::AppConfig;
use wearisk_server::{ServerError, run_server};

#[actix_web::main]
async fn main() -> Result<(), ServerError> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = AppConfig::load()?;
    run_server(config).await
}
