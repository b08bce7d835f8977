// Configuration management module
// This file handles loading and parsing of configuration settings
// from defaults, an optional config file and environment variables
//
// Numan Thabit 2025 Nov

use anyhow::{ensure, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP bind address, e.g. 0.0.0.0:8080
    pub listen_addr: SocketAddr,
    /// GeoJSON road network served as /export.geojson and used for routing
    pub network_path: PathBuf,
    /// Fall back to the built-in two-node network if the file cannot be loaded
    pub sample_network_fallback: bool,
    /// Maximum snapping distance in metres (unset = unbounded)
    pub snap_tolerance_m: Option<f64>,
    /// Concurrency control
    pub max_inflight: usize,
    pub rate_per_sec: Option<u32>,
    /// Node pairs kept in the distance cache before it is reset
    pub distance_cache_capacity: usize,
    /// Interval of the statistics heartbeat log
    pub heartbeat_secs: u64,
}

impl AppConfig {
    /// Defaults, then `route-resolver.{toml,yaml,json}` if present, then `APP__*` env vars
    pub fn load() -> Result<Self> {
        let cfg = Self::defaults()?
            .add_source(config::File::with_name("route-resolver").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let parsed: Self = cfg.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder()
            .set_default("listen_addr", "0.0.0.0:8080")?
            .set_default("network_path", "export.geojson")?
            .set_default("sample_network_fallback", true)?
            .set_default("max_inflight", 64_i64)?
            .set_default("rate_per_sec", 200_i64)?
            .set_default("distance_cache_capacity", 100_000_i64)?
            .set_default("heartbeat_secs", 30_i64)?)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.max_inflight > 0, "APP__MAX_INFLIGHT must be positive");
        ensure!(self.heartbeat_secs > 0, "APP__HEARTBEAT_SECS must be positive");
        if let Some(tol) = self.snap_tolerance_m {
            ensure!(
                tol.is_finite() && tol > 0.0,
                "APP__SNAP_TOLERANCE_M must be a positive number of metres"
            );
        }
        Ok(())
    }

    pub fn snap_tolerance_km(&self) -> Option<f64> {
        self.snap_tolerance_m.map(|m| m / 1000.0)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    pub fn log(&self) {
        info!(
            listen_addr = %self.listen_addr,
            network_path = %self.network_path.display(),
            sample_network_fallback = self.sample_network_fallback,
            snap_tolerance_m = ?self.snap_tolerance_m,
            max_inflight = self.max_inflight,
            rate_per_sec = ?self.rate_per_sec,
            distance_cache_capacity = self.distance_cache_capacity,
            "configuration loaded"
        );
    }
}
