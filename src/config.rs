use serde_derive::Deserialize;

use crate::error::Result;

/// Tunable timing knobs for a [`crate::raft::Node`].
///
/// Defaults match spec-prescribed values: a heartbeat strictly less than
/// half the minimum election timeout, so a live leader always reaches
/// every follower before any follower's timer can fire.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RaftConfig {
    /// Minimum election timeout, in milliseconds.
    pub min_election_timeout_ms: u64,
    /// Width of the randomized range added on top of the minimum, in
    /// milliseconds.
    pub election_timeout_range_ms: u64,
    /// Interval between leader heartbeats, in milliseconds.
    pub heartbeat_interval_ms: u64,
}

impl Default for RaftConfig {
    fn default() -> Self {
        RaftConfig {
            min_election_timeout_ms: 250,
            election_timeout_range_ms: 200,
            heartbeat_interval_ms: 100,
        }
    }
}

impl RaftConfig {
    /// Loads configuration from an optional file, overridden by
    /// `DISTCORE_*` environment variables, falling back to defaults
    /// for anything unset.
    pub fn load(file: Option<&str>) -> Result<Self> {
        let defaults = RaftConfig::default();
        let mut builder = config::Config::builder()
            .set_default("min_election_timeout_ms", defaults.min_election_timeout_ms)?
            .set_default(
                "election_timeout_range_ms",
                defaults.election_timeout_range_ms,
            )?
            .set_default("heartbeat_interval_ms", defaults.heartbeat_interval_ms)?;

        if let Some(file) = file {
            builder = builder.add_source(config::File::with_name(file).required(false));
        }
        builder = builder.add_source(config::Environment::with_prefix("DISTCORE"));

        Ok(builder.build()?.try_deserialize()?)
    }
}
