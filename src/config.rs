//! The configuration surface: a recognized-options mapping, not a
//! file format. `Config` is constructed programmatically — by `main.rs` or by
//! a caller embedding this crate — and validated once before a run starts.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::time::{Date, Duration};

/// Which router policy a node runs. See `crate::routing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouterKind {
    Epidemic,
    SprayAndWait,
    Predictive,
}

/// The full set of recognized simulation options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub num_nodes: u32,
    pub simulation_time: Duration,
    pub max_buffer_size: usize,
    pub ltp_segment_size: u64,
    pub qos_priority_levels: u8,
    pub bundle_generation_rate: f64,
    pub bundle_size_range: (u64, u64),
    pub bundle_ttl: Duration,
    pub contact_probability: f64,
    pub min_contact_duration: Duration,
    pub max_contact_duration: Duration,
    pub base_error_rate: f64,
    pub bandwidth_range: (f64, f64),
    pub router_kind: RouterKind,
    pub spray_token_budget: u32,
    pub max_ltp_retries: u32,
    pub metrics_snapshot_interval: Duration,
    pub random_seed: u64,

    /// RTO slack added on top of `2 * propagation_delay` when a sender
    /// schedules a `CheckpointTimeout`. See DESIGN.md for this implementer
    /// decision.
    pub checkpoint_slack: Duration,

    /// Per-pair link distance used to derive propagation delay
    /// (`distance / propagation_speed`). Zero means an instantaneous link,
    /// which is also a valid model.
    pub link_distance: f64,
    pub propagation_speed: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_nodes: 10,
            simulation_time: 3_600.0,
            max_buffer_size: 50,
            ltp_segment_size: 1_024,
            qos_priority_levels: 4,
            bundle_generation_rate: 0.05,
            bundle_size_range: (512, 8_192),
            bundle_ttl: 600.0,
            contact_probability: 0.3,
            min_contact_duration: 30.0,
            max_contact_duration: 300.0,
            base_error_rate: 0.0,
            bandwidth_range: (2_048.0, 65_536.0),
            router_kind: RouterKind::Epidemic,
            spray_token_budget: 8,
            max_ltp_retries: 5,
            metrics_snapshot_interval: 100.0,
            random_seed: 0,
            checkpoint_slack: 1.0,
            link_distance: 0.0,
            propagation_speed: 299_792_458.0,
        }
    }
}

impl Config {
    /// Validates every field against its documented domain. Returns the
    /// first violation found; this is the only fatal error path in the core
    ///.
    pub fn validate(&self) -> SimResult<()> {
        if self.num_nodes < 2 {
            return Err(SimError::Config("num_nodes must be >= 2".into()));
        }
        if !(self.simulation_time > 0.0) {
            return Err(SimError::Config("simulation_time must be > 0".into()));
        }
        if self.max_buffer_size == 0 {
            return Err(SimError::Config("max_buffer_size must be > 0".into()));
        }
        if self.ltp_segment_size == 0 {
            return Err(SimError::Config("ltp_segment_size must be > 0".into()));
        }
        if self.qos_priority_levels != 4 {
            return Err(SimError::Config(
                "qos_priority_levels is fixed at 4 (CRITICAL/HIGH/NORMAL/LOW)".into(),
            ));
        }
        if self.bundle_generation_rate < 0.0 {
            return Err(SimError::Config("bundle_generation_rate must be >= 0".into()));
        }
        let (min_size, max_size) = self.bundle_size_range;
        if min_size == 0 || min_size > max_size {
            return Err(SimError::Config("bundle_size_range is empty or invalid".into()));
        }
        if !(self.bundle_ttl > 0.0) {
            return Err(SimError::Config("bundle_ttl must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.contact_probability) {
            return Err(SimError::Config("contact_probability must be in [0, 1]".into()));
        }
        if self.min_contact_duration <= 0.0 || self.min_contact_duration > self.max_contact_duration
        {
            return Err(SimError::Config(
                "min_contact_duration must be > 0 and <= max_contact_duration".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.base_error_rate) {
            return Err(SimError::Config("base_error_rate must be in [0, 1]".into()));
        }
        let (min_bw, max_bw) = self.bandwidth_range;
        if min_bw <= 0.0 || min_bw > max_bw {
            return Err(SimError::Config("bandwidth_range is empty or invalid".into()));
        }
        if self.router_kind == RouterKind::SprayAndWait && self.spray_token_budget < 1 {
            return Err(SimError::Config(
                "spray_token_budget must be >= 1 for spray_and_wait".into(),
            ));
        }
        if self.max_ltp_retries == 0 {
            return Err(SimError::Config("max_ltp_retries must be > 0".into()));
        }
        if !(self.metrics_snapshot_interval > 0.0) {
            return Err(SimError::Config("metrics_snapshot_interval must be > 0".into()));
        }
        if self.checkpoint_slack < 0.0 {
            return Err(SimError::Config("checkpoint_slack must be >= 0".into()));
        }
        if self.propagation_speed <= 0.0 {
            return Err(SimError::Config("propagation_speed must be > 0".into()));
        }
        Ok(())
    }

    /// Propagation delay derived from `link_distance / propagation_speed`
    ///, shared by every contact regardless of which pair it
    /// connects — the per-pair distance model a full implementation would
    /// use is out of this core's scope.
    pub fn propagation_delay(&self) -> Duration {
        self.link_distance / self.propagation_speed
    }

    /// `RTO = 2 * propagation_delay + slack`.
    pub fn retransmission_timeout(&self) -> Duration {
        2.0 * self.propagation_delay() + self.checkpoint_slack
    }

    /// A timestamp past the simulation horizon; events scheduled for or
    /// after it are discarded.
    pub fn horizon(&self) -> Date {
        self.simulation_time
    }
}
