const SWEEP_INTERVAL: &str = "COMMENT_SWEEP_INTERVAL";

const DEFAULT_SWEEP_INTERVAL: u64 = 60;

/// Default expiry sweep interval in seconds, overridable via environment
pub fn get_default_sweep_interval() -> u64 {
    let interval_from_env = std::env::var(SWEEP_INTERVAL);
    interval_from_env.map_or(DEFAULT_SWEEP_INTERVAL, |res| {
        res.parse().unwrap_or(DEFAULT_SWEEP_INTERVAL)
    })
}
