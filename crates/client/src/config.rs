#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub target_fps: u32,
    /// Tick length contract shared with the server; both sides must agree.
    pub tick_rate: u32,
    pub connect_timeout_secs: f64,
    pub connect_retry_secs: f64,
    pub server_timeout_secs: f64,
    pub ping_interval_secs: f64,
    pub run_seconds: Option<f64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            tick_rate: cadence::DEFAULT_TICK_RATE,
            connect_timeout_secs: 5.0,
            connect_retry_secs: 0.5,
            server_timeout_secs: 10.0,
            ping_interval_secs: 1.0,
            run_seconds: None,
        }
    }
}
