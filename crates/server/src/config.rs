#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub tick_rate: u32,
    pub state_send_rate: u32,
    pub max_clients: usize,
    pub client_timeout_secs: f64,
    pub sample_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            state_send_rate: 2,
            max_clients: 32,
            client_timeout_secs: 10.0,
            sample_capacity: 128,
        }
    }
}
