use std::{env, net::IpAddr, time::Duration};

// Runtime/server settings (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("SNAKE_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000)
}

pub fn http_host() -> IpAddr {
    env::var("SNAKE_SERVER_HOST")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

pub fn tick_interval() -> Duration {
    let millis = env::var("TICK_INTERVAL_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|millis| *millis > 0)
        .unwrap_or(DEFAULT_TICK_INTERVAL_MS);
    Duration::from_millis(millis)
}

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;
// Per-game update channel; a subscriber further behind than this skips ahead.
pub const UPDATE_BROADCAST_CAPACITY: usize = 16;
