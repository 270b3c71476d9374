// Frameworks layer: process bootstrap, configuration, and HTTP wiring.

pub mod config;
pub mod server;
