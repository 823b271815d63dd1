//! Daemon configuration loaded from TOML.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::DaemonError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub emulator: EmulatorConfig,
}

/// Daemon network and runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum number of concurrently connected clients (player slots).
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl DaemonConfig {
    /// The socket address to listen on.
    pub fn listen_addr(&self) -> Result<SocketAddr, DaemonError> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .map_err(|e| DaemonError::Config(format!("invalid listen address: {e}")))
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            max_clients: default_max_clients(),
            log_level: default_log_level(),
        }
    }
}

/// Emulator process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmulatorConfig {
    /// Path to the Dolphin executable, launched with no arguments.
    #[serde(default = "default_executable")]
    pub executable: PathBuf,
    /// Process name used for the process-table fallback check, which
    /// catches an emulator launched outside the relay.
    #[serde(default = "default_process_name")]
    pub process_name: String,
    /// Seconds to wait for a graceful exit before force-killing on stop.
    #[serde(default = "default_stop_grace_secs")]
    pub stop_grace_secs: u64,
    /// Directory holding Dolphin's controller input pipes (Linux backend).
    /// Defaults to the platform data directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipe_dir: Option<PathBuf>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            process_name: default_process_name(),
            stop_grace_secs: default_stop_grace_secs(),
            pipe_dir: None,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8765
}

fn default_max_clients() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_executable() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("C:\\Program Files\\Dolphin\\Dolphin.exe")
    } else {
        PathBuf::from("/usr/bin/dolphin-emu")
    }
}

fn default_process_name() -> String {
    if cfg!(windows) {
        "Dolphin.exe".to_string()
    } else {
        "dolphin-emu".to_string()
    }
}

fn default_stop_grace_secs() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("port = 8765"));
        assert!(toml_str.contains("max_clients = 4"));
    }

    #[test]
    fn parse_example_config() {
        let toml_str = r#"
[daemon]
bind = "127.0.0.1"
port = 9000
max_clients = 2
log_level = "debug"

[emulator]
executable = "/opt/dolphin/dolphin-emu"
process_name = "dolphin-emu"
stop_grace_secs = 10
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.daemon.port, 9000);
        assert_eq!(config.daemon.max_clients, 2);
        assert_eq!(
            config.emulator.executable,
            PathBuf::from("/opt/dolphin/dolphin-emu")
        );
        assert_eq!(config.emulator.stop_grace_secs, 10);
        assert_eq!(config.emulator.pipe_dir, None);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: Config = toml::from_str("[daemon]\nport = 1234\n").unwrap();
        assert_eq!(config.daemon.port, 1234);
        assert_eq!(config.daemon.max_clients, 4);
        assert_eq!(config.emulator.stop_grace_secs, 5);
    }

    #[test]
    fn listen_addr_parses() {
        let config = DaemonConfig {
            bind: "127.0.0.1".to_string(),
            ..DaemonConfig::default()
        };
        let addr = config.listen_addr().unwrap();
        assert_eq!(addr.port(), 8765);
    }

    #[test]
    fn listen_addr_rejects_garbage() {
        let config = DaemonConfig {
            bind: "not-an-address".to_string(),
            ..DaemonConfig::default()
        };
        assert!(config.listen_addr().is_err());
    }
}
