use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the server socket, the transport layer and logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub transport: TransportSettings,
    pub logging: LoggingSettings,
}

/// Configuration settings for the server.
///
/// Defines the host and port the server will bind to.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Configuration settings for the transport layer.
#[derive(Debug, Deserialize, Clone)]
pub struct TransportSettings {
    /// Whether every sent and received message is logged.
    pub log_traffic: bool,
    /// Upper bound on the size of a single wire frame.
    pub max_frame_bytes: usize,
}

/// Logging configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub transport: Option<PartialTransportSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

/// Partial server settings.
#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Partial transport settings.
#[derive(Debug, Deserialize)]
pub struct PartialTransportSettings {
    pub log_traffic: Option<bool>,
    pub max_frame_bytes: Option<usize>,
}

/// Partial logging settings.
#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

/// Provides default values for `Settings`.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8917,
            },
            transport: TransportSettings {
                log_traffic: false,
                max_frame_bytes: 1024 * 1024,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}
