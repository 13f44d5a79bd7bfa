pub mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{LoggingSettings, ServerSettings, Settings, TransportSettings};

/// Loads settings from an optional `config/default` file and the process
/// environment, layered over [`Settings::default`].
///
/// Environment keys use a double-underscore section separator so multi-word
/// fields stay addressable, e.g. `SERVER__PORT` and `TRANSPORT__LOG_TRAFFIC`.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(Environment::default().separator("__"));

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;
    let default = Settings::default();

    Ok(Settings {
        server: ServerSettings {
            host: partial
                .server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: partial
                .server
                .as_ref()
                .and_then(|s| s.port)
                .unwrap_or(default.server.port),
        },
        transport: TransportSettings {
            log_traffic: partial
                .transport
                .as_ref()
                .and_then(|t| t.log_traffic)
                .unwrap_or(default.transport.log_traffic),
            max_frame_bytes: partial
                .transport
                .as_ref()
                .and_then(|t| t.max_frame_bytes)
                .unwrap_or(default.transport.max_frame_bytes),
        },
        logging: LoggingSettings {
            level: partial
                .logging
                .as_ref()
                .and_then(|l| l.level.clone())
                .unwrap_or(default.logging.level),
        },
    })
}
