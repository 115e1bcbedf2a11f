//! Server configuration from the environment

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port the server listens on
    pub port: u16,
    /// Directory served for the client apps
    pub static_dir: String,
}

impl ServerConfig {
    pub const DEFAULT_PORT: u16 = 3000;

    /// Load config from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let port = match std::env::var("PORT") {
            Ok(raw) => match raw.trim().parse() {
                Ok(port) => port,
                Err(_) => {
                    tracing::warn!(
                        "invalid PORT value '{}', using {}",
                        raw,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            Err(_) => Self::DEFAULT_PORT,
        };

        let static_dir = std::env::var("STATIC_DIR")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "static".to_string());

        Self { port, static_dir }
    }
}
