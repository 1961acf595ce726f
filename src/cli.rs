//! # Command Line Interface
//!
//! Flags for the server binary. Each flag overrides its environment setting.

use clap::Parser;

use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "socialfeed")]
#[command(about = "Social feed API server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Address to bind to, e.g. 127.0.0.1:8080
    #[arg(long)]
    pub bind: Option<String>,

    /// Apply pending database migrations before serving
    #[arg(long)]
    pub migrate: bool,
}

impl Cli {
    /// Fold the flags into an environment-loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) -> crate::Result<()> {
        if let Some(bind) = &self.bind {
            let (host, port) = bind
                .rsplit_once(':')
                .ok_or_else(|| crate::Error::config(format!("--bind must be host:port, got '{}'", bind)))?;
            config.server.host = host.to_string();
            config.server.port = port
                .parse()
                .map_err(|e| crate::Error::config(format!("Invalid port in --bind '{}': {}", bind, e)))?;
        }

        if self.migrate {
            config.database.auto_migrate = true;
        }

        Ok(())
    }
}
