use clap::Parser;

use crate::config::AppConfig;

/// Command-line overrides applied on top of the environment configuration
#[derive(Debug, Parser)]
#[command(name = "recoverly-api", version, about = "Journaling and wellness REST backend")]
pub struct ServeArgs {
    /// Port to listen on (defaults to PORT or 8080)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Postgres connection string, or `memory:` for the in-process store
    #[arg(long)]
    pub database_url: Option<String>,

    /// Directory served under /app/json/
    #[arg(long)]
    pub json_dir: Option<String>,

    /// Directory holding the compiled client application
    #[arg(long)]
    pub pages_dir: Option<String>,
}

impl ServeArgs {
    pub fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = self.database_url {
            config.database.url = Some(url);
        }
        if let Some(dir) = self.json_dir {
            config.server.json_dir = dir;
        }
        if let Some(dir) = self.pages_dir {
            config.server.pages_dir = dir;
        }
        config
    }
}
