//! `folio serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use folio_config::{CliSettings, Config};
use folio_server::{run_server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Content directory to serve (overrides config).
    dir: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind to (overrides config).
    #[arg(short, long)]
    bind: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Serve documents marked as drafts.
    #[arg(long)]
    drafts: bool,

    /// Disable file watching.
    #[arg(long)]
    no_watch: bool,

    /// Enable verbose output (show render warnings).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the content directory is
    /// missing, or the server fails to start.
    pub(crate) async fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        // Build CLI settings from args
        let cli_settings = CliSettings {
            host: self.bind,
            port: self.port,
            content_dir: self.dir,
            include_drafts: self.drafts.then_some(true),
            watch_enabled: self.no_watch.then_some(false),
        };

        // Load config
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let content_dir = &config.content_resolved.dir;
        if !content_dir.is_dir() {
            return Err(CliError::Validation(format!(
                "content directory not found: {}",
                content_dir.display()
            )));
        }

        // Print startup info
        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!("Content directory: {}", content_dir.display()));

        if config.content_resolved.include_drafts {
            output.warning("Drafts: included");
        }

        if config.watch.enabled {
            output.info("File watching: enabled");
        } else {
            output.info("File watching: disabled");
        }

        // Build server config and run
        let server_config = server_config_from_config(&config, version.to_string(), self.verbose);
        run_server(server_config)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }
}
