//! `docsite serve` command implementation.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use docsite_config::{CliSettings, Config, SourceKind};
use docsite_server::{Content, run_server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Content source selectable on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum SourceArg {
    Local,
    Github,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Local => Self::Local,
            SourceArg::Github => Self::Github,
        }
    }
}

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover docsite.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Local content directory (overrides config).
    #[arg(long)]
    content_dir: Option<PathBuf>,

    /// Content source (overrides config).
    #[arg(long, value_enum)]
    source: Option<SourceArg>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            content_dir: self.content_dir,
            source: self.source.map(SourceKind::from),
        };

        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let content = Content::from_config(&config)?;

        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        match config.content_resolved.source {
            SourceKind::Local => output.info(&format!(
                "Content directory: {}",
                config.content_resolved.dir.display()
            )),
            SourceKind::Github => {
                if let Some(github) = &config.github {
                    output.info(&format!(
                        "Content repository: {}/{}@{}",
                        github.owner, github.repo, github.branch
                    ));
                }
            }
        }
        if config.versions.is_empty() {
            output.warning("No [[versions]] configured, docs endpoints will return 404");
        } else {
            let ids: Vec<&str> = config.versions.iter().map(|v| v.id.as_str()).collect();
            output.info(&format!("Versions: {}", ids.join(", ")));
        }

        run_server(server_config_from_config(&config), content)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        output.success("Server stopped");
        Ok(())
    }
}
