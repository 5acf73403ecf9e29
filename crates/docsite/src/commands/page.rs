//! `docsite page` command implementation.

use std::path::PathBuf;

use clap::Args;
use docsite_config::Config;
use docsite_server::Content;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the page command.
#[derive(Args)]
pub(crate) struct PageArgs {
    /// Content path (e.g., docs/8.1/get-started/install.mdx).
    path: String,

    /// Path to configuration file (default: auto-discover docsite.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print metadata only, without compiling the body.
    #[arg(long)]
    meta_only: bool,
}

impl PageArgs {
    /// Execute the page command.
    ///
    /// # Errors
    ///
    /// Returns an error if the page is absent, fails to compile, or cannot
    /// be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;
        let content = Content::from_config(&config)?;
        tracing::debug!(path = %self.path, meta_only = self.meta_only, "Resolving page");

        let json = if self.meta_only {
            content
                .resolver
                .resolve_meta(&self.path)?
                .map(|meta| serde_json::to_string_pretty(&meta))
        } else {
            content
                .resolver
                .resolve(&self.path)?
                .map(|page| serde_json::to_string_pretty(&page))
        };

        match json {
            Some(json) => {
                output.data(&json?);
                Ok(())
            }
            None => Err(CliError::NotFound(format!("{}: not found", self.path))),
        }
    }
}
