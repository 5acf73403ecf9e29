//! Configuration management for the docs site.
//!
//! Parses `docsite.toml` with serde. Without an explicit path the file is
//! searched for in the current directory and its parents; without any file
//! the defaults apply.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String values support `${VAR}` (error if unset) and `${VAR:-default}`.
//!
//! Expanded fields:
//! - `server.host`
//! - `github.owner`, `github.repo`, `github.branch`, `github.token`
//! - `github.user_agent`, `github.raw_base`, `github.api_base`
//!
//! ## Example
//!
//! ```toml
//! default_version = "8.1"
//!
//! [content]
//! source = "github"
//!
//! [github]
//! owner = "storybookjs"
//! repo = "storybook"
//! token = "${GITHUB_TOKEN}"
//!
//! [[versions]]
//! id = "8.1"
//! label = "8.1 (latest)"
//!
//! [[versions]]
//! id = "7.6"
//! ```

mod expand;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "docsite.toml";

/// CLI settings that override configuration file values.
///
/// Only `Some` values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Override the local content directory.
    pub content_dir: Option<PathBuf>,
    pub source: Option<SourceKind>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    /// Content section as written (relative paths).
    content: ContentConfigRaw,
    /// Required when the content source is `github`.
    pub github: Option<GithubConfig>,
    /// Documentation versions, newest first.
    pub versions: Vec<VersionConfig>,
    default_version: Option<String>,
    pub components: ComponentsConfig,
    pub tree: TreeConfig,
    pub feedback: FeedbackConfig,

    /// Resolved content configuration (set after loading).
    #[serde(skip)]
    pub content_resolved: ContentConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 3000,
        }
    }
}

/// Where content is read from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Local content directory.
    #[default]
    Local,
    /// Raw files of a GitHub repository.
    Github,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContentConfigRaw {
    source: SourceKind,
    dir: Option<String>,
    docs_dir: Option<String>,
    include: Vec<String>,
}

/// Resolved content configuration with an absolute content directory.
#[derive(Debug, Default)]
pub struct ContentConfig {
    pub source: SourceKind,
    /// Local content root.
    pub dir: PathBuf,
    /// Directory holding one subdirectory per version (relative to the root).
    pub docs_dir: String,
    /// Glob patterns limiting which local files are listed.
    pub include: Vec<String>,
}

/// GitHub content source configuration.
#[derive(Debug, Deserialize)]
pub struct GithubConfig {
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Bearer token, commonly `${GITHUB_TOKEN}`.
    pub token: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_raw_base")]
    pub raw_base: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GithubConfig {
    /// Request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate that all required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if a field is empty or malformed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.owner, "github.owner")?;
        require_non_empty(&self.repo, "github.repo")?;
        require_non_empty(&self.branch, "github.branch")?;
        require_non_empty(&self.api_version, "github.api_version")?;
        require_http_url(&self.raw_base, "github.raw_base")?;
        require_http_url(&self.api_base, "github.api_base")?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "github.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }
}

fn default_branch() -> String {
    "main".to_owned()
}

fn default_api_version() -> String {
    "2022-11-28".to_owned()
}

fn default_user_agent() -> String {
    "docsite".to_owned()
}

fn default_raw_base() -> String {
    "https://raw.githubusercontent.com".to_owned()
}

fn default_api_base() -> String {
    "https://api.github.com".to_owned()
}

fn default_timeout_secs() -> u64 {
    30
}

/// A documentation version.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct VersionConfig {
    /// Directory name below the docs directory (e.g., `8.1`).
    pub id: String,
    /// Display label, defaults to the id.
    pub label: Option<String>,
}

impl VersionConfig {
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// Embedded component allow-list extensions.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ComponentsConfig {
    /// Component names permitted in addition to the built-in set.
    pub extra: Vec<String>,
}

/// Tree builder configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Worker threads for resolving pages (1 = sequential).
    pub parallelism: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self { parallelism: 1 }
    }
}

/// Feedback rate limiting configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Minimum interval between submissions from one client.
    pub window_ms: u64,
    /// Maximum number of tracked clients.
    pub capacity: usize,
}

impl FeedbackConfig {
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            window_ms: 1000,
            capacity: 10_000,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., `github.token`).
        field: String,
        /// Error message (e.g., `${GITHUB_TOKEN} not set`).
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `docsite.toml` in the current directory and parents, falling back
    /// to defaults.
    ///
    /// CLI settings are applied after path resolution and take precedence.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit `config_path` doesn't exist, or if
    /// reading, parsing, expansion or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(dir) = &settings.content_dir {
            self.content_resolved.dir.clone_from(dir);
        }
        if let Some(source) = settings.source {
            self.content_resolved.source = source;
        }
    }

    /// Default version id: `default_version`, else the first listed version.
    #[must_use]
    pub fn default_version(&self) -> Option<&str> {
        self.default_version
            .as_deref()
            .or_else(|| self.versions.first().map(|v| v.id.as_str()))
    }

    /// Look up a configured version.
    #[must_use]
    pub fn version(&self, id: &str) -> Option<&VersionConfig> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Get validated GitHub configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or invalid.
    pub fn require_github(&self) -> Result<&GithubConfig, ConfigError> {
        let github = self.github.as_ref().ok_or_else(|| {
            ConfigError::Validation("[github] section required when content.source = \"github\"".into())
        })?;
        github.validate()?;
        Ok(github)
    }

    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            content: ContentConfigRaw::default(),
            github: None,
            versions: Vec::new(),
            default_version: None,
            components: ComponentsConfig::default(),
            tree: TreeConfig::default(),
            feedback: FeedbackConfig::default(),
            content_resolved: ContentConfig {
                source: SourceKind::Local,
                dir: base.join("content"),
                docs_dir: "docs".to_owned(),
                include: Vec::new(),
            },
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_content()?;
        self.validate_versions()?;

        if self.tree.parallelism == 0 {
            return Err(ConfigError::Validation(
                "tree.parallelism must be at least 1".to_owned(),
            ));
        }
        if self.feedback.capacity == 0 {
            return Err(ConfigError::Validation(
                "feedback.capacity must be at least 1".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_content(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.content_resolved.docs_dir, "content.docs_dir")?;

        match self.content_resolved.source {
            SourceKind::Github => {
                self.require_github()?;
            }
            SourceKind::Local => {
                if let Some(github) = &self.github {
                    github.validate()?;
                }
            }
        }

        Ok(())
    }

    fn validate_versions(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for version in &self.versions {
            require_non_empty(&version.id, "versions.id")?;
            if version.id.contains('/') {
                return Err(ConfigError::Validation(format!(
                    "version id '{}' cannot contain '/'",
                    version.id
                )));
            }
            if !seen.insert(version.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate version id '{}'",
                    version.id
                )));
            }
        }

        if let Some(default) = &self.default_version
            && !seen.contains(default.as_str())
        {
            return Err(ConfigError::Validation(format!(
                "default_version '{default}' is not in [[versions]]"
            )));
        }

        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref mut github) = self.github {
            github.owner = expand::expand_env(&github.owner, "github.owner")?;
            github.repo = expand::expand_env(&github.repo, "github.repo")?;
            github.branch = expand::expand_env(&github.branch, "github.branch")?;
            github.user_agent = expand::expand_env(&github.user_agent, "github.user_agent")?;
            github.raw_base = expand::expand_env(&github.raw_base, "github.raw_base")?;
            github.api_base = expand::expand_env(&github.api_base, "github.api_base")?;
            expand::expand_opt(&mut github.token, "github.token")?;
        }

        Ok(())
    }

    fn resolve_paths(&mut self, config_dir: &Path) {
        self.content_resolved = ContentConfig {
            source: self.content.source,
            dir: config_dir.join(self.content.dir.as_deref().unwrap_or("content")),
            docs_dir: self
                .content
                .docs_dir
                .as_deref()
                .unwrap_or("docs")
                .trim_matches('/')
                .to_owned(),
            include: self.content.include.clone(),
        };
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(toml: &str) -> Config {
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.content_resolved.source, SourceKind::Local);
        assert_eq!(config.content_resolved.dir, PathBuf::from("/test/content"));
        assert_eq!(config.content_resolved.docs_dir, "docs");
        assert_eq!(config.tree.parallelism, 1);
        assert_eq!(config.feedback.window(), Duration::from_secs(1));
        assert_eq!(config.feedback.capacity, 10_000);
        assert!(config.default_version().is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = parse("");

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.content_resolved.dir, PathBuf::from("/project/content"));
        assert!(config.github.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse(
            r#"
default_version = "7.6"

[server]
host = "0.0.0.0"
port = 8080

[content]
source = "github"
dir = "site"
docs_dir = "/docs/"
include = ["**/*.mdx"]

[github]
owner = "storybookjs"
repo = "storybook"
token = "abc"

[[versions]]
id = "8.1"
label = "8.1 (latest)"

[[versions]]
id = "7.6"

[components]
extra = ["Badge"]

[tree]
parallelism = 4

[feedback]
window_ms = 500
capacity = 64
"#,
        );

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.content_resolved.source, SourceKind::Github);
        assert_eq!(config.content_resolved.dir, PathBuf::from("/project/site"));
        assert_eq!(config.content_resolved.docs_dir, "docs");
        assert_eq!(config.content_resolved.include, vec!["**/*.mdx"]);

        let github = config.require_github().unwrap();
        assert_eq!(github.owner, "storybookjs");
        assert_eq!(github.branch, "main");
        assert_eq!(github.api_version, "2022-11-28");
        assert_eq!(github.raw_base, "https://raw.githubusercontent.com");
        assert_eq!(github.timeout(), Duration::from_secs(30));
        assert_eq!(github.token.as_deref(), Some("abc"));

        assert_eq!(config.versions.len(), 2);
        assert_eq!(config.versions[0].label(), "8.1 (latest)");
        assert_eq!(config.versions[1].label(), "7.6");
        assert_eq!(config.default_version(), Some("7.6"));
        assert!(config.version("8.1").is_some());
        assert!(config.version("6.5").is_none());

        assert_eq!(config.components.extra, vec!["Badge"]);
        assert_eq!(config.tree.parallelism, 4);
        assert_eq!(config.feedback.window_ms, 500);
        assert_eq!(config.feedback.capacity, 64);
        config.validate().unwrap();
    }

    #[test]
    fn test_default_version_is_first_entry() {
        let config = parse("[[versions]]\nid = \"8.1\"\n\n[[versions]]\nid = \"7.6\"\n");

        assert_eq!(config.default_version(), Some("8.1"));
    }

    #[test]
    fn test_unknown_source_rejected() {
        let result: Result<Config, _> = toml::from_str("[content]\nsource = \"s3\"\n");

        assert!(result.is_err());
    }

    #[test]
    fn test_github_source_requires_section() {
        let config = parse("[content]\nsource = \"github\"\n");

        let err = config.validate().unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("[github]"));
    }

    #[test]
    fn test_github_invalid_base_url() {
        let config = parse(
            "[content]\nsource = \"github\"\n\n[github]\nowner = \"o\"\nrepo = \"r\"\nraw_base = \"ftp://x\"\n",
        );

        let err = config.validate().unwrap_err();

        assert!(err.to_string().contains("github.raw_base"));
    }

    #[test]
    fn test_validate_server_host_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.host = String::new();

        assert!(config.validate().unwrap_err().to_string().contains("server.host"));
    }

    #[test]
    fn test_validate_server_port_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.port = 0;

        assert!(config.validate().unwrap_err().to_string().contains("server.port"));
    }

    #[test]
    fn test_validate_duplicate_versions() {
        let config = parse("[[versions]]\nid = \"8.1\"\n\n[[versions]]\nid = \"8.1\"\n");

        let err = config.validate().unwrap_err();

        assert!(err.to_string().contains("duplicate version id '8.1'"));
    }

    #[test]
    fn test_validate_unknown_default_version() {
        let config = parse("default_version = \"9.0\"\n\n[[versions]]\nid = \"8.1\"\n");

        let err = config.validate().unwrap_err();

        assert!(err.to_string().contains("default_version '9.0'"));
    }

    #[test]
    fn test_validate_zero_parallelism() {
        let config = parse("[tree]\nparallelism = 0\n");

        assert!(config.validate().unwrap_err().to_string().contains("tree.parallelism"));
    }

    #[test]
    fn test_validate_zero_capacity() {
        let config = parse("[feedback]\ncapacity = 0\n");

        assert!(config.validate().unwrap_err().to_string().contains("feedback.capacity"));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            host: Some("0.0.0.0".to_owned()),
            port: Some(9000),
            content_dir: Some(PathBuf::from("/custom")),
            source: Some(SourceKind::Github),
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.content_resolved.dir, PathBuf::from("/custom"));
        assert_eq!(config.content_resolved.source, SourceKind::Github);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));

        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.content_resolved.dir, PathBuf::from("/test/content"));
    }

    #[test]
    fn test_expand_env_vars_github() {
        // SAFETY: variable names are unique to this test
        unsafe {
            std::env::set_var("DOCSITE_TEST_CFG_TOKEN", "ghp_secret");
            std::env::remove_var("DOCSITE_TEST_CFG_BRANCH");
        }
        let mut config: Config = toml::from_str(
            r#"
[github]
owner = "storybookjs"
repo = "storybook"
branch = "${DOCSITE_TEST_CFG_BRANCH:-next}"
token = "${DOCSITE_TEST_CFG_TOKEN}"
"#,
        )
        .unwrap();

        config.expand_env_vars().unwrap();

        let github = config.github.unwrap();
        assert_eq!(github.branch, "next");
        assert_eq!(github.token.as_deref(), Some("ghp_secret"));
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("DOCSITE_TEST_CFG_MISSING");
        }
        let mut config: Config =
            toml::from_str("[server]\nhost = \"${DOCSITE_TEST_CFG_MISSING}\"\n").unwrap();

        let err = config.expand_env_vars().unwrap_err();

        match err {
            ConfigError::EnvVar { field, .. } => assert_eq!(field, "server.host"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[server]\nport = 4000\n\n[content]\ndir = \"docs-content\"\n")
            .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.content_resolved.dir, dir.path().join("docs-content"));
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[server\nport = 1").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_applies_and_validates_cli_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "").unwrap();
        let overrides = CliSettings {
            source: Some(SourceKind::Github),
            ..Default::default()
        };

        let err = Config::load(Some(&path), Some(&overrides)).unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
