//! Content resolver and tree builder wiring.

use std::sync::Arc;

use docsite_config::{Config, ConfigError, SourceKind};
use docsite_renderer::{Compiler, ComponentRegistry};
use docsite_site::{Resolver, TreeBuilder};
use docsite_storage::{
    ContentSource, FsStorage, GithubConfig, GithubStorage, PathLister, StorageError,
};

/// Error assembling the content pipeline from configuration.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid content settings: {0}")]
    Storage(#[from] StorageError),
    #[error("Failed to create tree worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Resolver and tree builder sharing one content source.
#[derive(Clone)]
pub struct Content {
    pub resolver: Arc<Resolver>,
    pub tree: Arc<TreeBuilder>,
}

impl Content {
    /// Wire a resolver and tree builder over the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree worker pool cannot be created.
    pub fn new(
        source: Arc<dyn ContentSource>,
        lister: Arc<dyn PathLister>,
        compiler: Compiler,
        docs_dir: &str,
        parallelism: usize,
    ) -> Result<Self, SetupError> {
        let resolver = Arc::new(Resolver::new(source, compiler).with_docs_dir(docs_dir));
        let tree = TreeBuilder::new(Arc::clone(&resolver), lister).with_parallelism(parallelism)?;

        Ok(Self {
            resolver,
            tree: Arc::new(tree),
        })
    }

    /// Build the content pipeline described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the GitHub section is missing or invalid, an include
    /// pattern is malformed, or the worker pool cannot be created.
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        let mut registry = ComponentRegistry::default();
        registry.extend(config.components.extra.iter().cloned());
        let compiler = Compiler::new(registry);

        let content = &config.content_resolved;
        let parallelism = config.tree.parallelism;

        match content.source {
            SourceKind::Local => {
                let mut storage =
                    FsStorage::new(content.dir.clone()).with_docs_dir(content.docs_dir.clone());
                if !content.include.is_empty() {
                    storage = storage.with_patterns(&content.include)?;
                }
                tracing::info!(dir = %content.dir.display(), "Reading content from local directory");

                let storage = Arc::new(storage);
                Self::new(
                    Arc::clone(&storage) as Arc<dyn ContentSource>,
                    storage,
                    compiler,
                    &content.docs_dir,
                    parallelism,
                )
            }
            SourceKind::Github => {
                let github = config.require_github()?;
                let mut settings = GithubConfig::new(&github.owner, &github.repo);
                settings.branch.clone_from(&github.branch);
                settings.token.clone_from(&github.token);
                settings.api_version.clone_from(&github.api_version);
                settings.user_agent.clone_from(&github.user_agent);
                settings.raw_base.clone_from(&github.raw_base);
                settings.api_base.clone_from(&github.api_base);
                settings.docs_dir.clone_from(&content.docs_dir);
                settings.timeout = github.timeout();
                tracing::info!(
                    owner = %settings.owner,
                    repo = %settings.repo,
                    branch = %settings.branch,
                    "Reading content from GitHub"
                );

                let storage = Arc::new(GithubStorage::new(settings));
                Self::new(
                    Arc::clone(&storage) as Arc<dyn ContentSource>,
                    storage,
                    compiler,
                    &content.docs_dir,
                    parallelism,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use docsite_config::CliSettings;
    use pretty_assertions::assert_eq;

    use super::*;

    fn load(dir: &std::path::Path, toml: &str) -> Config {
        let path = dir.join("docsite.toml");
        fs::write(&path, toml).unwrap();
        Config::load(Some(&path), Some(&CliSettings::default())).unwrap()
    }

    #[test]
    fn test_from_config_local() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("content/docs/8.1")).unwrap();
        fs::write(
            dir.path().join("content/docs/8.1/faq.mdx"),
            "---\ntitle: FAQ\n---\n<Badge />\n",
        )
        .unwrap();
        let config = load(dir.path(), "[components]\nextra = [\"Badge\"]\n");

        let content = Content::from_config(&config).unwrap();

        let page = content.resolver.resolve("docs/8.1/faq.mdx").unwrap().unwrap();
        assert_eq!(page.meta.title, "FAQ");
        let tree = content.tree.build("8.1").unwrap();
        assert_eq!(tree.items.len(), 1);
    }

    #[test]
    fn test_from_config_include_patterns() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("content/docs/8.1")).unwrap();
        fs::write(dir.path().join("content/docs/8.1/a.mdx"), "").unwrap();
        fs::write(dir.path().join("content/docs/8.1/b.md"), "").unwrap();
        let config = load(dir.path(), "[content]\ninclude = [\"*.mdx\"]\n");

        let content = Content::from_config(&config).unwrap();

        let tree = content.tree.build("8.1").unwrap();
        let ids: Vec<&str> = tree.items.iter().map(|n| n.meta.id.as_str()).collect();
        assert_eq!(ids, vec!["docs/8.1/a"]);
    }

    #[test]
    fn test_from_config_invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(dir.path(), "[content]\ninclude = [\"[\"]\n");

        let result = Content::from_config(&config);

        assert!(matches!(result, Err(SetupError::Storage(_))));
    }

    #[test]
    fn test_from_config_github() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(
            dir.path(),
            "[content]\nsource = \"github\"\n\n[github]\nowner = \"storybookjs\"\nrepo = \"web\"\n\n[tree]\nparallelism = 2\n",
        );

        assert!(Content::from_config(&config).is_ok());
    }
}
