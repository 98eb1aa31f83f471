//! Assembling the effective configuration from every source.

use std::env;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::environment::EnvironmentConfig;
use crate::config::loader::ConfigLoader;
use crate::config::merger::ConfigMerger;
use crate::config::schema::Config;
use crate::config::validator::ConfigValidator;
use crate::error::Result;

/// Builds a validated [`Config`] from files, environment and overrides.
///
/// # Examples
///
/// ```
/// use testdb::config::{Config, ConfigBuilder};
///
/// let config = ConfigBuilder::new()
///     .skip_files()
///     .skip_env()
///     .with_config(Config {
///         create_user: Some(true),
///         ..Default::default()
///     })
///     .build()
///     .unwrap();
/// assert_eq!(config.create_user, Some(true));
/// ```
#[derive(Debug, Default, Clone)]
pub struct ConfigBuilder {
    working_dir: Option<PathBuf>,
    user_dir: Option<PathBuf>,
    file: Option<PathBuf>,
    skip_files: bool,
    skip_env: bool,
    overrides: Option<Config>,
}

impl ConfigBuilder {
    /// Builder that reads every source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start project file discovery at `dir` instead of the current directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: &Path) -> Self {
        self.working_dir = Some(dir.to_path_buf());
        self
    }

    /// Read the user config from `dir/config.yaml` instead of `~/.testdb`.
    #[must_use]
    pub fn with_user_dir(mut self, dir: &Path) -> Self {
        self.user_dir = Some(dir.to_path_buf());
        self
    }

    /// Also load `path`, above every discovered file. The file must exist.
    #[must_use]
    pub fn with_file(mut self, path: &Path) -> Self {
        self.file = Some(path.to_path_buf());
        self
    }

    /// Skip user and project file discovery. An explicit file is still read.
    #[must_use]
    pub fn skip_files(mut self) -> Self {
        self.skip_files = true;
        self
    }

    /// Ignore `TESTDB_*` environment variables.
    #[must_use]
    pub fn skip_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Apply `config` on top of everything else.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.overrides = Some(config);
        self
    }

    /// Merge all sources and validate the result.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or parsed, an environment
    /// variable is malformed, or the merged configuration is invalid.
    pub fn build(self) -> Result<Config> {
        let mut sources = Vec::new();

        if !self.skip_files {
            let working_dir = match self.working_dir {
                Some(dir) => dir,
                None => env::current_dir()?,
            };
            sources.extend(ConfigLoader::load_all(
                &working_dir,
                self.user_dir.as_deref(),
            )?);
        }

        if let Some(ref path) = self.file {
            sources.push(ConfigLoader::load_explicit(path)?);
        }

        for source in &sources {
            debug!(
                "using configuration {} (precedence {})",
                source.path.display(),
                source.precedence
            );
        }

        let mut config = ConfigMerger::merge(sources);

        if !self.skip_env {
            EnvironmentConfig::apply_overrides(&mut config)?;
        }

        if let Some(ref overrides) = self.overrides {
            ConfigMerger::merge_into(&mut config, overrides);
        }

        ConfigValidator::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_only() {
        let config = ConfigBuilder::new().skip_files().skip_env().build().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_explicit_file_beats_project_files() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(project.path().join("testdb.yaml"), "host: /shared\ncreate_user: true\n")
            .unwrap();
        fs::write(project.path().join("testdb.local.yaml"), "host: /local\n").unwrap();
        let explicit = project.path().join("ci.yaml");
        fs::write(&explicit, "host: /explicit\n").unwrap();

        let config = ConfigBuilder::new()
            .with_working_dir(project.path())
            .with_user_dir(user.path())
            .with_file(&explicit)
            .skip_env()
            .build()
            .unwrap();

        assert_eq!(config.host.as_deref(), Some("/explicit"));
        assert_eq!(config.create_user, Some(true));
    }

    #[test]
    fn test_explicit_file_read_when_skipping_discovery() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("ci.yaml");
        fs::write(&explicit, "stop_timeout_ms: 250\n").unwrap();

        let config = ConfigBuilder::new()
            .skip_files()
            .skip_env()
            .with_file(&explicit)
            .build()
            .unwrap();
        assert_eq!(config.stop_timeout_ms, Some(250));
    }

    #[test]
    fn test_overrides_beat_files() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(project.path().join("testdb.yaml"), "rollback_on_failure: false\n").unwrap();

        let config = ConfigBuilder::new()
            .with_working_dir(project.path())
            .with_user_dir(user.path())
            .skip_env()
            .with_config(Config {
                rollback_on_failure: Some(true),
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_eq!(config.rollback_on_failure, Some(true));
    }

    #[test]
    fn test_invalid_result_is_rejected() {
        let result = ConfigBuilder::new()
            .skip_files()
            .skip_env()
            .with_config(Config {
                stop_timeout_ms: Some(0),
                ..Default::default()
            })
            .build();
        assert!(result.is_err());
    }
}
