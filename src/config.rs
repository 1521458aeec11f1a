//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config`, or `config.toml` in the platform config directory)
//! 3. `EBOOKDEDUPE_*` environment variables (`__` separates nested keys)
//! 4. Command-line flags
//!
//! # Example
//!
//! ```toml
//! root = "/home/reader/Books"
//! database = "/home/reader/.local/share/ebookinfo.db"
//! copy_markers = ["(1)", "副本", " - Copy"]
//! delete_mode = "trash"
//! ```

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::actions::delete::DeleteMode;
use crate::cli::{Cli, DedupeArgs};
use crate::dedupe::{EngineConfig, DEFAULT_COPY_MARKERS};
use crate::rename::{EpubMetadata, Renamer};
use crate::scanner::{WalkerConfig, DEFAULT_BUFFER_SIZE};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "EBOOKDEDUPE_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory to operate on
    pub root: PathBuf,
    /// Index database file
    pub database: PathBuf,
    /// File-name substrings that mark a copy
    pub copy_markers: Vec<String>,
    /// How duplicates are removed
    pub delete_mode: DeleteMode,
    /// Hasher read buffer size in bytes
    pub buffer_size: usize,
    /// Follow symbolic links during walks
    pub follow_symlinks: bool,
    /// Skip hidden files and directories
    pub skip_hidden: bool,
    /// Deduplicate zero-length files too
    pub include_empty: bool,
    /// Extension of books handled by rename
    pub book_extension: String,
    /// Extension of companion files renamed alongside a book
    pub sidecar_extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            database: PathBuf::from("ebookinfo.db"),
            copy_markers: DEFAULT_COPY_MARKERS.iter().map(ToString::to_string).collect(),
            delete_mode: DeleteMode::Permanent,
            buffer_size: DEFAULT_BUFFER_SIZE,
            follow_symlinks: false,
            skip_hidden: false,
            include_empty: false,
            book_extension: "epub".to_string(),
            sidecar_extension: "mobi".to_string(),
        }
    }
}

impl Config {
    /// Load defaults, the config file and the environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit file is missing, any layer fails to
    /// parse, or the result is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match path {
            Some(path) => {
                if !path.is_file() {
                    bail!("Config file not found: {}", path.display());
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(default_path) = Self::config_path() {
                    log::debug!("Looking for config at {}", default_path.display());
                    figment = figment.merge(Toml::file(default_path));
                }
            }
        }

        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load defaults and a single TOML file, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or the result is invalid.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .extract()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "ebookdedupe", "ebookdedupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply the global command-line overrides.
    #[must_use]
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(root) = &cli.root {
            self.root = root.clone();
        }
        if let Some(database) = &cli.database {
            self.database = database.clone();
        }
        self
    }

    /// Walker settings from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::new(self.follow_symlinks, self.skip_hidden)
    }

    /// Engine settings, with remove-duplicates flags applied on top.
    #[must_use]
    pub fn engine_config(&self, args: &DedupeArgs) -> EngineConfig {
        let markers = if args.markers.is_empty() {
            self.copy_markers.clone()
        } else {
            args.markers.clone()
        };
        let delete_mode = if args.trash {
            DeleteMode::Trash
        } else {
            self.delete_mode
        };
        let walker = WalkerConfig::new(
            self.follow_symlinks || args.follow_symlinks,
            self.skip_hidden || args.skip_hidden,
        );

        EngineConfig::default()
            .with_copy_markers(markers)
            .with_delete_mode(delete_mode)
            .with_dry_run(args.dry_run)
            .with_include_empty(self.include_empty || args.include_empty)
            .with_walker_config(walker)
            .with_buffer_size(self.buffer_size)
    }

    /// EPUB renamer using the configured extensions.
    #[must_use]
    pub fn renamer(&self) -> Renamer {
        Renamer::new(
            Box::new(EpubMetadata),
            self.book_extension.clone(),
            self.sidecar_extension.clone(),
        )
    }

    fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            bail!("buffer_size must be greater than zero");
        }
        if self.book_extension.trim_start_matches('.').is_empty() {
            bail!("book_extension must not be empty");
        }
        if self.sidecar_extension.trim_start_matches('.').is_empty() {
            bail!("sidecar_extension must not be empty");
        }
        Ok(())
    }
}
