//! Parsing and validation for rewrites.toml configuration files

use crate::classpath::TypeTable;
use crate::engine::{FileWalker, RewriteEngine};
use crate::error::{ConfigError, RewriteError};
use crate::recipes::RecipeRegistry;
use crate::types::{GlobPattern, RecipeName};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Main configuration struct for rewrites.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Which sources to rewrite and which recipes to run
    pub rewrites: RewritesMeta,

    /// Stub sources used for type attribution
    #[serde(default)]
    pub classpath: ClasspathConfig,

    /// Where to find declarative recipes besides the built-in ones
    #[serde(default)]
    pub recipes: RecipesConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.rewrites.version != "1" {
            return Err(ConfigError::Validation(format!(
                "Unsupported configuration version '{}'. Expected '1'",
                self.rewrites.version
            )));
        }

        if self.rewrites.recipes.is_empty() {
            return Err(ConfigError::Validation(
                "No recipes configured. Add recipe names to rewrites.toml to start rewriting.".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in &self.rewrites.recipes {
            if !seen.insert(name) {
                return Err(ConfigError::InvalidValue {
                    field: "rewrites.recipes".to_string(),
                    message: format!("recipe '{}' is listed more than once", name),
                });
            }
        }

        for (kind, patterns) in [("include", &self.rewrites.include), ("exclude", &self.rewrites.exclude)] {
            for pattern in patterns {
                globset::Glob::new(pattern.as_str()).map_err(|e| {
                    ConfigError::Validation(format!("Invalid {} glob pattern '{}': {}", kind, pattern.as_str(), e))
                })?;
            }
        }

        Ok(())
    }

    /// Builds the type table: the built-in stubs (unless disabled) plus every
    /// configured stub directory, resolved against `root`
    pub fn type_table(&self, root: &Path) -> Result<TypeTable, RewriteError> {
        let mut table = if self.classpath.builtin {
            TypeTable::builtin().map_err(|source| RewriteError::Parse {
                file: PathBuf::from("<builtin stubs>"),
                source,
            })?
        } else {
            TypeTable::new()
        };
        for dir in &self.classpath.paths {
            table.load_dir(&root.join(dir))?;
        }
        Ok(table)
    }

    /// Builds the recipe registry: built-in recipes plus the declarative
    /// recipes of every configured directory, resolved against `root`
    pub fn registry(&self, root: &Path) -> Result<RecipeRegistry, RewriteError> {
        let mut registry = RecipeRegistry::with_builtins()?;
        for dir in &self.recipes.custom {
            registry.load_declarative_dir(&root.join(dir))?;
        }
        Ok(registry)
    }

    /// Builds an engine running the configured recipes
    pub fn engine(&self, root: &Path) -> Result<RewriteEngine, RewriteError> {
        let classpath = Arc::new(self.type_table(root)?);
        let registry = self.registry(root)?;
        Ok(RewriteEngine::new(registry, self.rewrites.recipes.clone(), classpath)?)
    }

    /// Builds a walker over the configured sources under `root`
    pub fn walker(&self, root: &Path) -> Result<FileWalker, RewriteError> {
        Ok(FileWalker::new(root, &self.rewrites.include, &self.rewrites.exclude)?)
    }
}

/// `[rewrites]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewritesMeta {
    /// Configuration version (must be "1")
    pub version: String,

    /// File patterns to include
    #[serde(default = "default_include")]
    pub include: Vec<GlobPattern>,

    /// File patterns to exclude
    #[serde(default)]
    pub exclude: Vec<GlobPattern>,

    /// Recipes to run, in order
    #[serde(default)]
    pub recipes: Vec<RecipeName>,
}

fn default_include() -> Vec<GlobPattern> {
    vec![GlobPattern::new("**/*.java")]
}

/// `[classpath]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClasspathConfig {
    /// Load the embedded JDK and library stubs
    #[serde(default = "default_true")]
    pub builtin: bool,

    /// Directories of extra stub sources
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

impl Default for ClasspathConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            paths: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// `[recipes]` section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecipesConfig {
    /// Directories of declarative recipe files
    #[serde(default)]
    pub custom: Vec<PathBuf>,
}

/// Output configuration section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub color: ColorOption,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON Lines format
    Jsonl,
}

/// Color output options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorOption {
    /// Auto-detect based on terminal capabilities
    #[default]
    Auto,
    Always,
    Never,
}
