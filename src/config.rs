//! Build Configuration - Project Settings and Environment
//!
//! Layering: compiled defaults, then `modforge.config.json` at the project
//! root when present. The build mode comes from the `NODE_ENV` environment
//! variable; the development output directory honors an optional
//! `.devDomain` override file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::copy::CopyPattern;
use crate::manifest::ManifestOptions;

/// Project config file name, resolved against the project root.
pub const CONFIG_FILE: &str = "modforge.config.json";

/// Project package descriptor, the single source of truth for name/version.
pub const PACKAGE_FILE: &str = "package.json";

/// Optional override file naming the deployment-target subdirectory used by
/// development builds.
pub const DEV_DOMAIN_FILE: &str = ".devDomain";

const DEFAULT_DEV_DOMAIN: &str = "localhost";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read package descriptor {}: {source}", .path.display())]
    PackageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid package descriptor {}: {source}", .path.display())]
    PackageParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("package version {version:?} is not valid semver: {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("failed to read build config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid build config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Build mode selected by the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    /// Production iff the value is exactly `"production"`.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("production") => Self::Production,
            _ => Self::Development,
        }
    }

    /// Resolve the mode from `NODE_ENV`.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var("NODE_ENV").ok().as_deref())
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Source-map emission setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Devtool {
    None,
    SourceMap,
}

impl Default for Devtool {
    fn default() -> Self {
        Self::SourceMap
    }
}

/// Authoritative project metadata: one `version` per build invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
}

impl PackageInfo {
    /// Load `<root>/package.json`. Missing file, invalid JSON, or a
    /// non-semver version is fatal before any compilation starts.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(PACKAGE_FILE);
        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::PackageRead {
            path: path.clone(),
            source,
        })?;
        let info: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::PackageParse {
            path: path.clone(),
            source,
        })?;
        semver::Version::parse(&info.version).map_err(|source| ConfigError::InvalidVersion {
            version: info.version.clone(),
            source,
        })?;
        Ok(info)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    /// Name of the emitted entry chunk.
    #[serde(default = "default_filename")]
    pub filename: String,
}

fn default_filename() -> String {
    "main.js".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            filename: default_filename(),
        }
    }
}

/// Minification settings. The minifier itself is delegated to the host
/// toolchain; the resolved flag is logged and reported in build stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Optimization {
    /// Minify emitted chunks. Unset resolves to `mode == production`.
    #[serde(default)]
    pub minimize: Option<bool>,
    #[serde(default = "default_true")]
    pub keep_classnames: bool,
    #[serde(default = "default_true")]
    pub keep_fnames: bool,
}

fn default_true() -> bool {
    true
}

impl Optimization {
    pub fn resolved_minimize(&self, mode: BuildMode) -> bool {
        self.minimize.unwrap_or(mode == BuildMode::Production)
    }
}

impl Default for Optimization {
    fn default() -> Self {
        Self {
            minimize: None,
            keep_classnames: true,
            keep_fnames: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Script entry point, relative to the project root.
    #[serde(default = "default_entry")]
    pub entry: PathBuf,
    #[serde(default)]
    pub output: OutputConfig,
    /// Static files copied into the output tree.
    #[serde(default = "default_copy_patterns")]
    pub copy: Vec<CopyPattern>,
    #[serde(default)]
    pub manifest: ManifestOptions,
    #[serde(default)]
    pub optimization: Optimization,
    #[serde(default)]
    pub devtool: Devtool,
}

fn default_entry() -> PathBuf {
    PathBuf::from("src/js/index.js")
}

fn default_copy_patterns() -> Vec<CopyPattern> {
    vec![
        CopyPattern::new("src/lang", "lang"),
        CopyPattern::new("src/templates", "templates"),
        CopyPattern::new("LICENSE", "LICENSE"),
        CopyPattern::new("src/style.css", "style.css"),
    ]
}

impl BuildConfig {
    /// Load `<root>/modforge.config.json` when present, else defaults.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::ConfigRead {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::ConfigParse { path, source })
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            entry: default_entry(),
            output: OutputConfig::default(),
            copy: default_copy_patterns(),
            manifest: ManifestOptions::default(),
            optimization: Optimization::default(),
            devtool: Devtool::default(),
        }
    }
}

/// Resolve where the host persists this build's assets.
///
/// Production builds land in `<root>/dist`; development builds land in the
/// deployment-target override tree so a running host picks them up without
/// an install step. The generated assets themselves are indifferent to this
/// path.
pub fn resolve_output_dir(root: &Path, mode: BuildMode, package: &PackageInfo) -> PathBuf {
    match mode {
        BuildMode::Production => root.join("dist"),
        BuildMode::Development => root
            .join("chrome-overrides")
            .join(dev_domain(root))
            .join("modules")
            .join(&package.name),
    }
}

/// Contents of `.devDomain`, whitespace-trimmed; `localhost` when absent
/// or empty.
fn dev_domain(root: &Path) -> String {
    match fs::read_to_string(root.join(DEV_DOMAIN_FILE)) {
        Ok(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                DEFAULT_DEV_DOMAIN.to_string()
            } else {
                trimmed.to_string()
            }
        }
        Err(_) => DEFAULT_DEV_DOMAIN.to_string(),
    }
}
