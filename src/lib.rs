//! ModForge Core - Module Build Pipeline
//!
//! Builds browser-extension style script modules. One compilation bundles
//! the entry chunk, copies static assets, generates the versioned
//! `module.json` manifest, and persists the collected assets.
//!
//! # The Three Guarantees (Non-Negotiable)
//! 1. The generated manifest's `version` equals the package version, always
//! 2. Assets flow only through the compilation's additive registry
//! 3. A failed hook aborts the whole build; nothing partial is emitted

pub mod compilation;
pub mod compiler;
pub mod config;
pub mod copy;
pub mod hashing;
pub mod manifest;
pub mod plugin;

pub use compilation::{Assets, BuildError, Compilation, ProcessAssetsStage, RawSource};
pub use compiler::{AssetStat, BuildStats, Compiler};
pub use config::{BuildConfig, BuildMode, ConfigError, Devtool, PackageInfo};
pub use copy::{CopyPattern, CopyPlugin};
pub use manifest::{ManifestError, ManifestOptions, ManifestPlugin, VERSION_TOKEN};
pub use plugin::Plugin;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
