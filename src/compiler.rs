//! Compiler - Host Build Loop
//!
//! One `run` is one compilation: fire the compilation-created taps, seed
//! the entry chunk, run process-assets taps in stage order, persist the
//! registry to the mode-resolved output directory, and report stats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::compilation::{BuildError, Compilation, RawSource};
use crate::config::{
    resolve_output_dir, BuildConfig, BuildMode, ConfigError, Devtool, PackageInfo,
};
use crate::copy::CopyPlugin;
use crate::hashing::{sha256_hex, short_hash};
use crate::manifest::ManifestPlugin;
use crate::plugin::Plugin;
use crate::ENGINE_VERSION;

struct ThisCompilationTap {
    name: &'static str,
    callback: Box<dyn Fn(&mut Compilation)>,
}

/// The host build tool: owns configuration, package metadata, and plugin
/// subscriptions. Plugins register during construction; `run` drives one
/// compilation through to persisted output.
pub struct Compiler {
    root: PathBuf,
    config: BuildConfig,
    package: PackageInfo,
    mode: BuildMode,
    this_compilation_taps: Vec<ThisCompilationTap>,
}

impl Compiler {
    pub fn new(
        root: impl Into<PathBuf>,
        config: BuildConfig,
        package: PackageInfo,
        mode: BuildMode,
    ) -> Self {
        Self {
            root: root.into(),
            config,
            package,
            mode,
            this_compilation_taps: Vec::new(),
        }
    }

    /// Load configuration and package metadata from a project root and
    /// register the configured plugins.
    pub fn from_project(root: impl Into<PathBuf>, mode: BuildMode) -> Result<Self, ConfigError> {
        let root = root.into();
        let config = BuildConfig::load(&root)?;
        let package = PackageInfo::load(&root)?;
        let mut compiler = Self::new(root, config, package, mode);
        let copy = CopyPlugin::new(compiler.config.copy.clone());
        compiler.register(&copy);
        let manifest = ManifestPlugin::new(compiler.config.manifest.clone());
        compiler.register(&manifest);
        Ok(compiler)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn package(&self) -> &PackageInfo {
        &self.package
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Register a plugin by invoking its `apply` so it can subscribe to
    /// hooks. Registration performs no I/O.
    pub fn register(&mut self, plugin: &dyn Plugin) {
        tracing::debug!(plugin = plugin.name(), "registering plugin");
        plugin.apply(self);
    }

    /// Subscribe to compilation creation; fired once per `run`.
    pub fn tap_this_compilation<F>(&mut self, name: &'static str, callback: F)
    where
        F: Fn(&mut Compilation) + 'static,
    {
        self.this_compilation_taps.push(ThisCompilationTap {
            name,
            callback: Box::new(callback),
        });
    }

    /// Run one compilation and persist its assets.
    pub fn run(&self) -> Result<BuildStats, BuildError> {
        let mut compilation = Compilation::new();
        tracing::info!(id = %compilation.id, mode = %self.mode, "starting compilation");

        for tap in &self.this_compilation_taps {
            tracing::debug!(plugin = tap.name, "firing this-compilation tap");
            (tap.callback)(&mut compilation);
        }

        self.seed_entry(&mut compilation)?;

        let minimize = self.config.optimization.resolved_minimize(self.mode);
        tracing::debug!(
            minimize,
            keep_classnames = self.config.optimization.keep_classnames,
            keep_fnames = self.config.optimization.keep_fnames,
            "resolved optimization settings"
        );

        if let Err(err) = compilation.run_process_assets() {
            for message in &compilation.errors {
                tracing::error!(error = %message, "compilation error");
            }
            return Err(err);
        }

        let output_dir = resolve_output_dir(&self.root, self.mode, &self.package);
        self.persist(&compilation, &output_dir)?;

        Ok(BuildStats::collect(
            self,
            &compilation,
            &output_dir,
            minimize,
        ))
    }

    /// Seed the entry chunk (and its source-map companion when configured).
    /// The `sourceMappingURL` footer is part of the chunk's initial content,
    /// never a later mutation of an emitted asset.
    fn seed_entry(&self, compilation: &mut Compilation) -> Result<(), BuildError> {
        let entry = self.root.join(&self.config.entry);
        if !entry.exists() {
            return Err(BuildError::MissingEntry { path: entry });
        }
        let mut chunk = fs::read(&entry).map_err(|err| BuildError::Io {
            path: entry.clone(),
            source: err,
        })?;

        let filename = self.config.output.filename.clone();
        if self.config.devtool == Devtool::SourceMap {
            let map_name = format!("{filename}.map");
            let map = serde_json::json!({
                "version": 3,
                "file": filename,
                "sources": [self.config.entry.to_string_lossy()],
                "names": [],
                "mappings": "",
            });
            chunk.extend_from_slice(format!("\n//# sourceMappingURL={map_name}").as_bytes());
            compilation.emit_asset(map_name, RawSource::from(serde_json::to_string(&map)?))?;
        }
        compilation.emit_asset(filename, RawSource::from(chunk))
    }

    fn persist(&self, compilation: &Compilation, output_dir: &Path) -> Result<(), BuildError> {
        fs::create_dir_all(output_dir).map_err(|err| BuildError::Io {
            path: output_dir.to_path_buf(),
            source: err,
        })?;
        for (name, source) in compilation.assets().iter() {
            let target = output_dir.join(name);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|err| BuildError::Io {
                    path: parent.to_path_buf(),
                    source: err,
                })?;
            }
            fs::write(&target, source.as_bytes()).map_err(|err| BuildError::Persist {
                name: name.to_string(),
                source: err,
            })?;
            tracing::debug!(
                asset = name,
                size = source.len(),
                hash = %short_hash(source.as_bytes()),
                "wrote asset"
            );
        }
        tracing::info!(
            assets = compilation.assets().len(),
            output = %output_dir.display(),
            "persisted compilation"
        );
        Ok(())
    }
}

/// Serializable summary of one compilation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStats {
    pub compilation_id: Uuid,
    pub engine_version: String,
    pub package_name: String,
    pub package_version: String,
    pub mode: BuildMode,
    pub minimize: bool,
    pub output_dir: PathBuf,
    pub built_at: DateTime<Utc>,
    pub assets: Vec<AssetStat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetStat {
    pub name: String,
    pub size: usize,
    pub sha256: String,
}

impl BuildStats {
    fn collect(
        compiler: &Compiler,
        compilation: &Compilation,
        output_dir: &Path,
        minimize: bool,
    ) -> Self {
        let assets = compilation
            .assets()
            .iter()
            .map(|(name, source)| AssetStat {
                name: name.to_string(),
                size: source.len(),
                sha256: sha256_hex(source.as_bytes()),
            })
            .collect();
        Self {
            compilation_id: compilation.id,
            engine_version: ENGINE_VERSION.to_string(),
            package_name: compiler.package.name.clone(),
            package_version: compiler.package.version.clone(),
            mode: compiler.mode,
            minimize,
            output_dir: output_dir.to_path_buf(),
            built_at: Utc::now(),
            assets,
        }
    }
}
