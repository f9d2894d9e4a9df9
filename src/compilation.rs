//! Compilation State - One Run of the Pipeline
//!
//! A `Compilation` owns the asset registry and the process-assets taps
//! registered for this run. The registry is additive: hooks can insert and
//! read assets but never replace or remove what another producer emitted.

use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::manifest::ManifestError;

/// Ordered stages for process-assets taps.
///
/// Taps run sorted by [`order`](Self::order) ascending; taps sharing a stage
/// run in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessAssetsStage {
    /// Add additional assets to the compilation (static copies land here).
    Additional,
    /// Basic preprocessing of already-present assets.
    PreProcess,
    /// Default position for taps with no ordering needs.
    None,
    /// Size optimization; minimizers would run here.
    OptimizeSize,
    /// Development tooling such as source maps.
    DevTooling,
    /// Summarize the asset set: runs after other producers have added
    /// their assets, before the set is considered closed. The manifest
    /// generator taps here.
    Summarize,
    /// Reporting over the final asset set.
    Report,
}

impl ProcessAssetsStage {
    /// Ordering value for this stage.
    pub const fn order(self) -> i32 {
        match self {
            Self::Additional => -2000,
            Self::PreProcess => -1000,
            Self::None => 0,
            Self::OptimizeSize => 400,
            Self::DevTooling => 500,
            Self::Summarize => 1000,
            Self::Report => 5000,
        }
    }
}

/// In-memory content of a named output artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSource(Vec<u8>);

impl RawSource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for RawSource {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl From<&str> for RawSource {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for RawSource {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

/// Build-fatal error: aborts the whole compilation run.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("entry point not found: {}", .path.display())]
    MissingEntry { path: PathBuf },

    #[error("copy source not found: {}", .path.display())]
    MissingCopySource { path: PathBuf },

    #[error("asset {name:?} already exists in this compilation")]
    DuplicateAsset { name: String },

    #[error("manifest generation failed: {0}")]
    Manifest(#[from] ManifestError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to write asset {name:?}: {source}")]
    Persist {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Additive asset registry owned by the compilation.
///
/// Keys are output-relative names (`/`-separated); values are the bytes the
/// host persists at the end of the run. Insertion is the only mutation
/// exposed, and a duplicate name is a build-fatal error.
#[derive(Debug, Default)]
pub struct Assets {
    entries: BTreeMap<String, RawSource>,
}

impl Assets {
    /// Insert a named asset. Fails if the name is already taken.
    pub fn emit(&mut self, name: impl Into<String>, source: RawSource) -> Result<(), BuildError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(BuildError::DuplicateAsset { name });
        }
        self.entries.insert(name, source);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&RawSource> {
        self.entries.get(name)
    }

    /// Asset names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawSource)> {
        self.entries.iter().map(|(name, source)| (name.as_str(), source))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct ProcessAssetsTap {
    name: &'static str,
    stage: ProcessAssetsStage,
    callback: Box<dyn FnMut(&mut Assets) -> Result<(), BuildError>>,
}

/// One run of the build pipeline producing an output asset set.
pub struct Compilation {
    pub id: Uuid,
    assets: Assets,
    taps: Vec<ProcessAssetsTap>,
    /// Error messages aggregated from failed hooks, in occurrence order.
    pub errors: Vec<String>,
}

impl Compilation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            assets: Assets::default(),
            taps: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Register a process-assets callback at the given stage.
    pub fn tap_process_assets<F>(&mut self, name: &'static str, stage: ProcessAssetsStage, callback: F)
    where
        F: FnMut(&mut Assets) -> Result<(), BuildError> + 'static,
    {
        self.taps.push(ProcessAssetsTap {
            name,
            stage,
            callback: Box::new(callback),
        });
    }

    /// Run every registered tap in stage order.
    ///
    /// The first failing tap aborts the run; its message is recorded in
    /// [`errors`](Self::errors) and the error is returned. Taps are consumed:
    /// the host fires this once per compilation.
    pub fn run_process_assets(&mut self) -> Result<(), BuildError> {
        let mut taps = std::mem::take(&mut self.taps);
        taps.sort_by_key(|tap| tap.stage.order());
        for tap in &mut taps {
            tracing::debug!(plugin = tap.name, stage = ?tap.stage, "running process-assets tap");
            if let Err(err) = (tap.callback)(&mut self.assets) {
                self.errors.push(format!("{}: {}", tap.name, err));
                return Err(err);
            }
        }
        Ok(())
    }

    /// Host-side emission, used to seed the entry chunk.
    pub fn emit_asset(&mut self, name: impl Into<String>, source: RawSource) -> Result<(), BuildError> {
        self.assets.emit(name, source)
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }
}

impl Default for Compilation {
    fn default() -> Self {
        Self::new()
    }
}
