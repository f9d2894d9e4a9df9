//! Static Asset Copying
//!
//! Emits configured files into the asset registry at the additional stage,
//! so copies are present before asset-summarizing plugins run. Persistence
//! to disk stays with the host, like every other asset.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::compilation::{Assets, BuildError, ProcessAssetsStage, RawSource};
use crate::compiler::Compiler;
use crate::plugin::Plugin;

/// One copy mapping: filesystem source to output-relative destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyPattern {
    pub from: PathBuf,
    pub to: String,
}

impl CopyPattern {
    pub fn new(from: impl Into<PathBuf>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Build plugin copying static files into the compilation.
pub struct CopyPlugin {
    patterns: Vec<CopyPattern>,
}

impl CopyPlugin {
    pub fn new(patterns: Vec<CopyPattern>) -> Self {
        Self { patterns }
    }
}

impl Plugin for CopyPlugin {
    fn name(&self) -> &'static str {
        "CopyPlugin"
    }

    fn apply(&self, compiler: &mut Compiler) {
        let name = self.name();
        let root = compiler.root().to_path_buf();
        let patterns = self.patterns.clone();
        compiler.tap_this_compilation(name, move |compilation| {
            let root = root.clone();
            let patterns = patterns.clone();
            compilation.tap_process_assets(name, ProcessAssetsStage::Additional, move |assets| {
                for pattern in &patterns {
                    copy_pattern(&root, pattern, assets)?;
                }
                Ok(())
            });
        });
    }
}

/// A file source emits one asset named `to`; a directory source is walked
/// recursively, each file landing under `to/<relative path>`. A missing
/// source is build-fatal.
fn copy_pattern(root: &Path, pattern: &CopyPattern, assets: &mut Assets) -> Result<(), BuildError> {
    let src = root.join(&pattern.from);
    if !src.exists() {
        return Err(BuildError::MissingCopySource { path: src });
    }
    if src.is_dir() {
        copy_dir(&src, &pattern.to, assets)
    } else {
        let bytes = fs::read(&src).map_err(|err| BuildError::Io {
            path: src.clone(),
            source: err,
        })?;
        assets.emit(pattern.to.clone(), RawSource::from(bytes))
    }
}

fn copy_dir(dir: &Path, prefix: &str, assets: &mut Assets) -> Result<(), BuildError> {
    let read_dir = fs::read_dir(dir).map_err(|err| BuildError::Io {
        path: dir.to_path_buf(),
        source: err,
    })?;
    let mut entries = Vec::new();
    for entry in read_dir {
        entries.push(entry.map_err(|err| BuildError::Io {
            path: dir.to_path_buf(),
            source: err,
        })?);
    }
    // Deterministic emission order regardless of the directory listing.
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let asset_name = format!("{}/{}", prefix, entry.file_name().to_string_lossy());
        if path.is_dir() {
            copy_dir(&path, &asset_name, assets)?;
        } else {
            let bytes = fs::read(&path).map_err(|err| BuildError::Io {
                path: path.clone(),
                source: err,
            })?;
            assets.emit(asset_name, RawSource::from(bytes))?;
        }
    }
    Ok(())
}
