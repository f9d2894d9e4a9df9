//! Manifest Generator Plugin
//!
//! Reads the module manifest template, substitutes the version token,
//! forces the `version` field from the package descriptor, and emits the
//! result as a new asset at the summarize stage. The template is read fresh
//! on every compilation; a read or parse failure is build-fatal and emits
//! nothing.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::compilation::{ProcessAssetsStage, RawSource};
use crate::compiler::Compiler;
use crate::plugin::Plugin;

/// Literal marker in the template text, replaced with the resolved version.
pub const VERSION_TOKEN: &str = "{{version}}";

/// Options for [`ManifestPlugin`], merged once at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestOptions {
    /// Template document path, relative to the project root.
    #[serde(default = "default_src_file")]
    pub src_file: PathBuf,
    /// Output-relative name of the generated asset.
    #[serde(default = "default_output_file")]
    pub output_file: String,
}

fn default_src_file() -> PathBuf {
    PathBuf::from("src/js/module.tmpl.json")
}

fn default_output_file() -> String {
    "module.json".to_string()
}

impl Default for ManifestOptions {
    fn default() -> Self {
        Self {
            src_file: default_src_file(),
            output_file: default_output_file(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest template {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest template {} is not valid JSON after substitution: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest template {} is not a JSON object", .path.display())]
    NotAnObject { path: PathBuf },

    #[error("failed to serialize generated manifest: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Substitute every occurrence of [`VERSION_TOKEN`] and force the `version`
/// field.
///
/// The explicit field assignment is the binding guarantee: the output's
/// `version` equals `version` even when the template spelled something else
/// or contained no token at all. Output is compact JSON in template field
/// order.
pub fn render_manifest(raw: &str, path: &Path, version: &str) -> Result<String, ManifestError> {
    let substituted = raw.replace(VERSION_TOKEN, version);
    let mut document: serde_json::Value =
        serde_json::from_str(&substituted).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    let object = document.as_object_mut().ok_or_else(|| ManifestError::NotAnObject {
        path: path.to_path_buf(),
    })?;
    object.insert(
        "version".to_string(),
        serde_json::Value::String(version.to_string()),
    );
    serde_json::to_string(&document).map_err(ManifestError::Serialize)
}

/// Read the template from disk and render it.
pub fn generate_manifest(src_file: &Path, version: &str) -> Result<String, ManifestError> {
    let raw = fs::read_to_string(src_file).map_err(|source| ManifestError::Read {
        path: src_file.to_path_buf(),
        source,
    })?;
    render_manifest(&raw, src_file, version)
}

/// Build plugin emitting the versioned module manifest.
pub struct ManifestPlugin {
    options: ManifestOptions,
}

impl ManifestPlugin {
    pub fn new(options: ManifestOptions) -> Self {
        Self { options }
    }
}

impl Default for ManifestPlugin {
    fn default() -> Self {
        Self::new(ManifestOptions::default())
    }
}

impl Plugin for ManifestPlugin {
    fn name(&self) -> &'static str {
        "ManifestPlugin"
    }

    /// Subscribe only; no I/O happens until the summarize stage fires.
    fn apply(&self, compiler: &mut Compiler) {
        let name = self.name();
        let src_file = compiler.root().join(&self.options.src_file);
        let output_file = self.options.output_file.clone();
        let version = compiler.package().version.clone();
        compiler.tap_this_compilation(name, move |compilation| {
            let src_file = src_file.clone();
            let output_file = output_file.clone();
            let version = version.clone();
            compilation.tap_process_assets(name, ProcessAssetsStage::Summarize, move |assets| {
                let rendered = generate_manifest(&src_file, &version)?;
                tracing::debug!(asset = %output_file, %version, "generated module manifest");
                assets.emit(output_file.clone(), RawSource::from(rendered))
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmpl_path() -> PathBuf {
        PathBuf::from("module.tmpl.json")
    }

    #[test]
    fn version_field_forced_without_token() {
        let raw = r#"{"name":"x","version":"0.0.0"}"#;
        let out = render_manifest(raw, &tmpl_path(), "4.5.6").unwrap();
        assert_eq!(out, r#"{"name":"x","version":"4.5.6"}"#);
    }

    #[test]
    fn every_token_occurrence_replaced() {
        let raw = r#"{"name":"x","version":"{{version}}","url":"https://host/v{{version}}/x.zip","notes":"{{version}} build"}"#;
        let out = render_manifest(raw, &tmpl_path(), "2.0.0").unwrap();
        assert!(!out.contains(VERSION_TOKEN));
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["url"], "https://host/v2.0.0/x.zip");
        assert_eq!(doc["notes"], "2.0.0 build");
    }

    #[test]
    fn minimal_template_scenario() {
        let raw = r#"{"name":"x","version":"{{version}}"}"#;
        let out = render_manifest(raw, &tmpl_path(), "2.3.1").unwrap();
        assert_eq!(out, r#"{"name":"x","version":"2.3.1"}"#);
    }

    #[test]
    fn override_and_substitution_land_on_same_value() {
        let raw = r#"{"name":"x","version":"0.0.0","build":"{{version}}"}"#;
        let out = render_manifest(raw, &tmpl_path(), "9.9.9").unwrap();
        assert_eq!(out, r#"{"name":"x","version":"9.9.9","build":"9.9.9"}"#);
    }

    #[test]
    fn render_is_idempotent() {
        let raw = r#"{"name":"x","version":"{{version}}","build":"{{version}}"}"#;
        let first = render_manifest(raw, &tmpl_path(), "1.2.3").unwrap();
        let second = render_manifest(raw, &tmpl_path(), "1.2.3").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn substitution_breaking_quoting_is_a_parse_error() {
        // The token sits outside a string, so the substituted text is not JSON.
        let raw = r#"{"version": {{version}}}"#;
        let err = render_manifest(raw, &tmpl_path(), "1.2.3").unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn non_object_template_rejected() {
        let raw = r#"["{{version}}"]"#;
        let err = render_manifest(raw, &tmpl_path(), "1.2.3").unwrap_err();
        assert!(matches!(err, ManifestError::NotAnObject { .. }));
    }

    #[test]
    fn missing_template_is_a_read_error() {
        let err = generate_manifest(Path::new("does/not/exist.tmpl.json"), "1.0.0").unwrap_err();
        assert!(matches!(err, ManifestError::Read { .. }));
    }
}
