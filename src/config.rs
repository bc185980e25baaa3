//! Parcel manifest configuration (ambient stack addition): a `toml` file
//! describing one parcel's self-path, its ordered dep-names (each mapped
//! to the path of some other bound parcel, or left pointing at a path to
//! be imported fresh), and the relative paths of its declaration-syntax
//! source files. Grounded on `bsharp_cli`'s project-manifest loading
//! pattern, using the same `serde` + `toml` combination.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::compiler::Compiler;
use crate::errors::{Result, YamaError};
use crate::model::{ModuleInfo, ParcelMeta};

/// One entry of a manifest's `[deps]` table: the local dep-name used in
/// source text, mapped to the path of the parcel it denotes.
#[derive(Debug, Clone, Deserialize)]
pub struct DepEntry {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParcelManifest {
    /// The path this parcel will be bound at.
    pub path: String,
    #[serde(default)]
    pub deps: Vec<DepEntry>,
    /// Source files, relative to the manifest's own directory.
    pub sources: Vec<PathBuf>,
}

impl ParcelManifest {
    pub fn load(manifest_path: &Path) -> Result<Self> {
        let text = fs::read_to_string(manifest_path)
            .map_err(|e| YamaError::internal(format!("reading manifest `{}`: {e}", manifest_path.display())))?;
        toml::from_str(&text).map_err(|e| YamaError::internal(format!("parsing manifest `{}`: {e}", manifest_path.display())))
    }

    /// Dep-names this manifest declares, for constructing the bound
    /// parcel's [`ParcelMeta`] (spec.md §3).
    pub fn dep_names(&self) -> Vec<String> {
        self.deps.iter().map(|d| d.name.clone()).collect()
    }

    pub fn dep_paths(&self) -> HashMap<String, String> {
        self.deps.iter().map(|d| (d.name.clone(), d.path.clone())).collect()
    }
}

/// Everything needed to bind the parcel a manifest describes: the
/// compiled module, the [`ParcelMeta`] built from its dep-names, and any
/// import statements its source named (for the caller to follow).
pub struct CompiledManifest {
    pub manifest: ParcelManifest,
    pub module: ModuleInfo,
    pub meta: ParcelMeta,
    pub imports: Vec<String>,
}

/// Reads every source file named by `manifest_path`, compiling them into
/// one [`ModuleInfo`].
pub fn compile_manifest(manifest_path: &Path) -> Result<CompiledManifest> {
    let manifest = ParcelManifest::load(manifest_path)?;
    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let mut sources = Vec::new();
    for rel in &manifest.sources {
        let full = base_dir.join(rel);
        let text = fs::read_to_string(&full)
            .map_err(|e| YamaError::internal(format!("reading source `{}`: {e}", full.display())))?;
        sources.push((rel.display().to_string(), text));
    }

    let compiled = Compiler::new().compile_parcel(&sources)?;
    let meta = ParcelMeta::new(manifest.dep_names());
    Ok(CompiledManifest {
        manifest,
        module: compiled.module,
        meta,
        imports: compiled.imports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_and_compiles_manifest() {
        let dir = std::env::temp_dir().join(format!("yama-config-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let src_path = dir.join("main.yama");
        fs::write(&src_path, "struct S {\n    fn get() -> yama:Int;\n}\n").unwrap();

        let manifest_path = dir.join("parcel.toml");
        let mut f = fs::File::create(&manifest_path).unwrap();
        writeln!(f, "path = \"p\"").unwrap();
        writeln!(f, "sources = [\"main.yama\"]").unwrap();
        writeln!(f, "[[deps]]").unwrap();
        writeln!(f, "name = \"util\"").unwrap();
        writeln!(f, "path = \"p/util\"").unwrap();
        drop(f);

        let compiled = compile_manifest(&manifest_path).unwrap();
        assert_eq!(compiled.manifest.path, "p");
        assert!(compiled.module.by_name("S").is_some());
        assert!(compiled.imports.is_empty());
        assert_eq!(compiled.meta.dep_names, vec!["util".to_string()]);

        fs::remove_dir_all(&dir).ok();
    }
}
