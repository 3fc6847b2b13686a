// src/pipeline/write.rs

//! Output phase of a unit run.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use blake3::Hasher;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::paths::normalize::normalize_pattern;
use crate::pipeline::Asset;

/// One output file of a unit run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    /// Path relative to the output root, with forward slashes.
    pub rel_path: String,
    /// blake3 hex digest of the contents.
    pub hash: String,
    /// False when the file on disk already had these exact contents.
    pub changed: bool,
}

/// Everything a unit run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputManifest {
    pub unit: String,
    pub files: Vec<WrittenFile>,
}

impl OutputManifest {
    pub fn changed(&self) -> impl Iterator<Item = &WrittenFile> {
        self.files.iter().filter(|f| f.changed)
    }

    pub fn any_changed(&self) -> bool {
        self.files.iter().any(|f| f.changed)
    }
}

pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

/// Write `assets` below `output_root/out_dir`.
///
/// All destination paths are checked before the first write. Each file is
/// replaced atomically through a temp file in its target directory, and files
/// whose contents are already up to date are left untouched.
pub fn write_outputs(
    unit: &str,
    output_root: &Path,
    out_dir: &str,
    assets: &[Asset],
) -> Result<OutputManifest> {
    let mut planned: Vec<(String, PathBuf, &Asset)> = Vec::with_capacity(assets.len());
    let mut seen = BTreeSet::new();

    for asset in assets {
        let rel_in_unit = normalize_pattern(&asset.path);
        if rel_in_unit.is_empty() || rel_in_unit.split('/').any(|s| s == "..") {
            bail!("output path '{}' escapes the unit output directory", asset.path);
        }
        let rel_path = normalize_pattern(&format!("{out_dir}/{rel_in_unit}"));
        if !seen.insert(rel_path.clone()) {
            bail!("two assets would both be written to '{rel_path}'");
        }
        planned.push((rel_path.clone(), output_root.join(&rel_path), asset));
    }

    let mut files = Vec::with_capacity(planned.len());
    for (rel_path, target, asset) in planned {
        let hash = content_hash(&asset.contents);
        let changed = !matches_on_disk(&target, &hash);
        if changed {
            write_atomic(&target, &asset.contents)?;
            debug!(unit, file = %rel_path, "wrote output");
        } else {
            debug!(unit, file = %rel_path, "output unchanged");
        }
        files.push(WrittenFile {
            rel_path,
            hash,
            changed,
        });
    }

    Ok(OutputManifest {
        unit: unit.to_string(),
        files,
    })
}

fn matches_on_disk(target: &Path, hash: &str) -> bool {
    match fs::read(target) {
        Ok(existing) => content_hash(&existing) == hash,
        Err(_) => false,
    }
}

fn write_atomic(target: &Path, contents: &[u8]) -> Result<()> {
    let dir = target
        .parent()
        .with_context(|| format!("output path {:?} has no parent directory", target))?;
    fs::create_dir_all(dir).with_context(|| format!("creating output directory {:?}", dir))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {:?}", dir))?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target)
        .map_err(|e| e.error)
        .with_context(|| format!("replacing {:?}", target))?;
    Ok(())
}
