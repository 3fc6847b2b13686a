// src/pipeline/steps/files.rs

//! Steps that only reshape the asset list.

use anyhow::bail;

use crate::pipeline::{Asset, StepContext, StepFuture, Transform};

/// Join every asset into one file, in input order.
#[derive(Debug, Clone)]
pub struct ConcatStep {
    file: String,
    separator: String,
}

impl ConcatStep {
    pub fn new(file: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            separator: separator.into(),
        }
    }
}

impl Transform for ConcatStep {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn apply<'a>(&'a self, _ctx: &'a StepContext, assets: Vec<Asset>) -> StepFuture<'a> {
        Box::pin(async move {
            if assets.is_empty() {
                return Ok(Vec::new());
            }

            let mut contents = Vec::new();
            for (idx, asset) in assets.iter().enumerate() {
                if idx > 0 {
                    contents.extend_from_slice(self.separator.as_bytes());
                }
                contents.extend_from_slice(&asset.contents);
            }
            Ok(vec![Asset::new(self.file.clone(), contents)])
        })
    }
}

/// Give the single asset a new name.
#[derive(Debug, Clone)]
pub struct RenameStep {
    file: String,
}

impl RenameStep {
    pub fn new(file: impl Into<String>) -> Self {
        Self { file: file.into() }
    }
}

impl Transform for RenameStep {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn apply<'a>(&'a self, _ctx: &'a StepContext, mut assets: Vec<Asset>) -> StepFuture<'a> {
        Box::pin(async move {
            if assets.len() > 1 {
                bail!(
                    "rename to '{}' needs a single asset, got {}",
                    self.file,
                    assets.len()
                );
            }
            if let Some(asset) = assets.first_mut() {
                asset.path = self.file.clone();
            }
            Ok(assets)
        })
    }
}
