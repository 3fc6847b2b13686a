// src/pipeline/steps/scss.rs

use std::path::PathBuf;

use anyhow::{Context, anyhow};

use crate::config::model::ScssStyle;
use crate::pipeline::{Asset, StepContext, StepFuture, Transform, blocking};

/// Compile `.scss` assets to `.css` with `grass`.
///
/// Partials (`_name.scss`) are only reachable through `@use`/`@import` and
/// are dropped from the asset list. Other assets pass through.
#[derive(Debug, Clone)]
pub struct ScssStep {
    style: ScssStyle,
}

impl ScssStep {
    pub fn new(style: ScssStyle) -> Self {
        Self { style }
    }
}

impl Transform for ScssStep {
    fn name(&self) -> &'static str {
        "scss"
    }

    fn apply<'a>(&'a self, ctx: &'a StepContext, assets: Vec<Asset>) -> StepFuture<'a> {
        let style = match self.style {
            ScssStyle::Compressed => grass::OutputStyle::Compressed,
            ScssStyle::Expanded => grass::OutputStyle::Expanded,
        };
        let source_root = ctx.source_root.clone();

        Box::pin(blocking(move || {
            let mut out = Vec::with_capacity(assets.len());
            for mut asset in assets {
                if asset.extension().as_deref() != Some("scss") {
                    out.push(asset);
                    continue;
                }
                if asset.file_name().starts_with('_') {
                    continue;
                }

                let load_dir: PathBuf = asset
                    .source
                    .as_deref()
                    .and_then(|p| p.parent())
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| source_root.clone());
                let options = grass::Options::default()
                    .style(style)
                    .load_path(&load_dir)
                    .load_path(&source_root);

                let src = asset.text()?.to_string();
                let css = grass::from_string(src, &options)
                    .map_err(|e| anyhow!("{e}"))
                    .with_context(|| format!("compiling {}", asset.path))?;

                asset.contents = css.into_bytes();
                asset.set_extension("css");
                out.push(asset);
            }
            Ok(out)
        }))
    }
}
