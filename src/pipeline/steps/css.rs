// src/pipeline/steps/css.rs

use anyhow::{Context, anyhow};
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::pipeline::{Asset, StepContext, StepFuture, Transform, blocking};

/// Minify and vendor-prefix `.css` assets with `lightningcss`.
#[derive(Debug, Clone)]
pub struct CssStep {
    minify: bool,
    targets: Option<Browsers>,
}

impl CssStep {
    /// `targets` are browserslist queries such as `"last 10 versions"`.
    pub fn new(minify: bool, targets: &[String]) -> anyhow::Result<Self> {
        let targets = if targets.is_empty() {
            None
        } else {
            Browsers::from_browserslist(targets.iter().map(String::as_str))
                .map_err(|e| anyhow!("invalid browser targets {targets:?}: {e}"))?
        };
        Ok(Self { minify, targets })
    }
}

impl Transform for CssStep {
    fn name(&self) -> &'static str {
        "css"
    }

    fn apply<'a>(&'a self, _ctx: &'a StepContext, assets: Vec<Asset>) -> StepFuture<'a> {
        let step = self.clone();
        Box::pin(blocking(move || {
            assets
                .into_iter()
                .map(|mut asset| -> anyhow::Result<Asset> {
                    if asset.extension().as_deref() == Some("css") {
                        let code = step
                            .process(&asset.path, asset.text()?)
                            .with_context(|| format!("processing {}", asset.path))?;
                        asset.contents = code.into_bytes();
                    }
                    Ok(asset)
                })
                .collect()
        }))
    }
}

impl CssStep {
    fn process(&self, filename: &str, source: &str) -> anyhow::Result<String> {
        let targets = self.targets.map(Targets::from).unwrap_or_default();

        let mut stylesheet = StyleSheet::parse(
            source,
            ParserOptions {
                filename: filename.to_string(),
                ..Default::default()
            },
        )
        .map_err(|e| anyhow!("parse error: {e}"))?;

        stylesheet
            .minify(MinifyOptions {
                targets,
                ..Default::default()
            })
            .map_err(|e| anyhow!("minify error: {e}"))?;

        let result = stylesheet
            .to_css(PrinterOptions {
                minify: self.minify,
                targets,
                ..Default::default()
            })
            .map_err(|e| anyhow!("print error: {e}"))?;

        Ok(result.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> StepContext {
        StepContext {
            unit: "styles".into(),
            source_root: std::env::temp_dir(),
        }
    }

    #[tokio::test]
    async fn minifies_css_and_skips_other_assets() {
        let step = CssStep::new(true, &[]).unwrap();
        let out = step
            .apply(
                &ctx(),
                vec![
                    Asset::new("a.css", ".a {\n  color: #ff0000;\n}\n"),
                    Asset::new("notes.txt", "keep  me"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(out[0].text().unwrap(), ".a{color:red}");
        assert_eq!(out[1].text().unwrap(), "keep  me");
    }

    #[tokio::test]
    async fn old_browser_targets_add_prefixes() {
        let step = CssStep::new(true, &["safari 4".to_string()]).unwrap();
        let out = step
            .apply(&ctx(), vec![Asset::new("a.css", ".a { user-select: none; }")])
            .await
            .unwrap();
        assert!(out[0].text().unwrap().contains("-webkit-user-select"));
    }

    #[test]
    fn invalid_targets_are_rejected() {
        assert!(CssStep::new(true, &["wat 1".to_string()]).is_err());
    }
}
