// src/pipeline/steps/command.rs

use std::process::Stdio;

use anyhow::{Context, bail};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::pipeline::{Asset, StepContext, StepFuture, Transform};

/// Pipe assets through an external program (stdin -> stdout).
///
/// Used for image compressors such as `cjpeg`, `pngquant -`, `svgo -i - -o -`
/// or `gifsicle`. Assets whose extension is not listed pass through.
#[derive(Debug, Clone)]
pub struct CommandStep {
    program: String,
    args: Vec<String>,
    extensions: Vec<String>,
}

impl CommandStep {
    pub fn new(program: impl Into<String>, args: Vec<String>, extensions: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            extensions: extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    fn applies_to(&self, asset: &Asset) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        asset
            .extension()
            .is_some_and(|ext| self.extensions.contains(&ext))
    }

    async fn pipe(&self, input: Vec<u8>) -> anyhow::Result<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning '{}'", self.program))?;

        let mut stdin = child
            .stdin
            .take()
            .context("child stdin was not captured")?;
        let writer = tokio::spawn(async move {
            match stdin.write_all(&input).await {
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            }
        });

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("waiting for '{}'", self.program))?;
        writer
            .await
            .context("stdin writer panicked")?
            .with_context(|| format!("writing to '{}'", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }
        Ok(output.stdout)
    }
}

impl Transform for CommandStep {
    fn name(&self) -> &'static str {
        "command"
    }

    fn apply<'a>(&'a self, ctx: &'a StepContext, assets: Vec<Asset>) -> StepFuture<'a> {
        Box::pin(async move {
            let mut out = Vec::with_capacity(assets.len());
            for mut asset in assets {
                if self.applies_to(&asset) {
                    debug!(unit = %ctx.unit, program = %self.program, asset = %asset.path, "piping asset");
                    let input = std::mem::take(&mut asset.contents);
                    asset.contents = self
                        .pipe(input)
                        .await
                        .with_context(|| format!("processing {}", asset.path))?;
                }
                out.push(asset);
            }
            Ok(out)
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn ctx() -> StepContext {
        StepContext {
            unit: "images".into(),
            source_root: std::env::temp_dir(),
        }
    }

    #[tokio::test]
    async fn pipes_matching_extensions_only() {
        let step = CommandStep::new("tr", vec!["a-z".into(), "A-Z".into()], vec![".svg".into()]);
        let out = step
            .apply(
                &ctx(),
                vec![Asset::new("logo.svg", "<svg/>"), Asset::new("a.png", "png")],
            )
            .await
            .unwrap();
        assert_eq!(out[0].text().unwrap(), "<SVG/>");
        assert_eq!(out[1].text().unwrap(), "png");
    }

    #[tokio::test]
    async fn non_zero_exit_fails() {
        let step = CommandStep::new("false", vec![], vec![]);
        assert!(step.apply(&ctx(), vec![Asset::new("a.gif", "x")]).await.is_err());
    }
}
