// src/pipeline/steps/js.rs

use anyhow::{Context, anyhow, bail};
use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{Minifier, MinifierOptions};
use oxc_parser::{Parser, ParserReturn};
use oxc_span::SourceType;

use crate::pipeline::{Asset, StepContext, StepFuture, Transform, blocking};

/// Minify `.js` assets with the oxc parser, minifier and code generator.
#[derive(Debug, Clone, Default)]
pub struct MinifyJsStep;

impl Transform for MinifyJsStep {
    fn name(&self) -> &'static str {
        "minify-js"
    }

    fn apply<'a>(&'a self, _ctx: &'a StepContext, assets: Vec<Asset>) -> StepFuture<'a> {
        Box::pin(blocking(move || {
            assets
                .into_iter()
                .map(|mut asset| -> anyhow::Result<Asset> {
                    if asset.extension().as_deref() == Some("js") {
                        let code = minify(asset.text()?)
                            .with_context(|| format!("minifying {}", asset.path))?;
                        asset.contents = code.into_bytes();
                    }
                    Ok(asset)
                })
                .collect()
        }))
    }
}

/// Browser scripts are parsed as classic scripts, not modules.
fn minify(source: &str) -> anyhow::Result<String> {
    let allocator = Allocator::default();
    let ParserReturn {
        mut program,
        errors,
        panicked,
        ..
    } = Parser::new(&allocator, source, SourceType::cjs()).parse();

    if panicked || !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        if messages.is_empty() {
            bail!("parser aborted");
        }
        return Err(anyhow!("syntax error: {}", messages.join("; ")));
    }

    let ret = Minifier::new(MinifierOptions::default()).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions::minify())
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}
