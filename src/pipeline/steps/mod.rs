// src/pipeline/steps/mod.rs

//! Built-in [`Transform`] implementations, one per `kind` of
//! [`StepConfig`].

pub mod command;
pub mod css;
pub mod files;
pub mod include;
pub mod js;
pub mod scss;

pub use command::CommandStep;
pub use css::CssStep;
pub use files::{ConcatStep, RenameStep};
pub use include::IncludeStep;
pub use js::MinifyJsStep;
pub use scss::ScssStep;

use crate::config::model::StepConfig;
use crate::pipeline::Transform;

/// Instantiate the transform for one configured step.
pub fn build_step(cfg: &StepConfig) -> anyhow::Result<Box<dyn Transform>> {
    let step: Box<dyn Transform> = match cfg {
        StepConfig::Include { prefix, basepath } => Box::new(IncludeStep::new(prefix, basepath)?),
        StepConfig::Scss { style } => Box::new(ScssStep::new(*style)),
        StepConfig::Css { minify, targets } => Box::new(CssStep::new(*minify, targets)?),
        StepConfig::Concat { file, separator } => {
            Box::new(ConcatStep::new(file.clone(), separator.clone()))
        }
        StepConfig::MinifyJs => Box::new(MinifyJsStep),
        StepConfig::Rename { file } => Box::new(RenameStep::new(file.clone())),
        StepConfig::Command {
            program,
            args,
            extensions,
        } => Box::new(CommandStep::new(
            program.clone(),
            args.clone(),
            extensions.clone(),
        )),
    };
    Ok(step)
}
