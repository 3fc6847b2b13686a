// src/config/defaults.rs

//! Built-in pipeline used when no config file exists.
//!
//! Layout (relative to `src/` and `dist/`):
//!
//! | category | source                         | build     | watch               |
//! |----------|--------------------------------|-----------|---------------------|
//! | html     | `*.html`                       | `.`       | `**/*.html`         |
//! | js       | `js/*.js`                      | `js`      | `js/**/*.js`        |
//! | css      | `scss/*.scss` or `css/style.min.css` | `css` | same tree as source |
//! | images   | `images/**/*.{jpg,png,...}`    | `images`  | source              |
//! | fonts    | `fonts/**/*.{eot,woff,...}`    | `fonts`   | source              |

use std::collections::BTreeMap;

use crate::config::model::{
    ConfigSection, PathEntry, RawConfigFile, ScssStyle, ServerSection, StepConfig, TaskConfig,
    default_css_targets, default_include_basepath, default_include_prefix,
};
use crate::types::{CssPolicy, ReloadMode};

const IMAGE_EXTENSIONS: &str = "jpg,png,svg,gif,ico,webp,webmanifest,xml,json";
const FONT_EXTENSIONS: &str = "eot,woff,woff2,ttf,svg";

pub fn builtin_config(css: CssPolicy) -> RawConfigFile {
    let mut paths = BTreeMap::new();
    paths.insert("html".to_string(), entry(&["*.html"], ".", Some(&["**/*.html"]), &[]));
    paths.insert(
        "js".to_string(),
        entry(&["js/*.js"], "js", Some(&["js/**/*.js"]), &["js/main.min.js"]),
    );
    paths.insert("css".to_string(), css_entry(css));

    let images = format!("images/**/*.{{{IMAGE_EXTENSIONS}}}");
    paths.insert("images".to_string(), entry(&[images.as_str()], "images", None, &[]));
    let fonts = format!("fonts/**/*.{{{FONT_EXTENSIONS}}}");
    paths.insert("fonts".to_string(), entry(&[fonts.as_str()], "fonts", None, &[]));

    let mut task = BTreeMap::new();
    task.insert(
        "html".to_string(),
        unit(
            "html",
            vec![StepConfig::Include {
                prefix: default_include_prefix(),
                basepath: default_include_basepath(),
            }],
            ReloadMode::Full,
        ),
    );
    task.insert("styles".to_string(), unit("css", style_steps(css), ReloadMode::Inject));
    task.insert(
        "scripts".to_string(),
        unit(
            "js",
            vec![
                StepConfig::Concat {
                    file: "main.min.js".to_string(),
                    separator: "\n".to_string(),
                },
                StepConfig::MinifyJs,
            ],
            ReloadMode::Full,
        ),
    );
    task.insert("images".to_string(), unit("images", image_steps(), ReloadMode::Full));
    task.insert("fonts".to_string(), unit("fonts", Vec::new(), ReloadMode::None));

    RawConfigFile {
        config: ConfigSection {
            css,
            ..ConfigSection::default()
        },
        server: ServerSection::default(),
        paths,
        task,
    }
}

fn css_entry(css: CssPolicy) -> PathEntry {
    match css {
        CssPolicy::Scss => entry(&["scss/*.scss"], "css", Some(&["scss/**/*.scss"]), &[]),
        CssPolicy::Prebuilt => entry(&["css/style.min.css"], "css", Some(&["css/**/*.css"]), &[]),
    }
}

fn style_steps(css: CssPolicy) -> Vec<StepConfig> {
    match css {
        CssPolicy::Scss => vec![
            StepConfig::Scss {
                style: ScssStyle::Compressed,
            },
            StepConfig::Concat {
                file: "style.min.css".to_string(),
                separator: String::new(),
            },
            StepConfig::Css {
                minify: true,
                targets: default_css_targets(),
            },
        ],
        CssPolicy::Prebuilt => Vec::new(),
    }
}

/// One compressor per format; the programs must be on `PATH` when a matching
/// image is built. Other files are copied untouched.
fn image_steps() -> Vec<StepConfig> {
    let step = |program: &str, args: &[&str], extensions: &[&str]| StepConfig::Command {
        program: program.to_string(),
        args: args.iter().map(|s| s.to_string()).collect(),
        extensions: extensions.iter().map(|s| s.to_string()).collect(),
    };
    vec![
        step("cjpeg", &["-quality", "60"], &["jpg", "jpeg"]),
        step("pngquant", &["--quality=20-50", "-"], &["png"]),
        step("svgo", &["--multipass", "-i", "-", "-o", "-"], &["svg"]),
        step("gifsicle", &["--colors", "64", "--use-col=web"], &["gif"]),
    ]
}

fn entry(source: &[&str], build: &str, watch: Option<&[&str]>, exclude: &[&str]) -> PathEntry {
    let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    PathEntry {
        source: owned(source),
        build: build.to_string(),
        watch: watch.map(owned),
        exclude: owned(exclude),
    }
}

fn unit(input: &str, steps: Vec<StepConfig>, reload: ReloadMode) -> TaskConfig {
    TaskConfig {
        input: input.to_string(),
        output: None,
        steps,
        reload,
        after: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;

    #[test]
    fn builtin_config_validates_under_both_policies() {
        for policy in [CssPolicy::Scss, CssPolicy::Prebuilt] {
            let cfg = ConfigFile::try_from(builtin_config(policy))
                .unwrap_or_else(|e| panic!("{policy:?}: {e}"));
            let units: Vec<_> = cfg.tasks().keys().cloned().collect();
            assert_eq!(units, vec!["fonts", "html", "images", "scripts", "styles"]);
        }
    }

    #[test]
    fn builtin_images_unit_compresses_each_format() {
        let raw = builtin_config(CssPolicy::Scss);
        let commands: Vec<(&str, &[String])> = raw.task["images"]
            .steps
            .iter()
            .filter_map(|step| match step {
                StepConfig::Command {
                    program,
                    extensions,
                    ..
                } => Some((program.as_str(), extensions.as_slice())),
                _ => None,
            })
            .collect();

        assert_eq!(commands.len(), 4);
        assert_eq!(commands[0], ("cjpeg", &["jpg".to_string(), "jpeg".to_string()][..]));
        assert_eq!(commands[1], ("pngquant", &["png".to_string()][..]));
        assert_eq!(commands[2], ("svgo", &["svg".to_string()][..]));
        assert_eq!(commands[3], ("gifsicle", &["gif".to_string()][..]));
    }
}
