use std::fmt;

use serde::Deserialize;

/// How stylesheets are authored in the source tree.
///
/// - `Scss`: `.scss` sources compiled by the pipeline (default).
/// - `Prebuilt`: a finished `.css` file that is only copied.
///
/// Exactly one policy is active per configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CssPolicy {
    #[default]
    Scss,
    Prebuilt,
}

impl CssPolicy {
    /// File extension the `css` category sources must carry under this policy.
    pub fn source_extension(self) -> &'static str {
        match self {
            CssPolicy::Scss => ".scss",
            CssPolicy::Prebuilt => ".css",
        }
    }
}

/// What a completed unit asks connected browsers to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadMode {
    /// No notification.
    #[default]
    None,
    /// Full page reload.
    Full,
    /// Swap stylesheets in place without reloading the page.
    Inject,
}

/// The three purposes a category's patterns are used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathRole {
    Source,
    Build,
    Watch,
}

impl fmt::Display for PathRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PathRole::Source => "source",
            PathRole::Build => "build",
            PathRole::Watch => "watch",
        };
        f.write_str(s)
    }
}
