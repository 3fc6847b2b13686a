// src/paths/normalize.rs

//! Pattern and path normalization shared by every category role.
//!
//! Patterns are always stored relative to their root, with forward slashes,
//! no empty or `.` segments, and no leading `./` or `/`. That way
//! `src//js/*.js`, `./js/*.js` and `js\*.js` all name the same physical
//! location.

use std::path::Path;

/// Characters that start a glob expression in `globset` syntax.
const GLOB_META: [char; 5] = ['*', '?', '[', '{', '!'];

/// Normalize a glob pattern or relative directory.
pub fn normalize_pattern(raw: &str) -> String {
    let unified = raw.trim().replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for seg in unified.split('/') {
        match seg {
            "" | "." => continue,
            ".." if segments.last().is_some_and(|s| *s != "..") => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Literal directory prefix of a normalized pattern: every segment before the
/// first one containing a glob metacharacter, excluding the final (file)
/// segment.
///
/// - `js/*.js` -> `js`
/// - `images/**/*.png` -> `images`
/// - `*.html` -> `` (the root itself)
/// - `css/style.min.css` -> `css`
pub fn glob_base(pattern: &str) -> String {
    let segments: Vec<&str> = pattern.split('/').collect();
    let mut base = Vec::new();
    for (idx, seg) in segments.iter().enumerate() {
        let is_last = idx + 1 == segments.len();
        if is_last || seg.contains(GLOB_META) {
            break;
        }
        base.push(*seg);
    }
    base.join("/")
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (symlinks, `/private/var` on macOS, ...), we canonicalize
///   both paths and try again.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(normalize_pattern(&rel.to_string_lossy()));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(normalize_pattern(&rel.to_string_lossy()));
        }
    }

    None
}

/// Lexical containment check on normalized relative paths: `inner` equals
/// `outer` or lives below it. The empty string is the root and contains
/// everything.
pub fn is_within(inner: &str, outer: &str) -> bool {
    outer.is_empty() || inner == outer || inner.starts_with(&format!("{outer}/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_collapses_separators_and_dots() {
        assert_eq!(normalize_pattern("src//js/*.js"), "src/js/*.js");
        assert_eq!(normalize_pattern("./js/*.js"), "js/*.js");
        assert_eq!(normalize_pattern("/js\\vendor\\*.js"), "js/vendor/*.js");
        assert_eq!(normalize_pattern("css/../scss/*.scss"), "scss/*.scss");
        assert_eq!(normalize_pattern("."), "");
        assert_eq!(normalize_pattern("../shared/*.css"), "../shared/*.css");
    }

    #[test]
    fn base_stops_at_first_glob_segment() {
        assert_eq!(glob_base("js/*.js"), "js");
        assert_eq!(glob_base("js/**/*.js"), "js");
        assert_eq!(glob_base("*.html"), "");
        assert_eq!(glob_base("**/*.html"), "");
        assert_eq!(glob_base("images/{a,b}/x.png"), "images");
        assert_eq!(glob_base("css/style.min.css"), "css");
    }

    #[test]
    fn containment_is_segment_aware() {
        assert!(is_within("dist/css", "dist"));
        assert!(is_within("dist", "dist"));
        assert!(!is_within("distant", "dist"));
        assert!(is_within("anything", ""));
    }

    #[test]
    fn relative_str_uses_forward_slashes() {
        let root = Path::new("/project/src");
        let path = Path::new("/project/src/js/app.js");
        assert_eq!(relative_str(root, path).as_deref(), Some("js/app.js"));
        assert_eq!(relative_str(root, Path::new("/elsewhere/x.js")), None);
    }
}
