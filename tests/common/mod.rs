#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetdag::config::{ConfigFile, builtin_config};
use assetdag::types::CssPolicy;
use tempfile::TempDir;

pub use assetdag_test_utils::{init_tracing, with_timeout};

/// A throwaway project directory with `src/` and `dist/` under it.
pub struct Site {
    pub dir: TempDir,
}

impl Site {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create tempdir"),
        }
    }

    pub fn src(&self) -> PathBuf {
        self.dir.path().join("src")
    }

    pub fn dist(&self) -> PathBuf {
        self.dir.path().join("dist")
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.src().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.src().join(rel)).unwrap();
    }

    pub fn read_output(&self, rel: &str) -> String {
        fs::read_to_string(self.dist().join(rel))
            .unwrap_or_else(|e| panic!("reading dist/{rel}: {e}"))
    }

    pub fn has_output(&self, rel: &str) -> bool {
        self.dist().join(rel).is_file()
    }

    /// The built-in pipeline anchored at this directory.
    pub fn builtin_config(&self, css: CssPolicy) -> Arc<ConfigFile> {
        let cfg = ConfigFile::try_from(builtin_config(css))
            .expect("built-in config validates")
            .with_base_dir(self.dir.path());
        Arc::new(cfg)
    }

    /// The fixture from the README: one page with a header partial, one
    /// stylesheet and two scripts.
    pub fn with_starter_files(self) -> Self {
        self.write(
            "index.html",
            "<html><body>@@header.html<main>home</main></body></html>",
        );
        self.write("header.html", "<header>Site</header>");
        self.write(
            "scss/style.scss",
            "$accent: red;\n.header {\n  color: $accent;\n}\n",
        );
        self.write("scss/_unused.scss", ".never { color: blue; }\n");
        self.write(
            "js/a.js",
            "function greet(name) {\n  console.log(\"alpha \" + name);\n}\ngreet(\"a\");\n",
        );
        self.write("js/b.js", "var answer = 40 + 2;\nconsole.log(\"beta\", answer);\n");
        self
    }
}

/// Every file below `root`, relative and sorted.
pub fn list_files(root: &Path) -> Vec<String> {
    let mut out: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    out.sort();
    out
}
