use ignore::WalkBuilder;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};

pub struct IgnoreFilter {
    inner: Gitignore,
}

impl IgnoreFilter {
    pub fn new(root: &Path, extra_excludes: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(root);
        builder.add(root.join(".ignore"));

        let defaults = [
            // Build output and dependency trees
            "target/", "node_modules/", "venv/", ".venv/", "vendor/",
            "dist/", "build/", "out/", "__pycache__/",
            ".git/", ".vscode/", ".idea/",
            // Minified and generated sources
            "*.min.js", "*.bundle.js", "*_pb2.py", "*.pb.go",
        ];

        for pattern in defaults {
            builder.add_line(None, pattern).ok();
        }

        for pattern in extra_excludes {
            if let Err(e) = builder.add_line(None, pattern) {
                tracing::warn!("ignoring invalid exclude pattern `{}`: {}", pattern, e);
            }
        }

        Self {
            inner: builder.build().unwrap_or_else(|_| Gitignore::empty()),
        }
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.inner.matched(path, is_dir).is_ignore()
    }

    /// Files under `root` that survive `.gitignore` and this filter, sorted
    pub fn source_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkBuilder::new(root)
            .hidden(false)
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!("skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| !self.is_excluded(root, path))
            .collect();
        files.sort();
        files
    }

    /// Check a file and each of its parent directories below `root`
    fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        if self.is_ignored(path, false) {
            return true;
        }
        path.ancestors()
            .skip(1)
            .take_while(|dir| dir.starts_with(root) && *dir != root)
            .any(|dir| self.is_ignored(dir, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_and_extra_excludes() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::create_dir_all(root.join("generated")).unwrap();
        std::fs::write(root.join("src/app.js"), "let a = 1;").unwrap();
        std::fs::write(root.join("node_modules/pkg/index.js"), "let b = 2;").unwrap();
        std::fs::write(root.join("generated/out.py"), "c = 3").unwrap();
        std::fs::write(root.join("src/app.min.js"), "let d=4;").unwrap();

        let filter = IgnoreFilter::new(root, &["generated/".to_string()]);
        let files = filter.source_files(root);

        assert_eq!(files, vec![root.join("src/app.js")]);
    }
}
