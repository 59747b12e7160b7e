use crate::namespace::NameSpaces;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ScopegraphConfig {
    /// Default root for `stats`
    pub path: Option<String>,
    /// Extra ignore patterns, gitignore syntax
    pub exclude: Vec<String>,
    /// Default output format, `text` or `json`
    pub format: Option<String>,
    /// Worker threads for `stats`
    pub threads: Option<usize>,
    /// Per-language overrides, keyed by lowercase language name
    pub languages: BTreeMap<String, LanguageConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LanguageConfig {
    /// Capture query file replacing the built-in one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<PathBuf>,
    /// Namespace table replacing the built-in one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<NameSpaces>,
}

impl ScopegraphConfig {
    pub fn language(&self, name: &str) -> Option<&LanguageConfig> {
        self.languages.get(&name.to_lowercase())
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("scopegraph.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ScopegraphConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ScopegraphConfig = toml::from_str(&contents)?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ScopegraphConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("scopegraph.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_language_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scopegraph.toml");
        std::fs::write(
            &path,
            r#"
path = "src"
exclude = ["generated/"]
threads = 2

[languages.python]
query = "queries/custom.scm"
namespaces = [["function", "variable"]]
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.path.as_deref(), Some("src"));
        assert_eq!(config.exclude, vec!["generated/".to_string()]);
        assert_eq!(config.threads, Some(2));
        assert_eq!(config.format, None);

        let python = config.language("Python").unwrap();
        assert_eq!(python.query, Some(PathBuf::from("queries/custom.scm")));
        assert_eq!(
            python.namespaces,
            Some(NameSpaces::from_static(&[&["function", "variable"]]))
        );
        assert!(config.language("go").is_none());
    }

    #[test]
    fn test_write_config_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scopegraph.toml");
        let config = ScopegraphConfig {
            path: Some(".".to_string()),
            format: Some("text".to_string()),
            ..Default::default()
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let reloaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(reloaded, config);
    }
}
