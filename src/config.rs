//! Runtime configuration: `config.yaml` plus environment overrides.
//!
//! Every field has a default so the binary can run without a config file.
//! Secrets and model names usually come from the environment in deployments;
//! env values always win over the YAML file.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Top-level configuration shared by all subcommands.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: Paths,
    pub news: News,
    pub openai: OpenAi,
    pub gemini: Gemini,
    pub models: Models,
    pub server: Server,
    /// Hand-written pages merged into the posts index alongside generated ones.
    pub manual_posts: Vec<ManualPost>,
}

/// Filesystem layout of the published site and the data directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Paths {
    /// Web root that published URLs are computed relative to.
    pub web_root: PathBuf,
    /// Home page whose marker-delimited section lists generated articles.
    pub index_html: PathBuf,
    /// Directory generated article pages are written into.
    pub posts_dir: PathBuf,
    /// Directory holding the queue, manifest and digest JSON files.
    pub data_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            web_root: PathBuf::from("/var/www/html"),
            index_html: PathBuf::from("/var/www/html/index.html"),
            posts_dir: PathBuf::from("/var/www/html/posts/genba"),
            data_dir: PathBuf::from("/var/lib/genba_press"),
        }
    }
}

/// News aggregator access.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct News {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for News {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org".to_string(),
            api_key: None,
        }
    }
}

/// OpenAI-compatible chat completions access.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OpenAi {
    pub api_key: Option<String>,
    /// Alternate endpoint for OpenAI-compatible servers.
    pub api_base: Option<String>,
}

/// Gemini access for the translation proxy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Gemini {
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for Gemini {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
        }
    }
}

/// Model names per pipeline stage. The digest model has a default; the
/// weekly draft/final pair must be configured explicitly.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Models {
    pub digest: String,
    pub draft: Option<String>,
    pub r#final: Option<String>,
}

impl Default for Models {
    fn default() -> Self {
        Self {
            digest: "gpt-4o-mini".to_string(),
            draft: None,
            r#final: None,
        }
    }
}

/// HTTP server binding.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

/// A hand-written page listed on the posts index.
#[derive(Debug, Clone, Deserialize)]
pub struct ManualPost {
    /// Link target relative to the posts directory.
    pub href: String,
    pub title: String,
    #[serde(default)]
    pub date: String,
}

/// Reads an environment variable, treating empty values as unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    /// Loads configuration from a YAML file (when given) and applies
    /// environment overrides on top.
    ///
    /// # Arguments
    ///
    /// * `path` - Optional path to a `config.yaml`
    ///
    /// # Returns
    ///
    /// The effective configuration, or an error when the file exists but
    /// cannot be read or parsed.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("reading config file {p}"))?;
                serde_yaml::from_str(&raw).with_context(|| format!("parsing config file {p}"))?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(v) = env_var("GENBA_WEB_ROOT") {
            self.paths.web_root = PathBuf::from(v);
        }
        if let Some(v) = env_var("GENBA_INDEX_HTML") {
            self.paths.index_html = PathBuf::from(v);
        }
        if let Some(v) = env_var("GENBA_POSTS_DIR") {
            self.paths.posts_dir = PathBuf::from(v);
        }
        if let Some(v) = env_var("GENBA_DATA_DIR") {
            self.paths.data_dir = PathBuf::from(v);
        }
        if let Some(v) = env_var("NEWSAPI_KEY") {
            self.news.api_key = Some(v);
        }
        if let Some(v) = env_var("OPENAI_API_KEY") {
            self.openai.api_key = Some(v);
        }
        if let Some(v) = env_var("OPENAI_API_BASE") {
            self.openai.api_base = Some(v);
        }
        if let Some(v) = env_var("GEMINI_API_KEY") {
            self.gemini.api_key = Some(v);
        }
        if let Some(v) = env_var("GEMINI_MODEL") {
            self.gemini.model = v;
        }
        if let Some(v) = env_var("GENBA_MODEL_DRAFT") {
            self.models.draft = Some(v);
        }
        if let Some(v) = env_var("GENBA_MODEL_FINAL") {
            self.models.r#final = Some(v);
        }
    }

    /// Path of the theme queue file.
    pub fn queue_path(&self) -> PathBuf {
        self.paths.data_dir.join("genba_queue.json")
    }

    /// Path of the published-articles manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.paths.data_dir.join("genba_manifest.json")
    }

    /// Path of the daily digest file.
    pub fn digest_path(&self) -> PathBuf {
        self.paths.data_dir.join("digest.json")
    }

    pub fn require_newsapi_key(&self) -> Result<&str> {
        self.news.api_key.as_deref().context("NEWSAPI_KEY missing")
    }

    pub fn require_openai_key(&self) -> Result<&str> {
        self.openai
            .api_key
            .as_deref()
            .context("OPENAI_API_KEY missing")
    }

    pub fn require_gemini_key(&self) -> Result<&str> {
        self.gemini
            .api_key
            .as_deref()
            .context("GEMINI_API_KEY missing")
    }

    /// Draft and final model names for the weekly generator. Both are
    /// required; the command refuses to run with a half-configured pair.
    pub fn weekly_models(&self) -> Result<(&str, &str)> {
        match (self.models.draft.as_deref(), self.models.r#final.as_deref()) {
            (Some(draft), Some(r#final)) => Ok((draft, r#final)),
            _ => bail!("GENBA_MODEL_DRAFT and GENBA_MODEL_FINAL must be set"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.news.base_url, "https://newsapi.org");
        assert_eq!(config.models.digest, "gpt-4o-mini");
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(
            config.queue_path(),
            PathBuf::from("/var/lib/genba_press/genba_queue.json")
        );
    }

    #[test]
    fn test_yaml_partial_override() {
        let yaml = r#"
paths:
  data_dir: /tmp/genba
models:
  draft: gpt-5-mini
  final: gpt-5.2
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.paths.data_dir, PathBuf::from("/tmp/genba"));
        // Untouched sections keep their defaults.
        assert_eq!(config.paths.web_root, PathBuf::from("/var/www/html"));
        assert_eq!(config.models.draft.as_deref(), Some("gpt-5-mini"));
        assert_eq!(config.models.r#final.as_deref(), Some("gpt-5.2"));
    }

    #[test]
    fn test_weekly_models_required() {
        let mut config = Config::default();
        assert!(config.weekly_models().is_err());

        config.models.draft = Some("gpt-5-mini".to_string());
        // Half-configured is still an error.
        assert!(config.weekly_models().is_err());

        config.models.r#final = Some("gpt-5.2".to_string());
        let (draft, r#final) = config.weekly_models().unwrap();
        assert_eq!(draft, "gpt-5-mini");
        assert_eq!(r#final, "gpt-5.2");
    }

    #[test]
    fn test_manual_posts_parse() {
        let yaml = r#"
manual_posts:
  - href: ../win_command.html
    title: PowerShellコマンド：フォルダの操作
    date: "2025-11-25"
  - href: ../notes.html
    title: メモ
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.manual_posts.len(), 2);
        assert_eq!(config.manual_posts[0].date, "2025-11-25");
        assert_eq!(config.manual_posts[1].date, "");
    }
}
