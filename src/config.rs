//! Configuration for StoryStream.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (STORYSTREAM_API_KEY, STORYSTREAM_MODERATION_POLICY)
//! 2. Config file (.storystream/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .storystream/config.yaml
//! - Falls back to ~/.storystream/config.yaml
//!
//! The API key is never read from the config file; it comes from
//! STORYSTREAM_API_KEY, falling back to GEMINI_API_KEY and then API_KEY.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::gemini::{DEFAULT_ENDPOINT, DEFAULT_MAX_PROMPT_CHARS, DEFAULT_MODEL};
use crate::core::ModerationPolicy;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Environment variables consulted for the API key, in order
const API_KEY_VARS: [&str; 3] = ["STORYSTREAM_API_KEY", "GEMINI_API_KEY", "API_KEY"];

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub moderation: Option<ModerationConfig>,
    #[serde(default)]
    pub comments: Option<CommentsConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModerationConfig {
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub policy: Option<ModerationPolicy>,
    pub timeout_seconds: Option<u64>,
    pub max_prompt_chars: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentsConfig {
    pub blocked_patterns: Option<Vec<String>>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Moderation settings
    pub moderation: ModerationSettings,
    /// Glob patterns that reject a comment
    pub blocked_comment_patterns: Vec<String>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            moderation: ModerationSettings::default(),
            blocked_comment_patterns: default_blocked_patterns(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModerationSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub policy: ModerationPolicy,
    pub timeout_seconds: u64,
    pub max_prompt_chars: usize,
}

impl Default for ModerationSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            policy: ModerationPolicy::default(),
            timeout_seconds: 30,
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

pub fn default_blocked_patterns() -> Vec<String> {
    vec!["*badword*".to_string(), "*slang*".to_string()]
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".storystream").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    dirs::home_dir()
        .map(|home| home.join(".storystream").join("config.yaml"))
        .filter(|path| path.exists())
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// First non-empty API key among `API_KEY_VARS`
fn api_key_from<F>(env: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_VARS
        .iter()
        .filter_map(|var| env(var))
        .find(|key| !key.trim().is_empty())
}

/// Merge an optional config file over defaults, then apply the process
/// environment
fn resolve(config_file: Option<PathBuf>, file: Option<ConfigFile>) -> Result<ResolvedConfig> {
    resolve_with(config_file, file, |var| std::env::var(var).ok())
}

/// Merge an optional config file over defaults, then apply overrides read
/// through `env`
fn resolve_with<F>(
    config_file: Option<PathBuf>,
    file: Option<ConfigFile>,
    env: F,
) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut resolved = ResolvedConfig {
        config_file,
        ..Default::default()
    };

    if let Some(file) = file {
        if let Some(moderation) = file.moderation {
            let settings = &mut resolved.moderation;
            if let Some(model) = moderation.model {
                settings.model = model;
            }
            if let Some(endpoint) = moderation.endpoint {
                settings.endpoint = endpoint;
            }
            if let Some(policy) = moderation.policy {
                settings.policy = policy;
            }
            if let Some(timeout_seconds) = moderation.timeout_seconds {
                settings.timeout_seconds = timeout_seconds;
            }
            if let Some(max_prompt_chars) = moderation.max_prompt_chars {
                settings.max_prompt_chars = max_prompt_chars;
            }
        }

        if let Some(patterns) = file.comments.and_then(|c| c.blocked_patterns) {
            resolved.blocked_comment_patterns = patterns;
        }
    }

    if let Some(policy) = env("STORYSTREAM_MODERATION_POLICY") {
        resolved.moderation.policy = policy
            .parse()
            .context("Invalid STORYSTREAM_MODERATION_POLICY")?;
    }
    resolved.moderation.api_key = api_key_from(&env);

    Ok(resolved)
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();
    let file = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };

    resolve(config_file, file)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ResolvedConfig::default();

        assert_eq!(config.moderation.model, "gemini-2.5-flash");
        assert_eq!(config.moderation.policy, ModerationPolicy::FailOpen);
        assert_eq!(config.moderation.max_prompt_chars, 1000);
        assert_eq!(config.blocked_comment_patterns.len(), 2);
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".storystream");
        std::fs::create_dir_all(&dir).unwrap();

        let config_path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
moderation:
  model: gemini-2.0-pro
  policy: fail_closed
  timeout_seconds: 5
comments:
  blocked_patterns: ["*spoiler*"]
"#
        )
        .unwrap();

        let parsed = load_config_file(&config_path).unwrap();
        assert_eq!(parsed.version, "1.0");

        let moderation = parsed.moderation.clone().unwrap();
        assert_eq!(moderation.model.as_deref(), Some("gemini-2.0-pro"));
        assert_eq!(moderation.policy, Some(ModerationPolicy::FailClosed));
        assert!(moderation.endpoint.is_none());

        let resolved =
            resolve_with(Some(config_path.clone()), Some(parsed), env_from(&[])).unwrap();
        assert_eq!(resolved.config_file, Some(config_path));
        assert_eq!(resolved.moderation.timeout_seconds, 5);
        assert_eq!(resolved.moderation.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(resolved.blocked_comment_patterns, vec!["*spoiler*"]);
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_api_key_precedence() {
        let env = env_from(&[
            ("API_KEY", "generic"),
            ("GEMINI_API_KEY", "gemini"),
            ("STORYSTREAM_API_KEY", "storystream"),
        ]);
        let resolved = resolve_with(None, None, env).unwrap();
        assert_eq!(resolved.moderation.api_key.as_deref(), Some("storystream"));

        let env = env_from(&[("API_KEY", "generic"), ("GEMINI_API_KEY", "gemini")]);
        let resolved = resolve_with(None, None, env).unwrap();
        assert_eq!(resolved.moderation.api_key.as_deref(), Some("gemini"));

        let resolved = resolve_with(None, None, env_from(&[])).unwrap();
        assert!(resolved.moderation.api_key.is_none());
    }

    #[test]
    fn test_blank_api_keys_are_skipped() {
        let env = env_from(&[
            ("STORYSTREAM_API_KEY", "   "),
            ("GEMINI_API_KEY", ""),
            ("API_KEY", "generic"),
        ]);
        let resolved = resolve_with(None, None, env).unwrap();
        assert_eq!(resolved.moderation.api_key.as_deref(), Some("generic"));
    }

    #[test]
    fn test_policy_env_overrides_file() {
        let file: ConfigFile =
            serde_yaml::from_str("moderation:\n  policy: fail_open\n").unwrap();
        let env = env_from(&[("STORYSTREAM_MODERATION_POLICY", "fail-closed")]);

        let resolved = resolve_with(None, Some(file), env).unwrap();
        assert_eq!(resolved.moderation.policy, ModerationPolicy::FailClosed);
    }

    #[test]
    fn test_invalid_policy_env_is_an_error() {
        let env = env_from(&[("STORYSTREAM_MODERATION_POLICY", "sometimes")]);

        let err = resolve_with(None, None, env).unwrap_err();
        assert!(err.to_string().contains("STORYSTREAM_MODERATION_POLICY"));
    }

    #[test]
    fn test_version_is_optional() {
        let file: ConfigFile =
            serde_yaml::from_str("comments:\n  blocked_patterns: []\n").unwrap();
        assert_eq!(file.version, "1.0");
        assert_eq!(
            file.comments.and_then(|c| c.blocked_patterns),
            Some(Vec::new())
        );
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        let yaml = "version: \"1.0\"\nmoderation:\n  policy: maybe\n";
        assert!(serde_yaml::from_str::<ConfigFile>(yaml).is_err());
    }
}
