//! Environment-derived arena configuration.
//!
//! All resolution happens once, before any backend call, into an immutable
//! [`ArenaConfig`] handed to the orchestrator. Missing or invalid values are
//! [`ConfigError`] and abort the run before it starts.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Which class of endpoint a participant talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Self-hosted OpenAI-compatible server; no credentials.
    Local,
    /// Hosted API; requires an API key.
    Online,
}

impl BackendKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Self::Local),
            "online" => Some(Self::Online),
            _ => None,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Online => write!(f, "online"),
        }
    }
}

/// Resolved endpoint for one debater or judge.
///
/// Invariant: `requires_api_key` is true exactly when `backend` is online.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub backend: BackendKind,
    pub base_url: String,
    pub model: String,
    pub requires_api_key: bool,
}

/// Fatal configuration problem, raised before any debate starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingVar(String),
    #[error("{var} must be 'local' or 'online', got '{value}'")]
    InvalidBackend { var: String, value: String },
    #[error("JUDGE_MODELS and JUDGE_BACKENDS must have the same length ({models} vs {backends})")]
    JudgeListMismatch { models: usize, backends: usize },
    #[error("API key is required for online backends; set API_KEY")]
    MissingApiKey,
}

/// Immutable run configuration.
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    pub topic: String,
    pub conditions: String,
    pub lang: String,
    pub debater_a: EndpointConfig,
    pub debater_b: EndpointConfig,
    pub judges: Vec<EndpointConfig>,
    pub blind_jury: bool,
    pub api_key: Option<String>,
    pub output_dir: PathBuf,
    pub prompt_dir: Option<PathBuf>,
    /// Courtesy pause after each debater call.
    pub round_pause: Duration,
}

impl ArenaConfig {
    /// Resolve from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// Resolve from an injected lookup (the test seam).
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require =
            |key: &str| get(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()));

        let topic = require("TOPIC")?;
        let conditions = get("CONDITIONS").unwrap_or_default();
        let lang = get("ARENA_LANG").unwrap_or_else(|| "en".to_string());

        let debater_a = resolve_endpoint(&get, "MODEL_A")?;
        let debater_b = resolve_endpoint(&get, "MODEL_B")?;
        let judges = resolve_judges(&get)?;

        let blind_jury = get("JUDGE_BLIND")
            .map(|v| v.to_ascii_lowercase() == "true")
            .unwrap_or(true);

        let api_key = get("API_KEY");
        let needs_key = [&debater_a, &debater_b]
            .into_iter()
            .chain(judges.iter())
            .any(|e| e.requires_api_key);
        if needs_key && api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(Self {
            topic,
            conditions,
            lang,
            debater_a,
            debater_b,
            judges,
            blind_jury,
            api_key,
            output_dir: get("ARENA_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("outputs")),
            prompt_dir: get("ARENA_PROMPT_DIR").map(PathBuf::from),
            round_pause: Duration::from_secs(1),
        })
    }
}

fn resolve_endpoint(
    get: &dyn Fn(&str) -> Option<String>,
    role: &str,
) -> Result<EndpointConfig, ConfigError> {
    let backend_var = format!("{role}_BACKEND");
    let raw = get(&backend_var).ok_or_else(|| ConfigError::MissingVar(backend_var.clone()))?;
    let backend = BackendKind::parse(&raw).ok_or(ConfigError::InvalidBackend {
        var: backend_var,
        value: raw,
    })?;

    let base_var = match backend {
        BackendKind::Local => "LOCAL_BASE_URL",
        BackendKind::Online => "ONLINE_BASE_URL",
    };
    let base_url = get(base_var).ok_or_else(|| ConfigError::MissingVar(base_var.to_string()))?;

    let model_var = format!("{role}_MODEL");
    let model = get(&model_var).ok_or_else(|| ConfigError::MissingVar(model_var))?;

    Ok(EndpointConfig {
        backend,
        base_url,
        model,
        requires_api_key: backend == BackendKind::Online,
    })
}

fn resolve_judges(
    get: &dyn Fn(&str) -> Option<String>,
) -> Result<Vec<EndpointConfig>, ConfigError> {
    let split = |raw: String| -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };

    let models = split(get("JUDGE_MODELS").ok_or_else(|| ConfigError::MissingVar("JUDGE_MODELS".into()))?);
    let backends =
        split(get("JUDGE_BACKENDS").ok_or_else(|| ConfigError::MissingVar("JUDGE_BACKENDS".into()))?);

    if models.len() != backends.len() {
        return Err(ConfigError::JudgeListMismatch {
            models: models.len(),
            backends: backends.len(),
        });
    }

    models
        .into_iter()
        .zip(backends)
        .map(|(model, raw_backend)| {
            let backend =
                BackendKind::parse(&raw_backend).ok_or(ConfigError::InvalidBackend {
                    var: "JUDGE_BACKENDS".to_string(),
                    value: raw_backend,
                })?;
            let base_var = match backend {
                BackendKind::Local => "LOCAL_BASE_URL",
                BackendKind::Online => "ONLINE_BASE_URL",
            };
            let base_url =
                get(base_var).ok_or_else(|| ConfigError::MissingVar(base_var.to_string()))?;
            Ok(EndpointConfig {
                backend,
                base_url,
                model,
                requires_api_key: backend == BackendKind::Online,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("TOPIC", "Cats are better than dogs"),
            ("MODEL_A_BACKEND", "local"),
            ("MODEL_A_MODEL", "debater-a"),
            ("MODEL_B_BACKEND", "local"),
            ("MODEL_B_MODEL", "debater-b"),
            ("LOCAL_BASE_URL", "http://localhost:8080/v1"),
            ("JUDGE_MODELS", "judge-1,judge-2"),
            ("JUDGE_BACKENDS", "local,local"),
        ])
    }

    fn resolve(env: &HashMap<&str, &str>) -> Result<ArenaConfig, ConfigError> {
        ArenaConfig::from_lookup(&|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_minimal_local_config() {
        let config = resolve(&base_env()).unwrap();
        assert_eq!(config.topic, "Cats are better than dogs");
        assert_eq!(config.conditions, "");
        assert_eq!(config.lang, "en");
        assert_eq!(config.debater_a.model, "debater-a");
        assert_eq!(config.debater_a.backend, BackendKind::Local);
        assert!(!config.debater_a.requires_api_key);
        assert_eq!(config.judges.len(), 2);
        assert!(config.blind_jury);
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
    }

    #[test]
    fn test_missing_topic() {
        let mut env = base_env();
        env.remove("TOPIC");
        assert!(matches!(
            resolve(&env),
            Err(ConfigError::MissingVar(var)) if var == "TOPIC"
        ));
    }

    #[test]
    fn test_invalid_backend_value() {
        let mut env = base_env();
        env.insert("MODEL_A_BACKEND", "cloud");
        assert!(matches!(
            resolve(&env),
            Err(ConfigError::InvalidBackend { value, .. }) if value == "cloud"
        ));
    }

    #[test]
    fn test_online_requires_api_key() {
        let mut env = base_env();
        env.insert("MODEL_A_BACKEND", "online");
        env.insert("ONLINE_BASE_URL", "https://api.example.com/v1");
        assert!(matches!(resolve(&env), Err(ConfigError::MissingApiKey)));

        env.insert("API_KEY", "sk-test");
        let config = resolve(&env).unwrap();
        assert!(config.debater_a.requires_api_key);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_judge_list_mismatch() {
        let mut env = base_env();
        env.insert("JUDGE_BACKENDS", "local");
        assert!(matches!(
            resolve(&env),
            Err(ConfigError::JudgeListMismatch {
                models: 2,
                backends: 1
            })
        ));
    }

    #[test]
    fn test_judge_list_whitespace_and_empties() {
        let mut env = base_env();
        env.insert("JUDGE_MODELS", " judge-1 , judge-2 ,");
        env.insert("JUDGE_BACKENDS", "local, local,");
        let config = resolve(&env).unwrap();
        assert_eq!(config.judges.len(), 2);
        assert_eq!(config.judges[0].model, "judge-1");
        assert_eq!(config.judges[1].model, "judge-2");
    }

    #[test]
    fn test_blind_flag_parsing() {
        let mut env = base_env();
        env.insert("JUDGE_BLIND", "FALSE");
        assert!(!resolve(&env).unwrap().blind_jury);

        env.insert("JUDGE_BLIND", "True");
        assert!(resolve(&env).unwrap().blind_jury);
    }

    #[test]
    fn test_mixed_judge_backends() {
        let mut env = base_env();
        env.insert("JUDGE_BACKENDS", "local,online");
        env.insert("ONLINE_BASE_URL", "https://api.example.com/v1");
        env.insert("API_KEY", "sk-test");
        let config = resolve(&env).unwrap();
        assert_eq!(config.judges[0].backend, BackendKind::Local);
        assert_eq!(config.judges[1].backend, BackendKind::Online);
        assert!(config.judges[1].requires_api_key);
        assert_eq!(config.judges[1].base_url, "https://api.example.com/v1");
    }
}
