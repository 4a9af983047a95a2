//! Configuration schema, loading, and environment overrides.
//!
//! Config lives in `~/.medgate/config.toml` (or wherever `MEDGATE_CONFIG`
//! points). Every section deserializes with per-field defaults so a partial
//! file stays valid, and a handful of env vars override the file for
//! container-style deployments.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub generative: GenerativeConfig,

    #[serde(default)]
    pub transcription: TranscriptionConfig,

    #[serde(default)]
    pub synthesis: SynthesisConfig,

    #[serde(default)]
    pub avatar: AvatarConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub media: MediaConfig,

    #[serde(default)]
    pub reports: ReportsConfig,
}

// ── Server ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Upper bound for request bodies, uploads included.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    5000
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

// ── Generative backend ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerativeConfig {
    #[serde(default = "default_generative_provider")]
    pub provider: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_generative_model")]
    pub model: String,
    /// Endpoint override, mainly for tests against a mock server.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Tuning for the free-form consultation endpoint.
    #[serde(default = "default_reply_temperature")]
    pub reply_temperature: f64,
    #[serde(default = "default_reply_max_tokens")]
    pub reply_max_tokens: u32,
    /// Tuning for report generation.
    #[serde(default = "default_report_temperature")]
    pub report_temperature: f64,
    #[serde(default = "default_report_max_tokens")]
    pub report_max_tokens: u32,
}

fn default_generative_provider() -> String {
    "gemini".to_string()
}

fn default_generative_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_reply_temperature() -> f64 {
    0.7
}

fn default_reply_max_tokens() -> u32 {
    500
}

fn default_report_temperature() -> f64 {
    0.5
}

fn default_report_max_tokens() -> u32 {
    400
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            provider: default_generative_provider(),
            api_key: None,
            model: default_generative_model(),
            base_url: None,
            reply_temperature: default_reply_temperature(),
            reply_max_tokens: default_reply_max_tokens(),
            report_temperature: default_report_temperature(),
            report_max_tokens: default_report_max_tokens(),
        }
    }
}

// ── Transcription backend ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    #[serde(default = "default_transcription_provider")]
    pub provider: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_transcription_base_url")]
    pub base_url: String,
    #[serde(default = "default_transcription_model")]
    pub model: String,
    #[serde(default = "default_spanish")]
    pub language: String,
}

fn default_transcription_provider() -> String {
    "whisper-api".to_string()
}

fn default_transcription_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_spanish() -> String {
    "es".to_string()
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            provider: default_transcription_provider(),
            api_key: None,
            base_url: default_transcription_base_url(),
            model: default_transcription_model(),
            language: default_spanish(),
        }
    }
}

// ── Speech synthesis backend ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    #[serde(default = "default_synthesis_provider")]
    pub provider: String,
    /// Mexican Spanish voicing by default.
    #[serde(default = "default_synthesis_base_url")]
    pub base_url: String,
    #[serde(default = "default_spanish")]
    pub language: String,
}

fn default_synthesis_provider() -> String {
    "google-translate".to_string()
}

fn default_synthesis_base_url() -> String {
    "https://translate.google.com.mx".to_string()
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            provider: default_synthesis_provider(),
            base_url: default_synthesis_base_url(),
            language: default_spanish(),
        }
    }
}

// ── Avatar platform ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub client_key: Option<String>,
    #[serde(default = "default_avatar_base_url")]
    pub base_url: String,
}

fn default_avatar_base_url() -> String {
    "https://api.d-id.com".to_string()
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            agent_id: None,
            client_key: None,
            base_url: default_avatar_base_url(),
        }
    }
}

// ── Sessions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_backend")]
    pub backend: String,
    /// Sessions retained before the least recently used one is dropped.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_session_backend() -> String {
    "memory".to_string()
}

fn default_max_sessions() -> usize {
    1024
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: default_session_backend(),
            max_sessions: default_max_sessions(),
        }
    }
}

// ── Media artifacts ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Where generated audio artifacts land.
    #[serde(default = "default_media_dir")]
    pub dir: PathBuf,
}

fn default_media_dir() -> PathBuf {
    std::env::temp_dir().join("medgate")
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            dir: default_media_dir(),
        }
    }
}

// ── Reports ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_reports_dir")]
    pub dir: PathBuf,
    /// How many reports the history endpoint returns.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reportes")
}

fn default_history_limit() -> usize {
    10
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            dir: default_reports_dir(),
            history_limit: default_history_limit(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────────────

impl Config {
    pub fn load_or_init() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    /// Resolves the config file location: `MEDGATE_CONFIG` when set,
    /// otherwise `~/.medgate/config.toml`.
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("MEDGATE_CONFIG") {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        let home = UserDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        Ok(home.join(".medgate").join("config.toml"))
    }

    pub fn load_from(config_path: PathBuf) -> Result<Self> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }

        let fresh = !config_path.exists();
        let mut config = if fresh {
            Self::default()
        } else {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str::<Self>(&contents).context("Failed to parse config file")?
        };
        config.config_path = config_path;
        if fresh {
            config.save()?;
        }
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str)
            .with_context(|| format!("Failed to write {}", self.config_path.display()))
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.is_empty());

        // Generative key: GOOGLE_GEMINI_API_KEY, then the generic GOOGLE_API_KEY
        if let Some(key) =
            non_empty("GOOGLE_GEMINI_API_KEY").or_else(|| non_empty("GOOGLE_API_KEY"))
        {
            self.generative.api_key = Some(key);
        }
        if let Some(model) = non_empty("GEMINI_MODEL") {
            self.generative.model = model;
        }

        // Transcription rides the standard OpenAI key
        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.transcription.api_key = Some(key);
        }

        // Avatar platform credentials
        if let Some(key) = non_empty("DID_API_KEY") {
            self.avatar.api_key = Some(key);
        }
        if let Some(id) = non_empty("DID_AGENT_ID") {
            self.avatar.agent_id = Some(id);
        }
        if let Some(key) = non_empty("DID_CLIENT_KEY") {
            self.avatar.client_key = Some(key);
        }

        // Bind address: PORT and HOST
        if let Some(port) = lookup("PORT").and_then(|value| value.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(host) = non_empty("HOST") {
            self.server.host = host;
        }
    }

    /// Startup check: serving without a generative key would turn every
    /// endpoint into a degraded reply.
    pub fn validate(&self) -> Result<()> {
        if self.generative.api_key.is_none() {
            anyhow::bail!(
                "Missing Gemini API key. Set GOOGLE_GEMINI_API_KEY (or GOOGLE_API_KEY), \
                 or add api_key under [generative] in {}",
                self.config_path.display()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    // ── Defaults ─────────────────────────────────────────────

    #[test]
    fn config_default_has_sane_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.generative.provider, "gemini");
        assert_eq!(config.generative.model, "gemini-2.5-flash");
        assert!(config.generative.api_key.is_none());
        assert!((config.generative.reply_temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.generative.reply_max_tokens, 500);
        assert!((config.generative.report_temperature - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.generative.report_max_tokens, 400);
    }

    #[test]
    fn speech_defaults_voice_spanish() {
        let config = Config::default();
        assert_eq!(config.transcription.provider, "whisper-api");
        assert_eq!(config.transcription.model, "whisper-1");
        assert_eq!(config.transcription.language, "es");
        assert_eq!(config.synthesis.provider, "google-translate");
        assert_eq!(config.synthesis.base_url, "https://translate.google.com.mx");
        assert_eq!(config.synthesis.language, "es");
    }

    #[test]
    fn storage_defaults() {
        let config = Config::default();
        assert_eq!(config.session.backend, "memory");
        assert_eq!(config.session.max_sessions, 1024);
        assert_eq!(config.reports.dir, PathBuf::from("reportes"));
        assert_eq!(config.reports.history_limit, 10);
        assert!(config.media.dir.ends_with("medgate"));
        assert_eq!(config.avatar.base_url, "https://api.d-id.com");
    }

    // ── Parsing ──────────────────────────────────────────────

    #[test]
    fn partial_toml_keeps_section_defaults() {
        let config: Config = toml::from_str(
            r#"
            [generative]
            api_key = "sk-demo"

            [server]
            port = 8080
            "#,
        )
        .unwrap();
        assert_eq!(config.generative.api_key.as_deref(), Some("sk-demo"));
        assert_eq!(config.generative.model, "gemini-2.5-flash");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.session.max_sessions, 1024);
    }

    #[test]
    fn load_from_creates_and_reloads_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.toml");

        let config = Config::load_from(path.clone()).unwrap();
        assert!(path.exists());
        assert_eq!(config.server.port, 5000);

        let reloaded = Config::load_from(path).unwrap();
        assert_eq!(reloaded.generative.provider, "gemini");
    }

    // ── Env overrides ────────────────────────────────────────

    #[test]
    fn env_override_gemini_key_prefers_specific_name() {
        let vars = env(&[
            ("GOOGLE_GEMINI_API_KEY", "specific"),
            ("GOOGLE_API_KEY", "generic"),
        ]);
        let mut config = Config::default();
        config.apply_env_from(|name| vars.get(name).cloned());
        assert_eq!(config.generative.api_key.as_deref(), Some("specific"));
    }

    #[test]
    fn env_override_gemini_key_falls_back_to_generic() {
        let vars = env(&[("GOOGLE_API_KEY", "generic")]);
        let mut config = Config::default();
        config.apply_env_from(|name| vars.get(name).cloned());
        assert_eq!(config.generative.api_key.as_deref(), Some("generic"));
    }

    #[test]
    fn env_override_ignores_empty_values() {
        let vars = env(&[("GOOGLE_GEMINI_API_KEY", ""), ("GEMINI_MODEL", "")]);
        let mut config = Config::default();
        config.apply_env_from(|name| vars.get(name).cloned());
        assert!(config.generative.api_key.is_none());
        assert_eq!(config.generative.model, "gemini-2.5-flash");
    }

    #[test]
    fn env_override_port_and_avatar() {
        let vars = env(&[
            ("PORT", "9000"),
            ("DID_API_KEY", "basic-key"),
            ("DID_AGENT_ID", "agt_1"),
            ("OPENAI_API_KEY", "sk-whisper"),
        ]);
        let mut config = Config::default();
        config.apply_env_from(|name| vars.get(name).cloned());
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.avatar.api_key.as_deref(), Some("basic-key"));
        assert_eq!(config.avatar.agent_id.as_deref(), Some("agt_1"));
        assert_eq!(config.transcription.api_key.as_deref(), Some("sk-whisper"));
    }

    #[test]
    fn env_override_bad_port_is_ignored() {
        let vars = env(&[("PORT", "not-a-port")]);
        let mut config = Config::default();
        config.apply_env_from(|name| vars.get(name).cloned());
        assert_eq!(config.server.port, 5000);
    }

    // ── Validation ───────────────────────────────────────────

    #[test]
    fn validate_requires_generative_key() {
        let mut config = Config::default();
        assert!(config.validate().is_err());
        config.generative.api_key = Some("sk-demo".into());
        assert!(config.validate().is_ok());
    }
}
