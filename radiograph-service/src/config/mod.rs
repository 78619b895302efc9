use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub upload: UploadSettings,
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    /// 0 binds a random port.
    pub port: u16,
    /// Overrides the bundled `static/` directory.
    #[serde(default)]
    pub static_dir: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct SessionSettings {
    /// Sessions (and their radiographs) are dropped after this much inactivity.
    #[serde(default = "default_idle_timeout_minutes")]
    pub idle_timeout_minutes: u64,
    /// Set to true in production with HTTPS.
    #[serde(default)]
    pub secure_cookie: bool,
}

impl SessionSettings {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_minutes.max(1) * 60)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: default_idle_timeout_minutes(),
            secure_cookie: false,
        }
    }
}

fn default_idle_timeout_minutes() -> u64 {
    24 * 60
}

#[derive(Deserialize, Clone)]
pub struct UploadSettings {
    /// Request body limit for the upload form.
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Mock,
}

#[derive(Deserialize, Clone)]
pub struct AnalysisSettings {
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,
    /// Static credential for the hosted model. Supply through
    /// `APP_ANALYSIS__API_KEY` rather than the YAML file.
    #[serde(default = "empty_secret")]
    pub api_key: Secret<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Unset means the call may block indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Reply used by the mock provider.
    #[serde(default = "default_mock_reply")]
    pub mock_reply: String,
}

fn default_provider() -> ProviderKind {
    ProviderKind::Gemini
}

fn empty_secret() -> Secret<String> {
    Secret::new(String::new())
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    crate::services::providers::gemini::GEMINI_API_BASE.to_string()
}

fn default_mock_reply() -> String {
    "### Analysis Results\n\n- Mock analysis: no findings were generated.".to_string()
}

#[derive(Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP gRPC endpoint (e.g., http://tempo:4317); spans are not exported when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("Failed to determine the current directory: {}", e)))?;

    // Check if we're already in radiograph-service directory or need to navigate to it
    let configuration_directory = if base_path.ends_with("radiograph-service") {
        base_path.join("config")
    } else {
        base_path.join("radiograph-service").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
