use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "FOLIO_ENV";
const CONFIG_DIR_ENV: &str = "FOLIO_CONFIG_DIR";
const ENV_PREFIX: &str = "FOLIO";
const PORT_ENV: &str = "PORT";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub document: DocumentSettings,
    #[serde(default)]
    pub formatting: FormattingSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay,
    /// `FOLIO__*` variables and finally `PORT`.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .map(|cwd| cwd.join("config"))
                .context("unable to resolve current directory")?,
        };

        let mut settings = Self::load_from(&config_dir, &environment)?;

        if let Ok(port) = std::env::var(PORT_ENV) {
            settings.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid {PORT_ENV} value '{port}'"))?;
        }

        Ok(settings)
    }

    /// Load configuration from an explicit directory and environment name.
    pub fn load_from(config_dir: &std::path::Path, environment: &str) -> anyhow::Result<Self> {
        let environment_kind: Environment = environment.parse()?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // The environment always comes from FOLIO_ENV, never from files.
        settings.environment = environment_kind;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "ServerSettings::default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8000
    }

    fn default_request_timeout_ms() -> u64 {
        120_000
    }

    fn default_body_limit_bytes() -> usize {
        16 * 1024 * 1024
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
            body_limit_bytes: Self::default_body_limit_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Fallback filter directive used when `RUST_LOG` is not set.
    #[serde(default = "TelemetrySettings::default_log_level")]
    pub log_level: String,
}

impl TelemetrySettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_level: Self::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Remote image download behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchSettings {
    #[serde(default = "FetchSettings::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "FetchSettings::default_user_agent")]
    pub user_agent: String,
    #[serde(default = "FetchSettings::default_max_image_bytes")]
    pub max_image_bytes: u64,
    /// Fail the whole request when an image cannot be fetched instead of
    /// skipping it.
    #[serde(default)]
    pub strict: bool,
}

impl FetchSettings {
    fn default_timeout_secs() -> u64 {
        30
    }

    fn default_user_agent() -> String {
        concat!("folio/", env!("CARGO_PKG_VERSION")).to_string()
    }

    fn default_max_image_bytes() -> u64 {
        20 * 1024 * 1024
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout_secs(),
            user_agent: Self::default_user_agent(),
            max_image_bytes: Self::default_max_image_bytes(),
            strict: false,
        }
    }
}

/// Branding and defaults applied to every generated document.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSettings {
    #[serde(default = "DocumentSettings::default_subtitle")]
    pub default_subtitle: String,
    #[serde(default = "DocumentSettings::default_author")]
    pub default_author: String,
    #[serde(default = "DocumentSettings::default_toc_label")]
    pub toc_label: String,
    #[serde(default = "DocumentSettings::default_brand_name")]
    pub brand_name: String,
    #[serde(default = "DocumentSettings::default_brand_website")]
    pub brand_website: String,
    #[serde(default = "DocumentSettings::default_bundle_suffix")]
    pub bundle_suffix: String,
    #[serde(default = "DocumentSettings::default_primary_color")]
    pub primary_color: String,
    #[serde(default = "DocumentSettings::default_secondary_color")]
    pub secondary_color: String,
    #[serde(default = "DocumentSettings::default_accent_color")]
    pub accent_color: String,
    #[serde(default)]
    pub fonts: FontSettings,
}

impl DocumentSettings {
    fn default_subtitle() -> String {
        "Poradnik".to_string()
    }

    fn default_author() -> String {
        "FOTZ Studio".to_string()
    }

    fn default_toc_label() -> String {
        "SPIS TREŚCI".to_string()
    }

    fn default_brand_name() -> String {
        "FOTZ Studio".to_string()
    }

    fn default_brand_website() -> String {
        "fotz.pl".to_string()
    }

    fn default_bundle_suffix() -> String {
        "FOTZ".to_string()
    }

    fn default_primary_color() -> String {
        "#601A43".to_string()
    }

    fn default_secondary_color() -> String {
        "#162E52".to_string()
    }

    fn default_accent_color() -> String {
        "#C9A227".to_string()
    }
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            default_subtitle: Self::default_subtitle(),
            default_author: Self::default_author(),
            toc_label: Self::default_toc_label(),
            brand_name: Self::default_brand_name(),
            brand_website: Self::default_brand_website(),
            bundle_suffix: Self::default_bundle_suffix(),
            primary_color: Self::default_primary_color(),
            secondary_color: Self::default_secondary_color(),
            accent_color: Self::default_accent_color(),
            fonts: FontSettings::default(),
        }
    }
}

/// Optional TrueType font files. Without `regular` the PDF base fonts are used.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FontSettings {
    #[serde(default)]
    pub regular: Option<PathBuf>,
    #[serde(default)]
    pub bold: Option<PathBuf>,
    #[serde(default)]
    pub italic: Option<PathBuf>,
    #[serde(default)]
    pub bold_italic: Option<PathBuf>,
    #[serde(default)]
    pub mono: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoldMode {
    /// Every occurrence of a keyword is emphasised.
    #[default]
    All,
    /// Only the first occurrence of each keyword per paragraph.
    FirstPerParagraph,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormattingSettings {
    #[serde(default = "FormattingSettings::default_proper_nouns")]
    pub proper_nouns: Vec<String>,
    #[serde(default)]
    pub bold_mode: BoldMode,
    /// Longest grammatical ending accepted after a keyword stem.
    #[serde(default = "FormattingSettings::default_max_suffix_len")]
    pub max_suffix_len: usize,
}

impl FormattingSettings {
    fn default_proper_nouns() -> Vec<String> {
        [
            "Notion", "Trello", "Asana", "Google", "Zapier", "YouTube", "Instagram", "TikTok",
            "Facebook", "LinkedIn", "Twitter", "Excel", "Tableau", "PowerBI", "Buffer", "HubSpot",
            "ICE", "EVP", "SOP", "AI", "API", "DeepL", "FOTZ",
        ]
        .iter()
        .map(|noun| noun.to_string())
        .collect()
    }

    fn default_max_suffix_len() -> usize {
        6
    }
}

impl Default for FormattingSettings {
    fn default() -> Self {
        Self {
            proper_nouns: Self::default_proper_nouns(),
            bold_mode: BoldMode::All,
            max_suffix_len: Self::default_max_suffix_len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_server_listens_on_all_interfaces() {
        let settings = Settings::default();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8000);
    }

    #[test]
    fn default_branding_matches_house_style() {
        let document = DocumentSettings::default();
        assert_eq!(document.primary_color, "#601A43");
        assert_eq!(document.bundle_suffix, "FOTZ");
        assert!(document.fonts.regular.is_none());
    }

    #[test]
    fn unknown_environment_is_rejected() {
        assert!("qa".parse::<Environment>().is_err());
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
    }

    #[test]
    fn files_are_layered_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("base.toml"),
            "[server]\nport = 9100\n\n[formatting]\nbold_mode = \"first_per_paragraph\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("staging.toml"),
            "[telemetry]\nlog_format = \"json\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(dir.path(), "staging").unwrap();

        assert_eq!(settings.environment, Environment::Staging);
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.telemetry.log_format, LogFormat::Json);
        assert_eq!(settings.formatting.bold_mode, BoldMode::FirstPerParagraph);
        assert_eq!(settings.formatting.max_suffix_len, 6);
    }
}
