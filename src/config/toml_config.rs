use crate::domain::model::{CanonicalField, ProviderId};
use crate::utils::error::{Result, ServiceError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const AUTO_DEV_API_KEY_ENV: &str = "AUTO_DEV_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub precedence: PrecedenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

/// Each provider table is layered over that provider's own preset, so a
/// table only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ProviderTables")]
pub struct ProvidersConfig {
    pub auto_dev: ProviderSettings,
    pub nhtsa: ProviderSettings,
    pub carquery: ProviderSettings,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderTables {
    #[serde(default)]
    auto_dev: ProviderTable,
    #[serde(default)]
    nhtsa: ProviderTable,
    #[serde(default)]
    carquery: ProviderTable,
}

impl From<ProviderTables> for ProvidersConfig {
    fn from(tables: ProviderTables) -> Self {
        Self {
            auto_dev: tables.auto_dev.over(ProviderSettings::auto_dev()),
            nhtsa: tables.nhtsa.over(ProviderSettings::nhtsa()),
            carquery: tables.carquery.over(ProviderSettings::carquery()),
        }
    }
}

/// One `[providers.*]` table as written; absent keys keep the preset.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProviderTable {
    base_url: Option<String>,
    api_key: Option<String>,
    credential_required: Option<bool>,
    timeout_seconds: Option<u64>,
    user_agent: Option<String>,
}

impl ProviderTable {
    fn over(self, preset: ProviderSettings) -> ProviderSettings {
        ProviderSettings {
            base_url: self.base_url.unwrap_or(preset.base_url),
            api_key: self.api_key.or(preset.api_key),
            credential_required: self.credential_required.or(preset.credential_required),
            timeout_seconds: self.timeout_seconds.unwrap_or(preset.timeout_seconds),
            user_agent: self.user_agent.or(preset.user_agent),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            auto_dev: ProviderSettings::auto_dev(),
            nhtsa: ProviderSettings::nhtsa(),
            carquery: ProviderSettings::carquery(),
        }
    }
}

/// Per-provider endpoint, credential and timeout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Overrides whether the adapter insists on `api_key` before calling.
    #[serde(default)]
    pub credential_required: Option<bool>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout_seconds() -> u64 {
    10
}

impl ProviderSettings {
    pub fn auto_dev() -> Self {
        Self {
            base_url: "https://api.auto.dev".to_string(),
            api_key: std::env::var(AUTO_DEV_API_KEY_ENV).ok(),
            credential_required: None,
            timeout_seconds: default_timeout_seconds(),
            user_agent: None,
        }
    }

    pub fn nhtsa() -> Self {
        Self {
            base_url: "https://vpic.nhtsa.dot.gov/api/vehicles".to_string(),
            api_key: None,
            credential_required: None,
            timeout_seconds: default_timeout_seconds(),
            user_agent: None,
        }
    }

    pub fn carquery() -> Self {
        Self {
            base_url: "https://www.carqueryapi.com/api/0.3".to_string(),
            api_key: None,
            credential_required: None,
            timeout_seconds: default_timeout_seconds(),
            // CarQuery rejects requests without a browser-like agent.
            user_agent: Some("Mozilla/5.0 (compatible; vin-profile/0.1)".to_string()),
        }
    }

    /// Settings pointing at `base_url`, mostly for mock servers.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// The key, unless it is empty or an unresolved `${VAR}` placeholder.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !(key.starts_with("${") && key.ends_with('}')))
    }

    fn validate_as(&self, section: &str) -> Result<()> {
        validation::validate_url(&format!("providers.{section}.base_url"), &self.base_url)?;
        validation::validate_range(
            &format!("providers.{section}.timeout_seconds"),
            self.timeout_seconds,
            1,
            120,
        )?;
        Ok(())
    }
}

/// Precedence lists as written in TOML. Missing lists fall back to the
/// built-in policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrecedenceConfig {
    #[serde(default)]
    pub identity: Option<Vec<ProviderId>>,
    #[serde(default)]
    pub engine: Option<Vec<ProviderId>>,
    #[serde(default)]
    pub economy: Option<Vec<ProviderId>>,
    #[serde(flatten)]
    pub overrides: BTreeMap<CanonicalField, Vec<ProviderId>>,
}

impl ServiceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ServiceError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ServiceError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${AUTO_DEV_API_KEY})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::{Captures, Regex};
        use std::sync::OnceLock;

        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let re = PLACEHOLDER.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
        });

        re.replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_socket_addr("server.bind", &self.server.bind)?;

        self.providers.auto_dev.validate_as("auto_dev")?;
        self.providers.nhtsa.validate_as("nhtsa")?;
        self.providers.carquery.validate_as("carquery")?;

        let groups = [
            ("precedence.identity", &self.precedence.identity),
            ("precedence.engine", &self.precedence.engine),
            ("precedence.economy", &self.precedence.economy),
        ];
        for (field, order) in groups {
            if let Some(order) = order {
                validation::validate_provider_order(field, order)?;
            }
        }
        for (field, order) in &self.precedence.overrides {
            validation::validate_provider_order(&format!("precedence.{}", field.as_str()), order)?;
        }

        Ok(())
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[server]
bind = "0.0.0.0:9000"

[providers.auto_dev]
base_url = "https://auto.example.com"
api_key = "secret"
credential_required = true
timeout_seconds = 5

[providers.nhtsa]
base_url = "https://nhtsa.example.com/api/vehicles"

[providers.carquery]
base_url = "https://carquery.example.com/api/0.3"
timeout_seconds = 20

[precedence]
identity = ["nhtsa", "auto_dev"]
fuel_type = ["carquery", "nhtsa"]
"#;

        let config = ServiceConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.providers.auto_dev.usable_api_key(), Some("secret"));
        assert_eq!(config.providers.auto_dev.timeout(), Duration::from_secs(5));
        assert_eq!(config.providers.nhtsa.timeout_seconds, 10);
        assert_eq!(config.providers.auto_dev.credential_required, Some(true));
        assert_eq!(config.providers.nhtsa.credential_required, None);
        assert_eq!(config.providers.carquery.timeout_seconds, 20);
        assert_eq!(
            config.precedence.identity,
            Some(vec![ProviderId::Nhtsa, ProviderId::AutoDev])
        );
        assert_eq!(
            config.precedence.overrides.get(&CanonicalField::FuelType),
            Some(&vec![ProviderId::CarQuery, ProviderId::Nhtsa])
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ServiceConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert_eq!(config.providers.nhtsa.base_url, "https://vpic.nhtsa.dot.gov/api/vehicles");
        assert!(config.providers.carquery.user_agent.is_some());
        assert!(config.precedence.overrides.is_empty());
    }

    #[test]
    fn test_provider_tables_keep_their_own_presets() {
        let toml_content = r#"
[providers.auto_dev]
timeout_seconds = 5

[providers.carquery]
base_url = "https://www.carqueryapi.com/api/0.3"
timeout_seconds = 10
"#;

        let config = ServiceConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.providers.auto_dev.base_url, "https://api.auto.dev");
        assert_eq!(config.providers.auto_dev.timeout_seconds, 5);
        assert_eq!(
            config.providers.carquery.user_agent,
            ProviderSettings::carquery().user_agent
        );
        assert!(config.providers.carquery.user_agent.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_auto_dev_table_without_key_falls_back_to_env() {
        std::env::set_var(AUTO_DEV_API_KEY_ENV, "env-key");

        let config =
            ServiceConfig::from_toml_str("[providers.auto_dev]\ntimeout_seconds = 3\n").unwrap();
        assert_eq!(config.providers.auto_dev.usable_api_key(), Some("env-key"));

        std::env::remove_var(AUTO_DEV_API_KEY_ENV);
    }

    #[test]
    fn test_unknown_provider_key_is_rejected() {
        let err = ServiceConfig::from_toml_str("[providers.nhtsa]\ntimeout = 3\n").unwrap_err();
        assert!(matches!(err, ServiceError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("VIN_PROFILE_TEST_KEY", "from-env");

        let toml_content = r#"
[providers.auto_dev]
base_url = "https://api.auto.dev"
api_key = "${VIN_PROFILE_TEST_KEY}"
credential_required = true
"#;

        let config = ServiceConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.providers.auto_dev.usable_api_key(), Some("from-env"));

        std::env::remove_var("VIN_PROFILE_TEST_KEY");
    }

    #[test]
    fn test_unresolved_placeholder_is_not_a_usable_key() {
        let toml_content = r#"
[providers.auto_dev]
base_url = "https://api.auto.dev"
api_key = "${VIN_PROFILE_SURELY_UNSET_VARIABLE}"
"#;

        let config = ServiceConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.providers.auto_dev.api_key.as_deref(),
            Some("${VIN_PROFILE_SURELY_UNSET_VARIABLE}")
        );
        assert_eq!(config.providers.auto_dev.usable_api_key(), None);
    }

    #[test]
    fn test_config_validation_rejects_bad_values() {
        let bad_url = r#"
[providers.nhtsa]
base_url = "not-a-url"
"#;
        assert!(ServiceConfig::from_toml_str(bad_url).unwrap().validate().is_err());

        let bad_timeout = r#"
[providers.carquery]
base_url = "https://www.carqueryapi.com/api/0.3"
timeout_seconds = 0
"#;
        assert!(ServiceConfig::from_toml_str(bad_timeout).unwrap().validate().is_err());

        let duplicate = r#"
[precedence]
engine = ["nhtsa", "nhtsa"]
"#;
        assert!(ServiceConfig::from_toml_str(duplicate).unwrap().validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nbind = \"127.0.0.1:9100\"\n")
            .unwrap();

        let config = ServiceConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9100");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ServiceConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ServiceError::IoError(_)));
    }
}
