use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::{PhonePolicy, Session, TaxRate, User};
use crate::ports::{AppConfig, ConfigError, ConfigResult, ConfigStore, SessionStore};

const APP_DIR: &str = "creator-desk";
const KEYRING_USER: &str = "session_token";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    api_base_url: Option<String>,
    cache_ttl_seconds: Option<u64>,
    page_size: Option<usize>,
    project_tax_rate: Option<TaxRate>,
    invoice_tax_rate: Option<TaxRate>,
    financing_fee_percent: Option<Decimal>,
    phone_policy: Option<PhonePolicy>,
}

/// Keeps `config.json` and the signed-in profile (`user.json`) in the
/// per-user config directory. The token goes to the OS keyring when one is
/// available and to a `.token` file readable only by the owner otherwise.
pub struct FileConfigStore {
    config_dir: PathBuf,
    keyring_service: Option<String>,
}

impl FileConfigStore {
    pub fn new() -> ConfigResult<Self> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ConfigError::ReadError("Cannot determine config directory".to_string())
        })?;

        Ok(Self {
            config_dir: config_dir.join(APP_DIR),
            keyring_service: Some(APP_DIR.to_string()),
        })
    }

    /// A store rooted at `dir` that never touches the OS keyring.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: dir.into(),
            keyring_service: None,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    fn user_path(&self) -> PathBuf {
        self.config_dir.join("user.json")
    }

    fn token_file_path(&self) -> PathBuf {
        self.config_dir.join(".token")
    }

    async fn ensure_config_dir(&self) -> ConfigResult<()> {
        fs::create_dir_all(&self.config_dir)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))
    }

    fn keyring_entry(&self) -> Option<keyring::Entry> {
        let service = self.keyring_service.as_deref()?;
        match keyring::Entry::new(service, KEYRING_USER) {
            Ok(entry) => Some(entry),
            Err(_) => {
                tracing::warn!("Keyring service not available, falling back to file storage");
                None
            }
        }
    }

    async fn get_token_from_file(&self) -> ConfigResult<Option<String>> {
        match fs::read_to_string(self.token_file_path()).await {
            Ok(token) => Ok(Some(token.trim().to_string()).filter(|t| !t.is_empty())),
            Err(_) => Ok(None),
        }
    }

    async fn set_token_in_file(&self, token: &str) -> ConfigResult<()> {
        self.ensure_config_dir().await?;
        let token_path = self.token_file_path();
        fs::write(&token_path, token)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&token_path)
                .await
                .map_err(|e| ConfigError::WriteError(e.to_string()))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&token_path, perms)
                .await
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        Ok(())
    }

    async fn get_token(&self) -> ConfigResult<Option<String>> {
        if let Some(entry) = self.keyring_entry() {
            match entry.get_password() {
                Ok(token) => return Ok(Some(token)),
                Err(keyring::Error::NoEntry) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Keyring not available, falling back to file storage");
                }
            }
        }

        self.get_token_from_file().await
    }

    async fn set_token(&self, token: &str) -> ConfigResult<()> {
        if let Some(entry) = self.keyring_entry() {
            match entry.set_password(token) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to store in keyring, falling back to file storage");
                }
            }
        }

        self.set_token_in_file(token).await
    }

    async fn remove_file(path: &Path) -> ConfigResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConfigError::WriteError(e.to_string())),
        }
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load_config(&self) -> ConfigResult<AppConfig> {
        let content = match fs::read_to_string(self.config_path()).await {
            Ok(content) => content,
            Err(_) => return Ok(AppConfig::default()),
        };

        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        let defaults = AppConfig::default();

        Ok(AppConfig {
            api_base_url: file
                .api_base_url
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.api_base_url),
            cache_ttl_seconds: file.cache_ttl_seconds.unwrap_or(defaults.cache_ttl_seconds),
            page_size: file
                .page_size
                .filter(|size| *size > 0)
                .unwrap_or(defaults.page_size),
            project_tax_rate: file.project_tax_rate.unwrap_or(defaults.project_tax_rate),
            invoice_tax_rate: file.invoice_tax_rate.unwrap_or(defaults.invoice_tax_rate),
            financing_fee_percent: file
                .financing_fee_percent
                .unwrap_or(defaults.financing_fee_percent),
            phone_policy: file.phone_policy.unwrap_or(defaults.phone_policy),
        })
    }

    async fn save_config(&self, config: &AppConfig) -> ConfigResult<()> {
        self.ensure_config_dir().await?;

        let file = ConfigFile {
            api_base_url: Some(config.api_base_url.clone()),
            cache_ttl_seconds: Some(config.cache_ttl_seconds),
            page_size: Some(config.page_size),
            project_tax_rate: Some(config.project_tax_rate),
            invoice_tax_rate: Some(config.invoice_tax_rate),
            financing_fee_percent: Some(config.financing_fee_percent),
            phone_policy: Some(config.phone_policy),
        };

        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        fs::write(self.config_path(), content)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for FileConfigStore {
    async fn load_session(&self) -> ConfigResult<Option<Session>> {
        let Some(token) = self.get_token().await? else {
            return Ok(None);
        };

        let content = match fs::read_to_string(self.user_path()).await {
            Ok(content) => content,
            Err(_) => {
                tracing::debug!("token present but no stored user profile");
                return Ok(None);
            }
        };

        match serde_json::from_str::<User>(&content) {
            Ok(user) => Ok(Some(Session { token, user })),
            Err(e) => {
                tracing::warn!(error = %e, "stored user profile is malformed, ignoring session");
                Ok(None)
            }
        }
    }

    async fn save_session(&self, session: &Session) -> ConfigResult<()> {
        self.ensure_config_dir().await?;
        self.set_token(&session.token).await?;

        let content = serde_json::to_string_pretty(&session.user)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        fs::write(self.user_path(), content)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))
    }

    async fn clear_session(&self) -> ConfigResult<()> {
        if let Some(entry) = self.keyring_entry() {
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => tracing::warn!(error = %e, "Failed to remove keyring entry"),
            }
        }

        Self::remove_file(&self.token_file_path()).await?;
        Self::remove_file(&self.user_path()).await
    }
}
