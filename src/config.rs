//! Configuration file handling for sheet-insights.
//!
//! The configuration file is stored at `$SHEET_INSIGHTS_HOME/config.json` and contains the Google
//! Sheet URL, the location of the service account key and the Gemini model to ask for analyses.

use crate::error::{Error, ErrorType, IntoResult, Res};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "sheet-insights";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const SERVICE_ACCOUNT_JSON: &str = "service_account.json";
const CONFIG_JSON: &str = "config.json";

/// The model asked for analyses unless `gemini_model` says otherwise.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

/// Environment variables that may hold the Gemini API key, in order of preference.
const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$SHEET_INSIGHTS_HOME` and from there it loads `config.json`. It provides paths to
/// other items that are either configurable or are expected in a certain location within the
/// home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet_id: String,
}

impl Config {
    /// Creates the home directory, its secrets directory and:
    /// - Creates an initial `config.json` file using `sheet_url` along with default settings
    /// - Copies `service_account` into its default location in the secrets directory, readable
    ///   only by its owner.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g.
    ///   `$HOME/sheet-insights`
    /// - `service_account` - The downloaded service account key JSON.
    /// - `sheet_url` - The URL of the Google Sheet where the expenses are recorded, e.g.
    ///   https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    pub async fn create(
        dir: impl Into<PathBuf>,
        service_account: &Path,
        sheet_url: &str,
    ) -> Result<Self> {
        Self::create_inner(dir.into(), service_account, sheet_url)
            .await
            .pub_result(ErrorType::Config)
    }

    async fn create_inner(
        maybe_relative: PathBuf,
        service_account: &Path,
        sheet_url: &str,
    ) -> Res<Self> {
        // Validate the URL before touching the disk
        let spreadsheet_id = extract_spreadsheet_id(sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();

        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the sheet-insights home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;

        let key_destination = secrets_dir.join(SERVICE_ACCOUNT_JSON);
        utils::copy(service_account, &key_destination).await?;
        utils::restrict_permissions(&key_destination)?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            sheet_url: sheet_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets: secrets_dir,
            config_path,
            config_file,
            spreadsheet_id,
        })
    }

    /// This will
    /// - validate that the home directory exists and that the config file exists
    /// - load the config file
    /// - validate that the secrets directory exists
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The sheet-insights home directory is missing, run 'init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let spreadsheet_id = extract_spreadsheet_id(&config_file.sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();

        let config = Self {
            secrets: root.join(SECRETS),
            root,
            config_path,
            config_file,
            spreadsheet_id,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn sheet_url(&self) -> &str {
        &self.config_file.sheet_url
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn gemini_model(&self) -> &str {
        self.config_file.gemini_model()
    }

    /// Returns the stored `service_account_path` if it is absolute, otherwise resolves it against
    /// the home directory.
    pub fn service_account_path(&self) -> PathBuf {
        let p = self.config_file.service_account_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// Reads the Gemini API key from `GEMINI_API_KEY`, falling back to `API_KEY`.
    pub fn gemini_api_key(&self) -> Result<String> {
        api_key_from(|name| std::env::var(name).ok())
    }
}

/// Returns the first non-empty value of `API_KEY_VARS` as seen through `lookup`.
fn api_key_from<F>(lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .ok_or_else(|| {
            Error::msg(
                ErrorType::Config,
                format!(
                    "No Gemini API key found; set {} or pass --no-analysis",
                    API_KEY_VARS.join(" or ")
                ),
            )
        })
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "sheet-insights",
///   "config_version": 1,
///   "sheet_url": "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
///   "service_account_path": ".secrets/service_account.json",
///   "gemini_model": "gemini-3-flash-preview"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "sheet-insights"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// URL to the expense Google Sheet
    sheet_url: String,

    /// Path to the service account key (optional, relative to the home directory or absolute).
    /// Defaults to $SHEET_INSIGHTS_HOME/.secrets/service_account.json if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    service_account_path: Option<PathBuf>,

    /// The Gemini model used for analyses. Defaults to `DEFAULT_GEMINI_MODEL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gemini_model: Option<String>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: String::new(),
            service_account_path: None,
            gemini_model: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path and validates its `app_name`.
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .context("Unable to load the config file")?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version <= CONFIG_VERSION,
            "Unsupported config_version {}, this build reads up to {}",
            config.config_version,
            CONFIG_VERSION
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }

    /// If None, defaults to .secrets/service_account.json
    fn service_account_path(&self) -> PathBuf {
        self.service_account_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(SERVICE_ACCOUNT_JSON))
    }

    fn gemini_model(&self) -> &str {
        self.gemini_model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_GEMINI_MODEL)
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL
///
/// # Arguments
/// * `url` - The Google Sheets URL (e.g., "https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...")
fn extract_spreadsheet_id(url: &str) -> Res<&str> {
    // URL format: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...
    // or: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID?foo=bar
    let parts: Vec<&str> = url.trim().split('/').collect();
    for pair in parts.windows(2) {
        if pair[0] == "d" {
            let id = pair[1]
                .split(['?', '#'])
                .next()
                .unwrap_or_default();
            if id.is_empty() {
                break;
            }
            return Ok(id);
        }
    }
    bail!(
        "Invalid Google Sheets URL '{url}'. Expected: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const URL: &str =
        "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL/edit";

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("insights_home");
        let key_source = dir.path().join("key.json");
        let key_content = r#"{"type":"service_account"}"#;
        utils::write(&key_source, key_content).await.unwrap();

        let config = Config::create(&home_dir, &key_source, URL).await.unwrap();

        assert_eq!(URL, config.sheet_url());
        assert_eq!(
            "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
            config.spreadsheet_id()
        );
        assert_eq!(config.gemini_model(), DEFAULT_GEMINI_MODEL);

        // The key is copied, not moved
        let copied = utils::read(&config.service_account_path()).await.unwrap();
        assert_eq!(key_content, copied);
        assert!(key_source.is_file());
        assert!(config.secrets().is_dir());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(config.service_account_path())
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn test_config_create_rejects_bad_url() {
        let dir = TempDir::new().unwrap();
        let key_source = dir.path().join("key.json");
        utils::write(&key_source, "{}").await.unwrap();
        let err = Config::create(dir.path().join("home"), &key_source, "https://example.com/x")
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        assert!(!dir.path().join("home").exists());
    }

    #[tokio::test]
    async fn test_config_create_then_load() {
        let dir = TempDir::new().unwrap();
        let key_source = dir.path().join("key.json");
        utils::write(&key_source, "{}").await.unwrap();
        let created = Config::create(dir.path(), &key_source, URL).await.unwrap();
        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(created.root(), loaded.root());
        assert_eq!(created.spreadsheet_id(), loaded.spreadsheet_id());
        assert_eq!(loaded.config_path(), loaded.root().join(CONFIG_JSON));
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        assert!(err.message().contains("run 'init' first"));
    }

    #[tokio::test]
    async fn test_config_file_load_with_overrides() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(CONFIG_JSON);
        let json = r#"{
            "app_name": "sheet-insights",
            "config_version": 1,
            "sheet_url": "https://docs.google.com/spreadsheets/d/minimal",
            "service_account_path": "/etc/keys/reader.json",
            "gemini_model": "gemini-2.5-flash"
        }"#;
        utils::write(&config_path, json).await.unwrap();
        std::fs::create_dir(dir.path().join(SECRETS)).unwrap();

        let config = Config::load(dir.path()).await.unwrap();
        assert_eq!(config.spreadsheet_id(), "minimal");
        assert_eq!(
            config.service_account_path(),
            PathBuf::from("/etc/keys/reader.json")
        );
        assert_eq!(config.gemini_model(), "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(CONFIG_JSON);
        let json = r#"{
            "app_name": "expense-sync",
            "config_version": 1,
            "sheet_url": "https://docs.google.com/spreadsheets/d/test"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let err = ConfigFile::load(&config_path).await.unwrap_err();
        assert!(err.to_string().contains("Invalid app_name"));
    }

    #[test]
    fn test_config_file_default() {
        let config = ConfigFile::default();
        assert_eq!(config.sheet_url, "");
        assert_eq!(
            config.service_account_path(),
            PathBuf::from(SECRETS).join(SERVICE_ACCOUNT_JSON)
        );
        assert_eq!(config.gemini_model(), DEFAULT_GEMINI_MODEL);

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("service_account_path"));
        assert!(!json.contains("gemini_model"));
    }

    #[test]
    fn test_extract_spreadsheet_id() {
        assert_eq!(
            extract_spreadsheet_id(URL).unwrap(),
            "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL"
        );
        assert_eq!(
            extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/ABC123?foo=bar").unwrap(),
            "ABC123"
        );
        assert_eq!(
            extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/ABC123#gid=0").unwrap(),
            "ABC123"
        );
        assert!(extract_spreadsheet_id("https://example.com/invalid").is_err());
        assert!(extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/").is_err());
        assert!(extract_spreadsheet_id("").is_err());
    }

    #[test]
    fn test_api_key_lookup() {
        let vars: HashMap<&str, &str> = [("API_KEY", "fallback")].into();
        let key = api_key_from(|n| vars.get(n).map(|v| v.to_string())).unwrap();
        assert_eq!(key, "fallback");

        let vars: HashMap<&str, &str> = [("API_KEY", "fallback"), ("GEMINI_API_KEY", "primary")].into();
        let key = api_key_from(|n| vars.get(n).map(|v| v.to_string())).unwrap();
        assert_eq!(key, "primary");

        let vars: HashMap<&str, &str> = [("GEMINI_API_KEY", "  ")].into();
        let err = api_key_from(|n| vars.get(n).map(|v| v.to_string())).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }
}
