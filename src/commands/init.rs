use crate::api::ServiceAccountKey;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its secrets subdirectory and:
/// - Creates an initial `config.json` file using `sheet_url` along with default settings
/// - Copies `service_account` into its default location in the secrets directory.
///
/// # Arguments
/// - `home` - The directory that will hold the configuration, e.g. `$HOME/sheet-insights`
/// - `service_account` - The downloaded service account key JSON. It is checked, then copied from
///   the `service_account` path to its default location and name in the secrets directory.
/// - `sheet_url` - The URL of the Google Sheet where the expenses are kept.
///   e.g. https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
///
/// # Errors
/// - Returns an `Auth` error if the key file is not a service account key.
/// - Returns a `Config` error if the URL is not a sheet URL or any file operation fails.
pub async fn init(home: &Path, service_account: &Path, sheet_url: &str) -> Result<Out<()>> {
    let key = ServiceAccountKey::load(service_account)
        .await
        .context("The file given as --service-account is not a usable service account key")
        .pub_result(ErrorType::Auth)?;

    let config = Config::create(home, service_account, sheet_url).await?;

    Ok(format!(
        "Created {}. Share the sheet with {} (read access is enough), then run 'auth' to check \
        the key.",
        config.root().display(),
        key.client_email()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{write_service_account, SHEET_URL};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let key = write_service_account(dir.path());
        let home = dir.path().join("home");

        let out = init(&home, &key, SHEET_URL).await.unwrap();
        assert!(out.message().contains("insights@example.iam.gserviceaccount.com"));

        let config = Config::load(&home).await.unwrap();
        assert_eq!(config.sheet_url(), SHEET_URL);
        assert!(config.service_account_path().is_file());
    }

    #[tokio::test]
    async fn test_init_rejects_bad_key() {
        let dir = TempDir::new().unwrap();
        let key = dir.path().join("key.json");
        std::fs::write(&key, r#"{"installed": {"client_id": "x"}}"#).unwrap();
        let home = dir.path().join("home");

        let err = init(&home, &key, SHEET_URL).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Auth);
        assert!(!home.exists());
    }

    #[tokio::test]
    async fn test_init_rejects_bad_url() {
        let dir = TempDir::new().unwrap();
        let key = write_service_account(dir.path());
        let home = dir.path().join("home");

        let err = init(&home, &key, "https://example.com/nothing")
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }
}
