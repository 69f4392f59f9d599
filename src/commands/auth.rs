//! Authentication command handler.
//!
//! `sheet-insights auth` exchanges the stored service account key for an access token. Nothing is
//! cached; every other command signs its own assertion, so this is purely a check that the key is
//! accepted by Google.

use crate::api::TokenProvider;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What the token endpoint said about the service account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenStatus {
    pub client_email: String,
    pub project_id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Handles the `sheet-insights auth` command.
///
/// # Errors
/// Returns an `Auth` error if the key file is missing or invalid, or if the token endpoint rejects
/// the signed assertion, and a `Transport` error if the token endpoint cannot be reached.
pub async fn auth(config: &Config) -> Result<Out<TokenStatus>> {
    let mut token_provider = TokenProvider::load(config.service_account_path())
        .await
        .context("Unable to use the service account key. You may need to run 'init' again.")
        .pub_result(ErrorType::Auth)?;

    let expires_at = token_provider
        .refresh()
        .await
        .context("The token request was rejected")
        .pub_result(ErrorType::Auth)?
        .expires_at();

    let key = token_provider.key();
    let status = TokenStatus {
        client_email: key.client_email().to_string(),
        project_id: key.project_id().map(str::to_string),
        expires_at,
    };
    Ok(Out::new(
        format!(
            "The service account key in {} is valid. Make sure the sheet is shared with {}.",
            token_provider.key_path().display(),
            status.client_email
        ),
        status,
    ))
}
