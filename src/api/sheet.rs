//! Implements the `Sheet` trait using the `sheets:Client` to interact with a Google sheet.

use crate::api::{Sheet, TokenProvider, SHEETS_API};
use crate::error::{ErrorType, IntoResult, Res};
use crate::model::DataRange;
use crate::{Config, Result};
use anyhow::{bail, Context};
use serde::Deserialize;
use sheets::types::{DateTimeRenderOption, Dimension, ValueRenderOption};
use sheets::ClientError;
use tracing::{debug, trace};

/// Used when the spreadsheet metadata lists no sheets.
const FALLBACK_SHEET_TITLE: &str = "Sheet1";

/// Implements the `Sheet` trait against the Sheets v4 API. It takes a `TokenProvider`, which it
/// asks for a valid token before every call.
pub(crate) struct GoogleSheet {
    spreadsheet_id: String,
    token_provider: TokenProvider,
    http: reqwest::Client,
}

impl GoogleSheet {
    pub(crate) fn new(config: &Config, token_provider: TokenProvider) -> Self {
        Self {
            spreadsheet_id: config.spreadsheet_id().to_string(),
            token_provider,
            http: reqwest::Client::new(),
        }
    }

    async fn access_token(&mut self) -> Result<String> {
        self.token_provider
            .token_with_refresh()
            .await
            .map(|t| t.value().to_string())
            .pub_result(ErrorType::Auth)
    }

    async fn fetch_metadata(&self, access_token: &str) -> Res<SpreadsheetMetadata> {
        let url = url::Url::parse_with_params(
            &format!("{SHEETS_API}/spreadsheets/{}", self.spreadsheet_id),
            &[("fields", "sheets.properties.title")],
        )
        .context("Unable to build the spreadsheet metadata URL")?;
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .context("Failed to send the spreadsheet metadata request")?;
        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read the spreadsheet metadata response")?;
        serde_json::from_str(&body)
            .with_context(|| format!("Unexpected spreadsheet metadata response ({status}): {body}"))
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn first_sheet_title(&mut self) -> Result<String> {
        let access_token = self.access_token().await?;
        let metadata = self
            .fetch_metadata(&access_token)
            .await
            .pub_result(ErrorType::SheetAccess)?;
        let title = metadata.first_title().pub_result(ErrorType::SheetAccess)?;
        debug!("First sheet of {} is '{title}'", self.spreadsheet_id);
        Ok(title)
    }

    async fn get(&mut self, range: &DataRange) -> Result<Vec<Vec<String>>> {
        trace!("get for {range}");
        let access_token = self.access_token().await?;
        let client = create_sheets_client(&access_token);
        let response = client
            .spreadsheets()
            .values_get(
                &self.spreadsheet_id,
                &range.to_string(),
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Sheets API Error: failed to fetch {range}"))
            .pub_result(ErrorType::SheetAccess)?;
        Ok(response.body.values)
    }
}

/// Creates a sheets client for one call with the given access token.
fn create_sheets_client(access_token: &str) -> sheets::Client {
    // The sheets crate requires client_id, client_secret, redirect_uri and refresh_token, but only
    // the access token is used for API calls.
    sheets::Client::new(
        String::new(),
        String::new(),
        String::new(),
        access_token.to_string(),
        String::new(),
    )
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    };
    anyhow::Error::new(e).context(error_name)
}

/// The subset of the spreadsheet resource requested with `fields=sheets.properties.title`.
#[derive(Debug, Default, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetMetadata>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
struct SheetMetadata {
    #[serde(default)]
    properties: Option<SheetProperties>,
}

#[derive(Debug, Default, Deserialize)]
struct SheetProperties {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
}

impl SpreadsheetMetadata {
    /// The title of the first sheet, or `Sheet1` when the spreadsheet lists none.
    fn first_title(self) -> Res<String> {
        if let Some(error) = self.error {
            match error.code {
                Some(code) => bail!("Sheets API Error ({code}): {}", error.message),
                None => bail!("Sheets API Error: {}", error.message),
            }
        }
        Ok(self
            .sheets
            .into_iter()
            .next()
            .and_then(|s| s.properties)
            .and_then(|p| p.title)
            .unwrap_or_else(|| FALLBACK_SHEET_TITLE.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(json: &str) -> SpreadsheetMetadata {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_first_title() {
        let m = metadata(
            r#"{"sheets":[{"properties":{"title":"Pengeluaran"}},{"properties":{"title":"Lain"}}]}"#,
        );
        assert_eq!(m.first_title().unwrap(), "Pengeluaran");
    }

    #[test]
    fn test_first_title_fallback() {
        assert_eq!(metadata("{}").first_title().unwrap(), "Sheet1");
        assert_eq!(
            metadata(r#"{"sheets":[{}]}"#).first_title().unwrap(),
            "Sheet1"
        );
    }

    #[test]
    fn test_first_title_api_error() {
        let m = metadata(
            r#"{"error":{"code":403,"message":"The caller does not have permission","status":"PERMISSION_DENIED"}}"#,
        );
        let err = m.first_title().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Sheets API Error (403): The caller does not have permission"
        );
    }

    #[test]
    fn test_map_client_error_keeps_source() {
        let e = map_client_error(ClientError::EmptyRefreshToken);
        assert_eq!(e.to_string(), "EmptyRefreshToken");
        assert!(e.chain().count() >= 2);
    }
}
