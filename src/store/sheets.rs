use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    store::{auth::ServiceAccountAuth, CellRange, Row, TabularStore},
};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct ValuesBody<'a> {
    values: &'a [Row],
}

/// Google Sheets v4 values API, authenticated as a service account.
pub struct SheetsStore {
    http: reqwest::Client,
    auth: ServiceAccountAuth,
    spreadsheet_url: Url,
}

impl SheetsStore {
    pub fn new(config: &Config) -> AppResult<Self> {
        let spreadsheet_id = config.spreadsheet_id.as_deref().ok_or_else(|| {
            AppError::ValidationError("GOOGLE_SPREADSHEET_ID not configured".to_string())
        })?;
        let key = config.service_account.as_ref().ok_or_else(|| {
            AppError::AuthError("Missing Google Service Account credentials".to_string())
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.store_timeout)
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            auth: ServiceAccountAuth::new(key, http.clone())?,
            http,
            spreadsheet_url: spreadsheet_url(spreadsheet_id)?,
        })
    }

    fn values_url(&self, target: &str) -> AppResult<Url> {
        values_url(&self.spreadsheet_url, target)
    }
}

fn spreadsheet_url(spreadsheet_id: &str) -> AppResult<Url> {
    let mut url = Url::parse(SHEETS_API_BASE)
        .map_err(|e| AppError::InternalError(format!("Invalid Sheets API base: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| AppError::InternalError("Sheets API base cannot be a base".to_string()))?
        .pop_if_empty()
        .push(spreadsheet_id);
    Ok(url)
}

/// `.../spreadsheets/{id}/values/{target}` with the target percent-encoded as one segment.
fn values_url(spreadsheet: &Url, target: &str) -> AppResult<Url> {
    let mut url = spreadsheet.clone();
    url.path_segments_mut()
        .map_err(|_| AppError::InternalError("Spreadsheet URL cannot be a base".to_string()))?
        .push("values")
        .push(target);
    Ok(url)
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TabularStore for SheetsStore {
    async fn read(&self, table: &str, range: CellRange) -> AppResult<Vec<Row>> {
        let url = self.values_url(&format!("{}!{}", table, range))?;
        let token = self.auth.access_token().await?;

        let body: ValueRange = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        log::debug!("Read {} rows from {}!{}", body.values.len(), table, range);

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    async fn append(&self, table: &str, rows: Vec<Row>) -> AppResult<()> {
        let mut url = self.values_url(&format!("{}!A:Z:append", table))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let token = self.auth.access_token().await?;

        self.http
            .post(url)
            .bearer_auth(token)
            .json(&ValuesBody { values: &rows })
            .send()
            .await?
            .error_for_status()?;

        log::debug!("Appended {} rows to {}", rows.len(), table);
        Ok(())
    }

    async fn update(&self, table: &str, range: CellRange, rows: Vec<Row>) -> AppResult<()> {
        let mut url = self.values_url(&format!("{}!{}", table, range))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        let token = self.auth.access_token().await?;

        self.http
            .put(url)
            .bearer_auth(token)
            .json(&ValuesBody { values: &rows })
            .send()
            .await?
            .error_for_status()?;

        log::debug!("Updated {}!{}", table, range);
        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        let token = self.auth.access_token().await?;

        self.http
            .get(self.spreadsheet_url.clone())
            .query(&[("fields", "spreadsheetId")])
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
