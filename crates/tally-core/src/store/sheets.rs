//! Google Sheets row store adapter
//!
//! Thin client for the Sheets values API. Each logical table is one sheet
//! (tab) addressed by its title. Authentication is a bearer access token
//! supplied by the caller; obtaining and refreshing that token is outside
//! this crate.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Error, Result};

use super::RowStore;

const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Bounded timeout for every store round trip
const STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Google Sheets backing store
pub struct SheetsStore {
    http_client: Client,
    spreadsheet_id: String,
    token: String,
    /// Sheet title -> numeric sheet id, needed for row deletion.
    /// Populated lazily from spreadsheet metadata.
    sheet_ids: Arc<RwLock<HashMap<String, i64>>>,
}

impl Clone for SheetsStore {
    fn clone(&self) -> Self {
        Self {
            http_client: self.http_client.clone(),
            spreadsheet_id: self.spreadsheet_id.clone(),
            token: self.token.clone(),
            sheet_ids: self.sheet_ids.clone(),
        }
    }
}

impl SheetsStore {
    pub fn new(spreadsheet_id: &str, token: &str) -> Self {
        let http_client = Client::builder()
            .timeout(STORE_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            spreadsheet_id: spreadsheet_id.to_string(),
            token: token.to_string(),
            sheet_ids: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn values_url(&self, suffix: &str) -> String {
        format!("{}/{}/values/{}", SHEETS_BASE, self.spreadsheet_id, suffix)
    }

    /// Map an HTTP status on a table-scoped request to the error taxonomy
    async fn check_status(&self, response: reqwest::Response, table: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(table, %status, body, "Sheets API error");
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::BAD_REQUEST {
            // The values API reports an unknown sheet title as 400 "Unable to
            // parse range", a bad spreadsheet id as 404.
            Err(Error::TableNotFound(table.to_string()))
        } else {
            Err(Error::StoreUnavailable(format!("{}: {}", status, body)))
        }
    }

    fn wrap_send_err(err: reqwest::Error, table: &str) -> Error {
        Error::from_store_http(err, table)
    }

    /// Resolve the numeric sheet id for a table title, caching the mapping
    async fn sheet_id(&self, table: &str) -> Result<i64> {
        if let Some(id) = self.sheet_ids.read().await.get(table) {
            return Ok(*id);
        }

        let url = format!(
            "{}/{}?fields=sheets.properties",
            SHEETS_BASE, self.spreadsheet_id
        );
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Self::wrap_send_err(e, table))?;
        let response = self.check_status(response, table).await?;

        #[derive(Deserialize)]
        struct Meta {
            sheets: Vec<SheetEntry>,
        }
        #[derive(Deserialize)]
        struct SheetEntry {
            properties: SheetProps,
        }
        #[derive(Deserialize)]
        struct SheetProps {
            #[serde(rename = "sheetId")]
            sheet_id: i64,
            title: String,
        }

        let meta: Meta = response.json().await?;
        let mut ids = self.sheet_ids.write().await;
        for sheet in &meta.sheets {
            ids.insert(sheet.properties.title.clone(), sheet.properties.sheet_id);
        }
        ids.get(table)
            .copied()
            .ok_or_else(|| Error::TableNotFound(table.to_string()))
    }
}

/// Convert a 0-based column index to an A1 column letter (0 -> A, 25 -> Z, 26 -> AA)
fn col_letter(mut col: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_else(|_| "A".to_string())
}

#[async_trait]
impl RowStore for SheetsStore {
    async fn list_rows(&self, table: &str) -> Result<Vec<Vec<String>>> {
        let response = self
            .http_client
            .get(self.values_url(table))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Self::wrap_send_err(e, table))?;
        let response = self.check_status(response, table).await?;

        #[derive(Deserialize)]
        struct ValueRange {
            #[serde(default)]
            values: Vec<Vec<String>>,
        }

        let range: ValueRange = response.json().await?;
        Ok(range.values)
    }

    async fn append_row(&self, table: &str, values: &[String]) -> Result<()> {
        let url = format!(
            "{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.values_url(table)
        );
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "values": [values] }))
            .send()
            .await
            .map_err(|e| Self::wrap_send_err(e, table))?;
        self.check_status(response, table).await?;
        debug!(table, cells = values.len(), "Appended row");
        Ok(())
    }

    async fn update_cell(&self, table: &str, row: usize, col: usize, value: &str) -> Result<()> {
        // A1 notation is 1-based
        let range = format!("{}!{}{}", table, col_letter(col), row + 1);
        let url = format!(
            "{}?valueInputOption=USER_ENTERED",
            self.values_url(&range)
        );
        let response = self
            .http_client
            .put(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "values": [[value]] }))
            .send()
            .await
            .map_err(|e| Self::wrap_send_err(e, table))?;
        self.check_status(response, table).await?;
        debug!(table, row, col, "Updated cell");
        Ok(())
    }

    async fn delete_row(&self, table: &str, row: usize) -> Result<()> {
        let sheet_id = self.sheet_id(table).await?;
        let url = format!("{}/{}:batchUpdate", SHEETS_BASE, self.spreadsheet_id);
        let body = json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": row,
                        "endIndex": row + 1,
                    }
                }
            }]
        });
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::wrap_send_err(e, table))?;
        self.check_status(response, table).await?;
        debug!(table, row, "Deleted row");
        Ok(())
    }
}
