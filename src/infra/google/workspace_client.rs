// =============================================================================
// GOOGLE WORKSPACE CLIENT - Drive, Slides and Sheets
// =============================================================================
//
// REST adapter behind the `DocumentStore` and `SpreadsheetReader` ports.
// Templates are Slides presentations kept in (possibly shared) Drive folders,
// so every Drive call passes `supportsAllDrives=true`.

use super::service_account::{
    AuthError, GoogleAuth, DRIVE_SCOPE, SHEETS_READONLY_SCOPE, SLIDES_SCOPE,
};
use crate::core::documents::{DocumentStore, SpreadsheetReader, WorkspaceError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SLIDES_URL: &str = "https://slides.googleapis.com/v1/presentations";
const SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

impl From<reqwest::Error> for WorkspaceError {
    fn from(err: reqwest::Error) -> Self {
        WorkspaceError::Network(err.to_string())
    }
}

impl From<AuthError> for WorkspaceError {
    fn from(err: AuthError) -> Self {
        WorkspaceError::Auth(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Sends the request and maps non-2xx answers to `WorkspaceError::Api`.
async fn send(
    service: &'static str,
    request: RequestBuilder,
) -> Result<reqwest::Response, WorkspaceError> {
    let response = request.send().await?;
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!("{} API returned {}: {}", service, status, body);
    Err(WorkspaceError::Api {
        service,
        status,
        body,
    })
}

fn replace_all_text_requests(replacements: &BTreeMap<String, String>) -> Value {
    let requests: Vec<Value> = replacements
        .iter()
        .map(|(needle, value)| {
            json!({
                "replaceAllText": {
                    "containsText": { "text": needle, "matchCase": true },
                    "replaceText": value,
                }
            })
        })
        .collect();
    json!({ "requests": requests })
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn values_url(sheet_id: &str, range: &str) -> Result<Url, WorkspaceError> {
    let mut url = Url::parse(SHEETS_URL)
        .map_err(|e| WorkspaceError::InvalidResponse(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| WorkspaceError::InvalidResponse("Sheets URL cannot be a base".to_string()))?
        .extend([sheet_id, "values", range]);
    Ok(url)
}

/// Drive/Slides/Sheets client authenticated through `GoogleAuth`.
pub struct GoogleWorkspaceClient {
    client: Client,
    auth: GoogleAuth,
}

impl GoogleWorkspaceClient {
    pub fn new(auth: GoogleAuth) -> Self {
        Self {
            client: Client::new(),
            auth,
        }
    }

    async fn token(&self, scope: &str) -> Result<String, WorkspaceError> {
        Ok(self.auth.access_token(&[scope]).await?)
    }
}

#[async_trait]
impl DocumentStore for GoogleWorkspaceClient {
    async fn copy_template(
        &self,
        template_id: &str,
        title: &str,
        folder_id: &str,
    ) -> Result<String, WorkspaceError> {
        let token = self.token(DRIVE_SCOPE).await?;
        let request = self
            .client
            .post(format!("{}/{}/copy", DRIVE_FILES_URL, template_id))
            .query(&[("supportsAllDrives", "true")])
            .bearer_auth(token)
            .json(&json!({ "name": title, "parents": [folder_id] }));

        let file: DriveFile = send("Drive", request).await?.json().await?;
        tracing::info!("Copied template {} to {} ({})", template_id, file.id, title);
        Ok(file.id)
    }

    async fn fill_placeholders(
        &self,
        document_id: &str,
        replacements: &BTreeMap<String, String>,
    ) -> Result<(), WorkspaceError> {
        if replacements.is_empty() {
            return Ok(());
        }

        let token = self.token(SLIDES_SCOPE).await?;
        let request = self
            .client
            .post(format!("{}/{}:batchUpdate", SLIDES_URL, document_id))
            .bearer_auth(token)
            .json(&replace_all_text_requests(replacements));

        send("Slides", request).await?;
        tracing::debug!(
            "Replaced {} placeholders in {}",
            replacements.len(),
            document_id
        );
        Ok(())
    }

    async fn share_document(&self, document_id: &str, email: &str) -> Result<(), WorkspaceError> {
        let token = self.token(DRIVE_SCOPE).await?;
        let request = self
            .client
            .post(format!("{}/{}/permissions", DRIVE_FILES_URL, document_id))
            .query(&[
                ("sendNotificationEmail", "false"),
                ("supportsAllDrives", "true"),
            ])
            .bearer_auth(token)
            .json(&json!({ "type": "user", "role": "writer", "emailAddress": email }));

        send("Drive", request).await?;
        Ok(())
    }

    async fn export_document(
        &self,
        document_id: &str,
        mime_type: &str,
    ) -> Result<Vec<u8>, WorkspaceError> {
        let token = self.token(DRIVE_SCOPE).await?;
        let request = self
            .client
            .get(format!("{}/{}/export", DRIVE_FILES_URL, document_id))
            .query(&[("mimeType", mime_type)])
            .bearer_auth(token);

        let bytes = send("Drive", request).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpreadsheetReader for GoogleWorkspaceClient {
    async fn read_range(
        &self,
        sheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, WorkspaceError> {
        let token = self.token(SHEETS_READONLY_SCOPE).await?;
        let request = self
            .client
            .get(values_url(sheet_id, range)?)
            .bearer_auth(token);

        let body: ValueRange = send("Sheets", request).await?.json().await?;
        Ok(body
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_requests_match_case() {
        let mut replacements = BTreeMap::new();
        replacements.insert("{{client_name}}".to_string(), "ACME".to_string());

        let body = replace_all_text_requests(&replacements);

        let request = &body["requests"][0]["replaceAllText"];
        assert_eq!(request["containsText"]["text"], "{{client_name}}");
        assert_eq!(request["containsText"]["matchCase"], true);
        assert_eq!(request["replaceText"], "ACME");
    }

    #[test]
    fn test_values_url_encodes_range() {
        let url = values_url("sheet123", "Sheet1!A2:J").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet123/values/Sheet1!A2:J"
        );

        let spaced = values_url("s", "People List!A2:J").unwrap();
        assert!(spaced.as_str().ends_with("/values/People%20List!A2:J"));
    }

    #[test]
    fn test_value_range_cells_become_text() {
        let body: ValueRange =
            serde_json::from_str(r#"{"range": "Sheet1!A2:J", "values": [["1", "Jane", 42]]}"#)
                .unwrap();
        let rows: Vec<Vec<String>> = body
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        assert_eq!(rows, vec![vec!["1", "Jane", "42"]]);

        let empty: ValueRange = serde_json::from_str(r#"{"range": "Sheet1!A2:J"}"#).unwrap();
        assert!(empty.values.is_empty());
    }
}
