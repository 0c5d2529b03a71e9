//! JSON shapes and small pure helpers shared by the Google adapters.

use clienttrack_core::error::{RemoteError, RemoteResult};
use clienttrack_core::models::PhotoFile;
use clienttrack_core::remote::SheetProperties;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub thumbnail_link: Option<String>,
    pub web_content_link: Option<String>,
}

impl From<DriveFile> for PhotoFile {
    fn from(file: DriveFile) -> Self {
        PhotoFile {
            id: file.id,
            name: file.name,
            thumbnail_link: file.thumbnail_link,
            content_link: file.web_content_link,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedFile {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatedSpreadsheet {
    pub spreadsheet_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ValueRange {
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpreadsheetMeta {
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SheetEntry {
    pub properties: SheetEntryProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SheetEntryProperties {
    pub sheet_id: Option<i64>,
    #[serde(default)]
    pub title: String,
}

impl From<SheetEntry> for SheetProperties {
    fn from(entry: SheetEntry) -> Self {
        SheetProperties {
            sheet_id: entry.properties.sheet_id,
            title: entry.properties.title,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserInfo {
    pub email: Option<String>,
}

/// Quote a value for a Drive `q` expression.
pub(crate) fn quote_query_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

/// Drive query for live files of `mime_type` named exactly `name`.
pub(crate) fn named_query(name: &str, mime_type: &str) -> String {
    format!(
        "name = {} and mimeType = {} and trashed = false",
        quote_query_value(name),
        quote_query_value(mime_type)
    )
}

/// Drive query for the live children of `folder`.
pub(crate) fn children_query(folder: &str) -> String {
    format!("{} in parents and trashed = false", quote_query_value(folder))
}

/// Append path segments to `base`, encoding each one.
pub(crate) fn api_url(base: &str, segments: &[&str]) -> RemoteResult<Url> {
    let mut url = Url::parse(base)
        .map_err(|err| RemoteError::Transport(format!("invalid API base '{}': {}", base, err)))?;
    let mut path = url
        .path_segments_mut()
        .map_err(|_| RemoteError::Transport(format!("'{}' cannot be used as an API base", base)))?;
    path.pop_if_empty();
    for segment in segments {
        path.push(segment);
    }
    drop(path);
    Ok(url)
}

/// Human readable message from a Google error body.
///
/// Google APIs answer `{"error": {"message": ...}}`; the OAuth endpoints use
/// `{"error": "...", "error_description": ...}`.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let error = value.get("error");
        let message = error
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str)
            .or_else(|| value.get("error_description").and_then(Value::as_str))
            .or_else(|| error.and_then(Value::as_str));
        if let Some(message) = message {
            return message.to_string();
        }
    }
    body.trim().to_string()
}

/// Map a non-success response onto [`RemoteError`].
pub(crate) fn status_error(status: StatusCode, body: &str) -> RemoteError {
    let message = error_message(status, body);
    match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound(message),
        StatusCode::UNAUTHORIZED => RemoteError::Unauthorized,
        _ => RemoteError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

/// Render a cell the way the UI shows it.
pub(crate) fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => (if *flag { "TRUE" } else { "FALSE" }).to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn rows_to_strings(rows: Vec<Vec<Value>>) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_values_escape_quotes_and_backslashes() {
        assert_eq!(quote_query_value("plain"), "'plain'");
        assert_eq!(quote_query_value("O'Brien"), r"'O\'Brien'");
        assert_eq!(quote_query_value(r"a\b"), r"'a\\b'");
    }

    #[test]
    fn drive_queries_match_expected_shape() {
        assert_eq!(
            named_query("CustomerTrackerDB", "application/vnd.google-apps.spreadsheet"),
            "name = 'CustomerTrackerDB' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false"
        );
        assert_eq!(
            children_query("folder-1"),
            "'folder-1' in parents and trashed = false"
        );
    }

    #[test]
    fn api_url_encodes_a1_ranges_as_one_segment() {
        let url = api_url(
            "https://sheets.googleapis.com/v4/spreadsheets",
            &["abc", "values", "My Sheet!A2:E"],
        )
        .expect("url");
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/My%20Sheet!A2:E"
        );
    }

    #[test]
    fn api_url_rejects_bad_bases() {
        assert!(matches!(
            api_url("not a url", &["x"]),
            Err(RemoteError::Transport(_))
        ));
    }

    #[test]
    fn status_mapping_distinguishes_not_found_and_auth() {
        let body = r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#;
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, body),
            RemoteError::NotFound("Requested entity was not found.".to_string())
        );
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED, "{}"),
            RemoteError::Unauthorized
        );
        assert_eq!(
            status_error(StatusCode::BAD_REQUEST, "  "),
            RemoteError::Status {
                status: 400,
                message: "Bad Request".to_string()
            }
        );
    }

    #[test]
    fn error_message_understands_oauth_errors() {
        let body = r#"{"error":"invalid_token","error_description":"Invalid Value"}"#;
        assert_eq!(error_message(StatusCode::BAD_REQUEST, body), "Invalid Value");
        assert_eq!(
            error_message(StatusCode::FORBIDDEN, r#"{"error":"denied"}"#),
            "denied"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
    }

    #[test]
    fn cells_render_as_displayed_strings() {
        let rows = vec![vec![json!("A1"), json!(7), json!(true), Value::Null, json!(1.5)]];
        assert_eq!(
            rows_to_strings(rows),
            vec![vec![
                "A1".to_string(),
                "7".to_string(),
                "TRUE".to_string(),
                String::new(),
                "1.5".to_string()
            ]]
        );
    }

    #[test]
    fn drive_files_decode_into_photo_files() {
        let list: FileList = serde_json::from_value(json!({
            "files": [{
                "id": "f1",
                "name": "photo.jpg",
                "thumbnailLink": "https://lh3.example/abc=s220",
                "webContentLink": "https://drive.example/f1"
            }],
            "nextPageToken": "p2"
        }))
        .expect("decode");
        assert_eq!(list.next_page_token.as_deref(), Some("p2"));
        let photo: PhotoFile = list.files.into_iter().next().expect("file").into();
        assert_eq!(photo.id, "f1");
        assert_eq!(
            photo.full_size_link().as_deref(),
            Some("https://lh3.example/abc=s2000")
        );
    }

    #[test]
    fn sheet_metadata_tolerates_missing_ids() {
        let meta: SpreadsheetMeta = serde_json::from_value(json!({
            "sheets": [{"properties": {"title": "Customers"}}, {"properties": {"sheetId": 12, "title": "Old"}}]
        }))
        .expect("decode");
        let sheets: Vec<SheetProperties> = meta.sheets.into_iter().map(Into::into).collect();
        assert_eq!(sheets[0].sheet_id, None);
        assert_eq!(sheets[1].sheet_id, Some(12));
    }
}
