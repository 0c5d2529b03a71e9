//! Google Sheets (values + batchUpdate) behind [`TabularStore`].

use crate::client::GoogleClient;
use crate::wire::{named_query, rows_to_strings, CreatedSpreadsheet, FileList, SpreadsheetMeta, ValueRange};
use async_trait::async_trait;
use clienttrack_core::constants::SPREADSHEET_MIME_TYPE;
use clienttrack_core::error::RemoteResult;
use clienttrack_core::remote::{A1Range, SheetProperties, TabularStore, ValueInput};
use serde_json::json;
use tracing::info;

fn input_option(input: ValueInput) -> &'static str {
    match input {
        ValueInput::Raw => "RAW",
        ValueInput::UserEntered => "USER_ENTERED",
    }
}

#[async_trait]
impl TabularStore for GoogleClient {
    async fn find_store(&self, name: &str) -> RemoteResult<Option<String>> {
        let url = self.drive_url(&[])?;
        let query = named_query(name, SPREADSHEET_MIME_TYPE);
        let list: FileList = self
            .send_json(
                self.http
                    .get(url)
                    .query(&[("q", query.as_str()), ("fields", "files(id)"), ("pageSize", "1")]),
            )
            .await?;
        Ok(list.files.into_iter().next().map(|file| file.id))
    }

    async fn create_store(
        &self,
        name: &str,
        sheet_title: &str,
        header: &[String],
    ) -> RemoteResult<String> {
        let body = json!({
            "properties": { "title": name },
            "sheets": [{ "properties": { "title": sheet_title } }],
        });
        let created: CreatedSpreadsheet = self
            .send_json(self.http.post(self.sheets_url(&[])?).json(&body))
            .await?;
        info!("created spreadsheet '{}' ({})", name, created.spreadsheet_id);

        if !header.is_empty() {
            let range = A1Range::row_span(sheet_title, 0, header.len() - 1, 1);
            self.update_range(
                &created.spreadsheet_id,
                &range,
                &[header.to_vec()],
                ValueInput::Raw,
            )
            .await?;
        }
        Ok(created.spreadsheet_id)
    }

    async fn read_range(&self, store: &str, range: &A1Range) -> RemoteResult<Vec<Vec<String>>> {
        let range = range.to_string();
        let url = self.sheets_url(&[store, "values", range.as_str()])?;
        let values: ValueRange = self.send_json(self.http.get(url)).await?;
        Ok(rows_to_strings(values.values))
    }

    async fn append_row(
        &self,
        store: &str,
        range: &A1Range,
        row: &[String],
        input: ValueInput,
    ) -> RemoteResult<()> {
        let target = format!("{}:append", range);
        let url = self.sheets_url(&[store, "values", target.as_str()])?;
        self.send(
            self.http
                .post(url)
                .query(&[
                    ("valueInputOption", input_option(input)),
                    ("insertDataOption", "INSERT_ROWS"),
                ])
                .json(&json!({ "values": [row] })),
        )
        .await?;
        Ok(())
    }

    async fn update_range(
        &self,
        store: &str,
        range: &A1Range,
        values: &[Vec<String>],
        input: ValueInput,
    ) -> RemoteResult<()> {
        let range = range.to_string();
        let url = self.sheets_url(&[store, "values", range.as_str()])?;
        self.send(
            self.http
                .put(url)
                .query(&[("valueInputOption", input_option(input))])
                .json(&json!({ "range": range, "values": values })),
        )
        .await?;
        Ok(())
    }

    async fn clear_range(&self, store: &str, range: &A1Range) -> RemoteResult<()> {
        let target = format!("{}:clear", range);
        let url = self.sheets_url(&[store, "values", target.as_str()])?;
        self.send(self.http.post(url).json(&json!({}))).await?;
        Ok(())
    }

    async fn delete_rows(
        &self,
        store: &str,
        sheet_id: i64,
        start: u32,
        end: u32,
    ) -> RemoteResult<()> {
        let target = format!("{}:batchUpdate", store);
        let url = self.sheets_url(&[target.as_str()])?;
        let body = json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": start,
                        "endIndex": end,
                    }
                }
            }]
        });
        self.send(self.http.post(url).json(&body)).await?;
        Ok(())
    }

    async fn sheet_metadata(&self, store: &str) -> RemoteResult<Vec<SheetProperties>> {
        let url = self.sheets_url(&[store])?;
        let meta: SpreadsheetMeta = self
            .send_json(
                self.http
                    .get(url)
                    .query(&[("fields", "sheets(properties(sheetId,title))")]),
            )
            .await?;
        Ok(meta.sheets.into_iter().map(Into::into).collect())
    }
}
