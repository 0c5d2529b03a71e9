//! Customer record model and its row encoding.

use crate::constants::HEADER_ROW;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number of columns in a customer row.
pub const ROW_WIDTH: usize = HEADER_ROW.len();

/// Column positions within a customer row.
pub mod column {
    pub const ID: usize = 0;
    pub const NAME: usize = 1;
    pub const PHONE: usize = 2;
    pub const FOLDER: usize = 3;
    pub const CREATED: usize = 4;
}

/// One customer as stored in the tabular store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub folder_ref: Option<String>,
    pub created_on: String,
}

/// Trim and uppercase a customer identifier.
pub fn normalize_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Render a creation date the way rows store it (`dd/mm/YYYY`).
pub fn format_created_on(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

impl CustomerRecord {
    /// Build a new record dated today, normalizing the identifier.
    pub fn new(id: &str, name: &str, phone: &str) -> Self {
        Self {
            id: normalize_id(id),
            name: name.to_string(),
            phone: phone.to_string(),
            folder_ref: None,
            created_on: format_created_on(Local::now().date_naive()),
        }
    }

    /// Decode a row read from the store.
    ///
    /// Short rows are padded with empty cells and the identifier is
    /// normalized, since rows may be typed into the sheet by hand. Returns
    /// `None` for rows with a blank identifier, which are leftovers of
    /// cleared rows.
    pub fn from_row(row: &[String]) -> Option<Self> {
        let cell = |index: usize| row.get(index).map(String::as_str).unwrap_or("");
        let id = cell(column::ID).trim();
        if id.is_empty() {
            return None;
        }
        let folder = cell(column::FOLDER).trim();
        Some(Self {
            id: normalize_id(id),
            name: cell(column::NAME).to_string(),
            phone: cell(column::PHONE).to_string(),
            folder_ref: (!folder.is_empty()).then(|| folder.to_string()),
            created_on: cell(column::CREATED).to_string(),
        })
    }

    /// Encode as a full row in header order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.phone.clone(),
            self.folder_ref.clone().unwrap_or_default(),
            self.created_on.clone(),
        ]
    }

    /// Whether the record matches an already lowercased, non-empty needle.
    pub fn matches(&self, needle: &str) -> bool {
        self.id.to_lowercase().contains(needle)
            || self.name.to_lowercase().contains(needle)
            || self.phone.to_lowercase().contains(needle)
    }

    /// Display name for this customer's photo folder.
    pub fn folder_display_name(&self) -> String {
        format!("{} - {}", self.id, self.name)
    }
}
