/// Data view flow: upload a file for a tabular preview, then browse and
/// filter the result.
///
/// The upload step persists the backend's `{columns, rows}` under the
/// `dataView` storage key and hands back [`Route::DataView`]. The display
/// step ([`load_view`]) reads that key, so it renders without another
/// request, and falls back to an explanatory empty state when nothing has
/// been uploaded yet.
///
/// Filtering is pure and local: it never touches the backend and never
/// mutates the stored rows.
use serde_json::Value;

use crate::api::ApiClient;
use crate::api::types::{DataPreview, Row, UploadFile};
use crate::router::Route;
use crate::session::SessionStore;
use crate::storage::{self, Storage};

use super::{FlowError, console_error, require_token};

/// Storage key of the last preview.
pub const DATA_VIEW_KEY: &str = "dataView";

pub const EMPTY_STATE_MESSAGE: &str =
    "No data available. Please upload and view a YAML file first.";

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DataUpload {
    api: ApiClient,
    session: SessionStore,
}

impl DataUpload {
    pub fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    /// Upload `file`, persist the preview, and return the route to display it.
    pub fn upload_and_preview(&self, file: Option<&UploadFile>) -> Result<Route, FlowError> {
        let file = file.ok_or(FlowError::NoFileSelected)?;
        require_token(&self.session)?;

        let preview = self.api.data_view(file).map_err(|err| {
            console_error("Failed to load data view", &err);
            FlowError::backend("Failed to load data view", err)
        })?;

        storage::save_json(self.session.storage().as_ref(), DATA_VIEW_KEY, &preview)
            .map_err(FlowError::Storage)?;

        Ok(Route::DataView)
    }
}

/// Forget the persisted preview.
pub fn clear_preview(storage: &dyn Storage) -> anyhow::Result<()> {
    storage.remove(DATA_VIEW_KEY)
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum DataViewState {
    Empty { message: &'static str },
    Ready(DataView),
}

/// Read the persisted preview. A missing or unreadable entry is the empty
/// state.
pub fn load_view(storage: &dyn Storage) -> DataViewState {
    match storage::load_json::<DataPreview>(storage, DATA_VIEW_KEY) {
        Some(preview) => DataViewState::Ready(DataView::new(preview)),
        None => DataViewState::Empty {
            message: EMPTY_STATE_MESSAGE,
        },
    }
}

/// A preview plus the current filter.
#[derive(Debug, Clone, PartialEq)]
pub struct DataView {
    preview: DataPreview,
    search_term: String,
    /// Indices into `preview.rows` that pass the filter, in row order.
    filtered: Vec<usize>,
}

impl DataView {
    pub fn new(preview: DataPreview) -> Self {
        let filtered = (0..preview.rows.len()).collect();
        Self {
            preview,
            search_term: String::new(),
            filtered,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.preview.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.preview.rows
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Recompute the filtered rows for `term`. Returns how many rows match.
    pub fn apply_filter(&mut self, term: &str) -> usize {
        self.search_term = term.to_string();
        self.filtered = matching_indices(&self.preview.columns, &self.preview.rows, term);
        self.filtered.len()
    }

    pub fn filtered_rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.filtered.iter().map(|&idx| &self.preview.rows[idx])
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }
}

/// Indices of rows where any column's text contains `term`,
/// case-insensitively. The empty term matches every row.
pub fn matching_indices(columns: &[String], rows: &[Row], term: &str) -> Vec<usize> {
    if term.is_empty() {
        return (0..rows.len()).collect();
    }

    let needle = term.to_lowercase();
    rows.iter()
        .enumerate()
        .filter(|(_, row)| {
            columns
                .iter()
                .any(|column| match_text(row.get(column)).to_lowercase().contains(&needle))
        })
        .map(|(idx, _)| idx)
        .collect()
}

/// String form of a cell for display. Null and missing cells render blank.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// String form of a cell the filter matches against, following the
/// browser's `String(value)` coercion: `null`, `undefined` for a missing
/// key, arrays joined with commas, objects as `[object Object]`.
pub fn match_text(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => match_text(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
        Some(Value::Number(n)) => number_text(n),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
    }
}

/// Integral floats print without a fraction (`1.0` reads as `1`).
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
