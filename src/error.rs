use thiserror::Error;

#[derive(Error, Debug)]
pub enum EkstreError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Unknown account: {name} (owner {owner})")]
    UnknownAccount { name: String, owner: i64 },

    #[error("Unknown bank: {0}")]
    UnknownBank(String),

    #[error("Statement table not found: no row matches marker {marker:?}")]
    MarkerNotFound { marker: String },

    #[error("Workbook has no worksheets")]
    EmptyWorkbook,

    /// The statement is malformed; nothing from it should be imported.
    #[error("Row {row}: {value:?} is not a date in the format {format}")]
    InvalidDate {
        row: u32,
        value: String,
        format: String,
    },

    #[error("Row {row}: {value:?} in column {column} is not a number")]
    InvalidAmount {
        row: u32,
        column: u32,
        value: String,
    },

    #[error("Invalid account category: {0}")]
    InvalidCategory(String),

    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, EkstreError>;
