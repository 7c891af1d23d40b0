//! Validation of user-entered form fields.

use crate::error::ClientError;
use crate::response::StatusMessage;

pub const INVALID_SHEETS_URL: &str = "Please enter a valid Google Sheets URL or ID!";
pub const MISSING_URL: &str = "Please enter a URL!";

/// Segments of `https://docs.google.com/spreadsheets/d/<ID>/edit` split on `/`.
const SHEETS_URL_SEGMENTS: usize = 7;
const SHEETS_ID_SEGMENT: usize = 5;

/// Placeholder number check. Always passes.
pub fn verify_is_number() -> String {
    String::new()
}

/// Accept either a bare spreadsheet ID or a share URL and return the ID.
pub fn try_parse_google_sheets_url(url: &str) -> Result<String, ClientError> {
    let id = if url.contains('/') {
        let segments: Vec<&str> = url.split('/').collect();
        if segments.len() != SHEETS_URL_SEGMENTS {
            return Err(ClientError::InvalidFormat(INVALID_SHEETS_URL.to_string()));
        }
        segments[SHEETS_ID_SEGMENT]
    } else {
        url
    };

    if id.is_empty() {
        return Err(ClientError::MissingInput(MISSING_URL.to_string()));
    }

    Ok(id.to_string())
}

/// Parse `url` and report through the callbacks. Returns whether it parsed.
pub fn parse_google_sheets_url_or_error(
    url: &str,
    set_url: impl FnOnce(String),
    set_error: impl FnOnce(StatusMessage),
) -> bool {
    match try_parse_google_sheets_url(url) {
        Ok(id) => {
            set_url(id);
            true
        }
        Err(e) => {
            set_error(StatusMessage::from(&e));
            false
        }
    }
}
