//! CSV export of the photographer list and the photo catalog.
//!
//! Header row first, then one row per entry. Every data field is wrapped in
//! double quotes with embedded quotes doubled; missing fields are empty
//! strings. Rows are joined with `\n` and there is no trailing newline.

use crate::types::{CatalogEntry, Photographer};
use chrono::NaiveDate;

const PHOTOGRAPHER_HEADERS: [&str; 3] = ["Photographer Name", "National ID", "Address"];
const ADDED_DATE_HEADER: &str = "Added Date";
const PHOTO_RECORD_HEADERS: [&str; 3] = ["Owner", "Species", "Image Link"];

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn render(headers: &[&str], rows: impl IntoIterator<Item = Vec<String>>) -> String {
    let mut lines = vec![headers.join(",")];
    lines.extend(rows.into_iter().map(|row| {
        row.iter()
            .map(|field| quote(field))
            .collect::<Vec<_>>()
            .join(",")
    }));
    lines.join("\n")
}

/// Photographer sheet. `with_added_date` appends the import date column.
pub fn photographers_csv(photographers: &[Photographer], with_added_date: bool) -> String {
    let mut headers = PHOTOGRAPHER_HEADERS.to_vec();
    if with_added_date {
        headers.push(ADDED_DATE_HEADER);
    }
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    let rows = photographers.iter().map(|p| {
        let mut row = vec![text(&p.name), text(&p.national_id), text(&p.address)];
        if with_added_date {
            row.push(text(&p.added_date));
        }
        row
    });
    render(&headers, rows)
}

/// Catalog sheet: owner, species annotation, and image link.
///
/// The link is the client's `imageUrl` annotation when present, otherwise the
/// serving path of an ingested photo.
pub fn photo_records_csv(entries: &[CatalogEntry]) -> String {
    let rows = entries.iter().map(|entry| {
        let link = entry
            .text_field("imageUrl")
            .or_else(|| entry.as_photo().map(|p| p.path.as_str()))
            .unwrap_or_default();
        vec![
            entry.photographer_name().unwrap_or_default().to_string(),
            entry.text_field("butterflyType").unwrap_or_default().to_string(),
            link.to_string(),
        ]
    });
    render(&PHOTO_RECORD_HEADERS, rows)
}

/// Download name, e.g. `photographers_2024-05-01.csv`.
pub fn attachment_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.csv", prefix, date.format("%Y-%m-%d"))
}
