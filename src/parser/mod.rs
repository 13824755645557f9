pub mod clean;
pub mod dom;

use std::fs;
use std::path::Path;

use scraper::{ElementRef, Html};

use crate::error::ExtractError;
use crate::record::Cable;

/// Column layout of the data row in `<table class="cable">`.
const ID_COL: usize = 0;
const DATE_COL: usize = 1;
const CLASSIFICATION_COL: usize = 2;
const ORIGIN_COL: usize = 3;

/// Read one cable file from disk and extract it.
pub fn parse_file(path: &Path) -> Result<Cable, ExtractError> {
    let html = fs::read_to_string(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    extract_cable(&html)
}

/// Markup → cable, as a chain of fallible lookups:
/// cable table → second row → four positional cells, then the first two
/// `<pre>` blocks as header and body.
pub fn extract_cable(html: &str) -> Result<Cable, ExtractError> {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    let table = dom::find_by_class(root, "table", "cable")
        .ok_or(ExtractError::StructureNotFound("cable table"))?;

    let mut pres = dom::find_all(root, "pre");
    let header = pres
        .next()
        .ok_or(ExtractError::StructureNotFound("header <pre> block"))?;
    let body = pres
        .next()
        .ok_or(ExtractError::StructureNotFound("body <pre> block"))?;

    let row = dom::nth_by_tag(table, "tr", 1).ok_or(ExtractError::FieldMissing("data row"))?;

    Ok(Cable::new(
        cell(row, ID_COL, "reference id")?,
        cell(row, DATE_COL, "date/time")?,
        cell(row, CLASSIFICATION_COL, "classification")?,
        cell(row, ORIGIN_COL, "origin")?,
        clean::clean_html(&header.html()),
        clean::clean_html(&body.html()),
    ))
}

fn cell(row: ElementRef<'_>, col: usize, field: &'static str) -> Result<String, ExtractError> {
    dom::nth_by_tag(row, "td", col)
        .and_then(dom::leaf_text)
        .ok_or(ExtractError::FieldMissing(field))
}
