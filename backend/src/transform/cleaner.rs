//! Fixed-schema cleaner.
//!
//! Turns an uploaded backlink sheet into the five output columns:
//!
//! ```text
//! Content URL ──(authority split)──▶ Domain ──(rename)──▶ Content URL
//! Domain Rating ─────────────────────────────────────────▶ Domain Rating
//! Website Traffic ───────────────────────────────────────▶ Website Traffic
//! Email / WhatsApp ────────────(created empty if absent)─▶ Email / WhatsApp
//! ```

use serde::Serialize;

use crate::error::{TransformError, TransformResult};
use crate::models::{
    Cell, CleanWarning, Table, CONTENT_URL, DOMAIN, DOMAIN_RATING, EMAIL, OUTPUT_COLUMNS,
    WEBSITE_TRAFFIC, WHATSAPP,
};

/// Columns that make a row "complete", in selection order.
const KEY_COLUMNS: [&str; 3] = [DOMAIN, DOMAIN_RATING, WEBSITE_TRAFFIC];

/// Contact columns that are always present on output.
const CONTACT_COLUMNS: [&str; 2] = [EMAIL, WHATSAPP];

/// A cleaned table and the non-fatal findings collected while building it.
#[derive(Debug, Clone, Serialize)]
pub struct CleanOutcome {
    pub table: Table,
    pub warnings: Vec<CleanWarning>,
}

impl CleanOutcome {
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Keep the authority part of a URL: what follows the first `//`, up to
/// the next `/`. Inputs without `//` are taken as bare hosts.
///
/// This is a plain split, not URL parsing: `www.`, ports, user-info and a
/// `?query` without a path separator all survive.
///
/// ```
/// use cleansheet::extract_domain;
///
/// assert_eq!(extract_domain("https://example.com/page?x=1"), "example.com");
/// assert_eq!(extract_domain("example.org"), "example.org");
/// ```
pub fn extract_domain(url: &str) -> &str {
    let after_scheme = match url.split_once("//") {
        Some((_, rest)) => rest,
        None => url,
    };
    match after_scheme.split_once('/') {
        Some((host, _)) => host,
        None => after_scheme,
    }
}

/// Apply the fixed cleaning rules to `input`.
///
/// Fails only when `Content URL` is missing; absent `Domain Rating` or
/// `Website Traffic` produce a [`CleanWarning::PartialColumns`] instead.
pub fn clean_table(input: &Table) -> TransformResult<CleanOutcome> {
    let urls = input
        .column(CONTENT_URL)
        .ok_or_else(|| TransformError::MissingRequiredColumn(CONTENT_URL.to_string()))?;

    let domains: Vec<Cell> = urls
        .map(|cell| cell.as_deref().map(|url| extract_domain(url).to_string()))
        .collect();

    let mut working = input.clone();
    working.set_column(DOMAIN, domains);

    let mut warnings = Vec::new();
    let missing: Vec<String> = KEY_COLUMNS
        .iter()
        .filter(|c| !working.has_column(c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        warnings.push(CleanWarning::PartialColumns { missing });
    }

    // Contact columns ride along from the source when it has them.
    let carried: Vec<&str> = KEY_COLUMNS
        .iter()
        .chain(CONTACT_COLUMNS.iter())
        .copied()
        .collect();
    let mut out = working.select(&carried);
    out.rename_column(DOMAIN, CONTENT_URL);

    for column in CONTACT_COLUMNS {
        if !out.has_column(column) {
            let blanks = vec![Some(String::new()); out.row_count()];
            out.set_column(column, blanks);
        }
    }

    Ok(CleanOutcome {
        table: out.select(&OUTPUT_COLUMNS),
        warnings,
    })
}
