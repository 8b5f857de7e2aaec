//! HTML to plain-text normalization.
//!
//! Text nodes are collected in document order, skipping anything inside
//! `<script>`, `<style>` or `<noscript>`, and every run of whitespace is
//! collapsed to a single space.

use crate::error::{ChunkError, Result};
use scraper::{ElementRef, Html};
use std::path::{Path, PathBuf};

/// Elements whose text never reaches the output.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript"];

/// Suffix appended to the stem of a normalized file written to disk.
const PARSED_SUFFIX: &str = "-parsed.txt";

/// Extracts readable text from an HTML document.
///
/// ```
/// use ruborag_context::normalize_html;
///
/// let html = "<html><head><style>p { color: red }</style></head>\
///             <body><h1>Ownership</h1>\n\n<p>Each value has   an owner.</p></body></html>";
/// assert_eq!(normalize_html(html), "Ownership Each value has an owner.");
/// ```
pub fn normalize_html(raw: &str) -> String {
    let document = Html::parse_document(raw);
    let mut text = String::with_capacity(raw.len() / 2);
    collect_text(document.root_element(), &mut text);
    collapse_whitespace(&text)
}

/// Reads `path` and normalizes its contents as HTML.
pub fn normalize_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let raw = String::from_utf8(bytes).map_err(|_| ChunkError::NotUtf8 {
        path: path.to_path_buf(),
    })?;
    Ok(normalize_html(&raw))
}

/// Where the normalized form of `path` is written: `book.html` becomes `book-parsed.txt`.
pub fn parsed_output_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}{PARSED_SUFFIX}"))
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    if SKIPPED_ELEMENTS.contains(&element.value().name()) {
        return;
    }

    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, out);
        }
    }
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
