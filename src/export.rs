//! Printable and machine-readable exports of a finished generation.

use crate::markup::{self, Markup};
use crate::model::{GenerationRecord, SurfaceState};
use anyhow::{Context, Result};
use std::path::Path;

/// Stylesheet for the printable page of each surface.
fn page_style(markup: Markup) -> &'static str {
    match markup {
        Markup::Preformatted => {
            "body { font-family: monospace; line-height: 1.6; white-space: pre-wrap; color: #333; }"
        }
        Markup::EmphasisAndWeeks => {
            "body { font-family: sans-serif; line-height: 1.6; color: #333; } strong { font-weight: bold; } \
h2, h4 { color: #111; } h4 { margin-top: 1.5em; margin-bottom: 0.5em; }"
        }
        Markup::EmphasisAndLineBreaks => {
            "body { font-family: -apple-system, BlinkMacSystemFont, \"Segoe UI\", Roboto, Helvetica, Arial, sans-serif; \
line-height: 1.6; color: #111; padding: 2rem; } strong { font-weight: 600; }"
        }
        Markup::Emphasis => {
            "body { font-family: sans-serif; line-height: 1.6; color: #333; } strong { font-weight: bold; }"
        }
    }
}

/// Standalone HTML page for printing a record.
pub fn printable_document(record: &GenerationRecord, markup: Markup) -> String {
    let title = markup::escape_html(&record.title);
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
    out.push_str(&format!("<title>{title}</title>"));
    out.push_str(&format!("<style>{}</style>", page_style(markup)));
    out.push_str("</head><body>\n");
    out.push_str(&format!("<h1>{title}</h1>\n"));
    if let Some(subtitle) = record.subtitle.as_deref() {
        out.push_str(&format!("<h3>{}</h3>\n", markup::escape_html(subtitle)));
    }
    out.push_str("<hr>\n");
    match (&record.state, record.html.as_deref()) {
        (_, Some(html)) => out.push_str(&format!("<div>{html}</div>\n")),
        (SurfaceState::Error { message }, None) => {
            out.push_str(&format!("<p>{}</p>\n", markup::escape_html(message)))
        }
        _ => {}
    }
    out.push_str("</body></html>\n");
    out
}

pub fn export_html(path: &Path, record: &GenerationRecord, markup: Markup) -> Result<()> {
    std::fs::write(path, printable_document(record, markup))
        .with_context(|| format!("write {}", path.display()))
}

pub fn export_json(path: &Path, record: &GenerationRecord) -> Result<()> {
    let data = serde_json::to_string_pretty(record)?;
    std::fs::write(path, data).with_context(|| format!("write {}", path.display()))
}

/// File name derived from the surface and generation time, e.g.
/// `asistente-musical-chords-2026-10-16_10-20-30.html`.
pub fn default_export_name(record: &GenerationRecord, ext: &str) -> String {
    let stamp: String = record
        .generated_at
        .chars()
        .take(19)
        .map(|c| match c {
            ':' => '-',
            'T' => '_',
            other => other,
        })
        .collect();
    let surface = serde_json::to_value(record.surface)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "result".into());
    format!("asistente-musical-{surface}-{stamp}.{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SurfaceKind;
    use pretty_assertions::assert_eq;

    fn record(state: SurfaceState, html: Option<&str>) -> GenerationRecord {
        GenerationRecord {
            surface: SurfaceKind::Library,
            model: "m".into(),
            generated_at: "2026-10-16T10:20:30.5Z".into(),
            title: "Transcripción de Yesterday".into(),
            subtitle: Some("Yesterday - The Beatles".into()),
            prompt: "p".into(),
            state,
            html: html.map(str::to_string),
            speech: None,
        }
    }

    #[test]
    fn document_has_title_subtitle_and_body() {
        let r = record(
            SurfaceState::Success { text: "x".into() },
            Some("<pre>F | C</pre>"),
        );
        let doc = printable_document(&r, Markup::Preformatted);
        assert!(doc.contains("<title>Transcripción de Yesterday</title>"));
        assert!(doc.contains("<h3>Yesterday - The Beatles</h3>"));
        assert!(doc.contains("<div><pre>F | C</pre></div>"));
        assert!(doc.contains("font-family: monospace"));
    }

    #[test]
    fn error_document_shows_escaped_message() {
        let r = record(
            SurfaceState::Error {
                message: "fallo <red>".into(),
            },
            None,
        );
        let doc = printable_document(&r, Markup::Emphasis);
        assert!(doc.contains("<p>fallo &lt;red&gt;</p>"));
    }

    #[test]
    fn export_name_uses_surface_and_timestamp() {
        let r = record(SurfaceState::Idle, None);
        assert_eq!(
            default_export_name(&r, "html"),
            "asistente-musical-library-2026-10-16_10-20-30.html"
        );
    }
}
