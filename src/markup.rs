//! Post-processing of generated text for display and printing.

use regex::Regex;
use std::sync::OnceLock;

/// How a surface's text is turned into HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    Emphasis,
    EmphasisAndWeeks,
    EmphasisAndLineBreaks,
    /// Shown verbatim in a monospace block.
    Preformatted,
}

fn strong_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"))
}

fn week_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:<h4>)?Semana (\d+):(?:</h4>)?").expect("valid regex"))
}

/// `**x**` becomes `<strong>x</strong>`. Pairs do not span lines.
pub fn strong_emphasis(text: &str) -> String {
    strong_re()
        .replace_all(text, "<strong>$1</strong>")
        .into_owned()
}

/// `Semana N:` becomes an `<h4>` heading; headings already wrapped stay as they are.
pub fn week_headings(text: &str) -> String {
    week_re()
        .replace_all(text, "<h4>Semana $1:</h4>")
        .into_owned()
}

pub fn line_breaks(text: &str) -> String {
    text.replace('\n', "<br />")
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render generated text as an HTML fragment. The text is escaped before any
/// markup is introduced.
pub fn to_html(markup: Markup, text: &str) -> String {
    let escaped = escape_html(text);
    match markup {
        Markup::Emphasis => strong_emphasis(&escaped),
        Markup::EmphasisAndWeeks => week_headings(&strong_emphasis(&escaped)),
        Markup::EmphasisAndLineBreaks => line_breaks(&strong_emphasis(&escaped)),
        Markup::Preformatted => format!("<pre>{escaped}</pre>"),
    }
}

/// A run of text with or without strong emphasis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub strong: bool,
}

/// Split one line into plain and strong runs for terminal rendering.
pub fn emphasis_segments(line: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut last = 0;
    for caps in strong_re().captures_iter(line) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            out.push(Segment {
                text: &line[last..whole.start()],
                strong: false,
            });
        }
        if !inner.as_str().is_empty() {
            out.push(Segment {
                text: inner.as_str(),
                strong: true,
            });
        }
        last = whole.end();
    }
    if last < line.len() {
        out.push(Segment {
            text: &line[last..],
            strong: false,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bold_becomes_strong_without_asterisks() {
        let out = strong_emphasis("Progresión: **C - G - Am - F** para empezar.");
        assert_eq!(out, "Progresión: <strong>C - G - Am - F</strong> para empezar.");
        assert!(!out.contains('*'));
    }

    #[test]
    fn emphasis_is_non_greedy() {
        assert_eq!(
            strong_emphasis("**uno** y **dos**"),
            "<strong>uno</strong> y <strong>dos</strong>"
        );
    }

    #[test]
    fn emphasis_does_not_cross_lines() {
        assert_eq!(strong_emphasis("**a\nb**"), "**a\nb**");
    }

    #[test]
    fn emphasis_is_idempotent_without_markup() {
        let once = strong_emphasis("**Semana 1:** escalas");
        assert_eq!(strong_emphasis(&once), once);
    }

    #[test]
    fn week_headings_are_wrapped_once() {
        let text = "Semana 1: escalas\nSemana 12: repertorio";
        let once = week_headings(text);
        assert_eq!(
            once,
            "<h4>Semana 1:</h4> escalas\n<h4>Semana 12:</h4> repertorio"
        );
        assert_eq!(week_headings(&once), once);
    }

    #[test]
    fn learning_path_html_combines_rules() {
        let html = to_html(Markup::EmphasisAndWeeks, "**Semana 2:** acordes <7>");
        assert_eq!(html, "<strong><h4>Semana 2:</h4></strong> acordes &lt;7&gt;");
    }

    #[test]
    fn preformatted_is_escaped_verbatim() {
        assert_eq!(
            to_html(Markup::Preformatted, "C | G\n**Coro**"),
            "<pre>C | G\n**Coro**</pre>"
        );
    }

    #[test]
    fn assistant_html_keeps_line_breaks() {
        assert_eq!(
            to_html(Markup::EmphasisAndLineBreaks, "**Hola**\nmundo"),
            "<strong>Hola</strong><br />mundo"
        );
    }

    #[test]
    fn segments_split_strong_runs() {
        let segs = emphasis_segments("Usa **Am** y **F** hoy");
        assert_eq!(
            segs,
            vec![
                Segment { text: "Usa ", strong: false },
                Segment { text: "Am", strong: true },
                Segment { text: " y ", strong: false },
                Segment { text: "F", strong: true },
                Segment { text: " hoy", strong: false },
            ]
        );
        assert!(emphasis_segments("").is_empty());
    }
}
