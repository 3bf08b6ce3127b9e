//! Spoken rendition of a chord progression for Spanish text-to-speech.

use regex::Regex;
use std::sync::OnceLock;

/// Applied top to bottom, each matched only as a standalone word. Longer chord
/// names come before their prefixes so a later rule never rewrites part of an
/// earlier replacement.
const CHORD_NAMES: &[(&str, &str)] = &[
    ("Am7", "La menor séptima"),
    ("Fmaj7", "Fa mayor séptima"),
    ("Dm7", "Re menor séptima"),
    ("Gsus4", "Sol sus cuatro"),
    ("Cmaj7", "Do mayor séptima"),
    ("G/B", "Sol con bajo en Si"),
    ("Am", "La menor"),
    ("Bm", "Si menor"),
    ("Cm", "Do menor"),
    ("Dm", "Re menor"),
    ("Em", "Mi menor"),
    ("Fm", "Fa menor"),
    ("Gm", "Sol menor"),
    ("C", "Do"),
    ("D", "Re"),
    ("E", "Mi"),
    ("F", "Fa"),
    ("G", "Sol"),
    ("A", "La"),
    ("B", "Si"),
];

struct Rules {
    separator: Regex,
    chords: Vec<(Regex, &'static str)>,
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| {
        let chords = CHORD_NAMES
            .iter()
            .map(|(name, spoken)| {
                let re = format!(r"\b{}\b", regex::escape(name));
                (Regex::new(&re).expect("valid chord pattern"), *spoken)
            })
            .collect();
        Rules {
            separator: Regex::new(r"\s-\s").expect("valid regex"),
            chords,
        }
    })
}

/// Rewrite generated text so a Spanish voice reads chord names aloud.
///
/// Emphasis markers are dropped and ` - ` separators become pauses. Returns
/// `None` when nothing speakable remains.
pub fn speech_text(text: &str) -> Option<String> {
    let rules = rules();
    let mut out = text.replace("**", "");
    out = rules.separator.replace_all(&out, ", ").into_owned();
    for (re, spoken) in &rules.chords {
        out = re.replace_all(&out, *spoken).into_owned();
    }
    if out.trim().is_empty() {
        None
    } else {
        Some(out)
    }
}
