//! Post-generation processing utilities.
//!
//! Turns a resolved surface into a serializable record and handles exports.

use crate::export;
use crate::markup;
use crate::model::{GenerationRecord, SurfaceState};
use crate::prompt::PromptSpec;
use crate::speech;
use std::path::PathBuf;

/// Where to write a finished generation, if anywhere.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExportTargets {
    pub html: Option<PathBuf>,
    pub json: Option<PathBuf>,
}

/// Result of post-generation processing, ready for presentation layers.
pub(crate) struct ProcessedGeneration {
    pub record: GenerationRecord,
    pub export_messages: Vec<String>,
}

/// Build the record for a surface's current state.
pub(crate) fn build_record<P>(
    inputs: &P,
    model: &str,
    state: &SurfaceState,
    with_speech: bool,
) -> GenerationRecord
where
    P: PromptSpec + ?Sized,
{
    let (html, speech) = match state {
        SurfaceState::Success { text } => (
            Some(markup::to_html(inputs.markup(), text)),
            if with_speech {
                speech::speech_text(text)
            } else {
                None
            },
        ),
        _ => (None, None),
    };

    GenerationRecord {
        surface: inputs.surface(),
        model: model.to_string(),
        generated_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        title: inputs.print_title(),
        subtitle: inputs.print_subtitle(),
        prompt: inputs.prompt(),
        state: state.clone(),
        html,
        speech,
    }
}

/// Build the record and write the requested exports.
pub(crate) fn process_generation<P>(
    inputs: &P,
    model: &str,
    state: &SurfaceState,
    with_speech: bool,
    targets: &ExportTargets,
) -> ProcessedGeneration
where
    P: PromptSpec + ?Sized,
{
    let record = build_record(inputs, model, state, with_speech);

    let mut export_messages = Vec::new();
    if let Some(path) = targets.html.as_deref() {
        match export::export_html(path, &record, inputs.markup()) {
            Ok(_) => export_messages.push(format!("Exported HTML: {}", path.display())),
            Err(e) => export_messages.push(format!("Export HTML failed: {e:#}")),
        }
    }
    if let Some(path) = targets.json.as_deref() {
        match export::export_json(path, &record) {
            Ok(_) => export_messages.push(format!("Exported JSON: {}", path.display())),
            Err(e) => export_messages.push(format!("Export JSON failed: {e:#}")),
        }
    }

    ProcessedGeneration {
        record,
        export_messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Key, Mood, Style, SurfaceKind};
    use crate::prompt::{ChordRequest, LearningPathRequest};

    #[test]
    fn success_record_carries_html_and_speech() {
        let inputs = ChordRequest {
            key: Key::DMajor,
            style: Style::Folk,
            mood: Mood::Relaxed,
        };
        let state = SurfaceState::Success {
            text: "**D - G - A**".into(),
        };
        let record = build_record(&inputs, "m", &state, true);
        assert_eq!(record.surface, SurfaceKind::Chords);
        assert_eq!(record.html.as_deref(), Some("<strong>D - G - A</strong>"));
        assert_eq!(record.speech.as_deref(), Some("Re, Sol, La"));
        assert_eq!(
            record.subtitle.as_deref(),
            Some("Tonalidad: Re Mayor, Estilo: Folk, Emoción: Relajado")
        );
    }

    #[test]
    fn error_record_has_no_rendering() {
        let state = SurfaceState::Error {
            message: "fallo".into(),
        };
        let record = build_record(&LearningPathRequest::default(), "m", &state, true);
        assert!(record.html.is_none());
        assert!(record.speech.is_none());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "fallo");
    }

    #[test]
    fn exports_are_written_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let targets = ExportTargets {
            html: Some(dir.path().join("out.html")),
            json: Some(dir.path().join("out.json")),
        };
        let state = SurfaceState::Success {
            text: "Semana 1: escalas".into(),
        };
        let processed = process_generation(
            &LearningPathRequest::default(),
            "m",
            &state,
            false,
            &targets,
        );
        assert_eq!(processed.export_messages.len(), 2);
        assert!(processed
            .export_messages
            .iter()
            .all(|m| m.starts_with("Exported")));
        let html = std::fs::read_to_string(dir.path().join("out.html")).unwrap();
        assert!(html.contains("<h4>Semana 1:</h4>"));
        let json: GenerationRecord =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("out.json")).unwrap())
                .unwrap();
        assert_eq!(json.state, state);
    }

    #[test]
    fn failed_export_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let targets = ExportTargets {
            html: Some(dir.path().join("missing").join("out.html")),
            json: None,
        };
        let processed = process_generation(
            &LearningPathRequest::default(),
            "m",
            &SurfaceState::Idle,
            false,
            &targets,
        );
        assert_eq!(processed.export_messages.len(), 1);
        assert!(processed.export_messages[0].starts_with("Export HTML failed"));
    }
}
