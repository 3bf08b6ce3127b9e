//! Prompt templates for each generation flow.
//!
//! Every builder is a pure function of its selections; the same inputs always
//! produce the same instruction string.

use crate::markup::Markup;
use crate::model::{Goal, Instrument, Key, Mood, SkillLevel, Style, SurfaceKind, Weakness};

/// Inputs of one generation flow.
pub trait PromptSpec {
    fn surface(&self) -> SurfaceKind;

    fn prompt(&self) -> String;

    /// Completes "Lo siento, no pude ... en este momento".
    fn failure_context(&self) -> &'static str;

    /// Whether the inputs are sufficient to issue a request.
    fn is_complete(&self) -> bool {
        true
    }

    fn print_title(&self) -> String;

    fn print_subtitle(&self) -> Option<String> {
        None
    }

    fn markup(&self) -> Markup {
        Markup::Emphasis
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordRequest {
    pub key: Key,
    pub style: Style,
    pub mood: Mood,
}

impl Default for ChordRequest {
    fn default() -> Self {
        Self {
            key: Key::CMajor,
            style: Style::Pop,
            mood: Mood::Happy,
        }
    }
}

impl PromptSpec for ChordRequest {
    fn surface(&self) -> SurfaceKind {
        SurfaceKind::Chords
    }

    fn prompt(&self) -> String {
        format!(
            "Actúa como un experto en teoría musical y un talentoso compositor.\n\
Tu tarea es generar una progresión de acordes creativa y musicalmente coherente.\n\
Parámetros:\n\
- Tonalidad: {key}\n\
- Estilo: {style}\n\
- Emoción: {mood}\n\
\n\
Instrucciones:\n\
1.  Genera una progresión de 4 a 8 acordes que se ajuste perfectamente a los parámetros dados.\n\
2.  Presenta la progresión de forma clara y en negrita. Ejemplo: **C - G - Am - F**.\n\
3.  Escribe una breve explicación (2-3 frases) de por qué esa progresión funciona para el estilo y la emoción solicitados, utilizando un lenguaje inspirador y fácil de entender.\n\
4.  La respuesta debe estar íntegramente en español.",
            key = self.key,
            style = self.style,
            mood = self.mood,
        )
    }

    fn failure_context(&self) -> &'static str {
        "generar la progresión de acordes"
    }

    fn print_title(&self) -> String {
        "Progresión de Acordes".to_string()
    }

    fn print_subtitle(&self) -> Option<String> {
        Some(format!(
            "Tonalidad: {}, Estilo: {}, Emoción: {}",
            self.key, self.style, self.mood
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExerciseRequest {
    pub instrument: Instrument,
    pub weakness: Weakness,
}

impl Default for ExerciseRequest {
    fn default() -> Self {
        Self {
            instrument: Instrument::Guitar,
            weakness: Weakness::FingerSpeed,
        }
    }
}

impl PromptSpec for ExerciseRequest {
    fn surface(&self) -> SurfaceKind {
        SurfaceKind::Exercises
    }

    fn prompt(&self) -> String {
        format!(
            "Actúa como un asistente de práctica musical. Genera 3 ejercicios de calentamiento \
personalizados para un músico de {} que tiene dificultades con \"{}\". Los ejercicios deben \
describirse claramente en texto y en español. Cada ejercicio debe tener un título en negrita y \
una breve descripción de su propósito.",
            self.instrument, self.weakness
        )
    }

    fn failure_context(&self) -> &'static str {
        "generar los ejercicios"
    }

    fn print_title(&self) -> String {
        "Ejercicios Personalizados".to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearningPathRequest {
    pub instrument: Instrument,
    pub level: SkillLevel,
    pub goal: Goal,
}

impl Default for LearningPathRequest {
    fn default() -> Self {
        Self {
            instrument: Instrument::Piano,
            level: SkillLevel::Beginner,
            goal: Goal::Improvisation,
        }
    }
}

impl PromptSpec for LearningPathRequest {
    fn surface(&self) -> SurfaceKind {
        SurfaceKind::LearningPath
    }

    fn prompt(&self) -> String {
        format!(
            "Actúa como un tutor de música de IA. Crea un plan de aprendizaje personalizado de 4 \
semanas para un músico de {} de nivel {} cuyo objetivo es \"{}\". El plan debe estar estructurado \
semana a semana. Para cada semana, enumera 2-3 tareas específicas, incluyendo conceptos teóricos \
para estudiar, ejercicios técnicos para practicar y una pieza de repertorio para aprender. El tono \
debe ser motivador y claro, y la respuesta debe estar en español.",
            self.instrument, self.level, self.goal
        )
    }

    fn failure_context(&self) -> &'static str {
        "generar la ruta de aprendizaje"
    }

    fn print_title(&self) -> String {
        format!("Ruta de Aprendizaje para {} ({})", self.instrument, self.level)
    }

    fn markup(&self) -> Markup {
        Markup::EmphasisAndWeeks
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRequest {
    pub title: String,
    pub artist: String,
    pub level: SkillLevel,
}

impl Default for LibraryRequest {
    fn default() -> Self {
        Self {
            title: String::new(),
            artist: String::new(),
            level: SkillLevel::Beginner,
        }
    }
}

impl PromptSpec for LibraryRequest {
    fn surface(&self) -> SurfaceKind {
        SurfaceKind::Library
    }

    fn prompt(&self) -> String {
        format!(
            "Actúa como un útil asistente de músico. Genera una tabla de acordes simplificada para \
la canción \"{}\" de {}, adaptada para un músico de nivel {}. La tabla debe ser fácil de leer. \
Incluye las secciones principales de la canción (por ejemplo, Verso, Coro, Puente). Si es posible, \
agrega un diagrama simple de rasgueo. La respuesta debe estar en español.",
            self.title.trim(),
            self.artist.trim(),
            self.level
        )
    }

    fn failure_context(&self) -> &'static str {
        "generar la transcripción"
    }

    fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.artist.trim().is_empty()
    }

    fn print_title(&self) -> String {
        format!("Transcripción de {}", self.title.trim())
    }

    fn print_subtitle(&self) -> Option<String> {
        Some(format!("{} - {}", self.title.trim(), self.artist.trim()))
    }

    fn markup(&self) -> Markup {
        Markup::Preformatted
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Question {
    pub text: String,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl PromptSpec for Question {
    fn surface(&self) -> SurfaceKind {
        SurfaceKind::Assistant
    }

    fn prompt(&self) -> String {
        format!(
            "Un estudiante de música pregunta: \"{}\".\n\n\
Actúa como un Asistente Musical de IA experto en música. Eres amigable, pedagógico y tus \
respuestas son claras y concisas. Tu especialidad es la teoría musical, incluyendo escalas, \
acordes, composición y ritmo. Responde a la pregunta del estudiante de manera que sea fácil de \
entender, utilizando analogías y ejemplos prácticos cuando sea posible. Si la pregunta es demasiado \
amplia, como 'háblame de los acordes', sugiere al usuario temas específicos sobre los que podría \
preguntar. Formatea tu respuesta con negritas para los términos importantes y listas para los \
conceptos clave, usando markdown. La respuesta debe estar íntegramente en español.",
            self.text.trim()
        )
    }

    fn failure_context(&self) -> &'static str {
        "responder tu pregunta"
    }

    fn is_complete(&self) -> bool {
        !self.text.trim().is_empty()
    }

    fn print_title(&self) -> String {
        "Respuesta del Asistente".to_string()
    }

    fn markup(&self) -> Markup {
        Markup::EmphasisAndLineBreaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chord_prompt_embeds_selections() {
        let req = ChordRequest {
            key: Key::AMinor,
            style: Style::Jazz,
            mood: Mood::Mysterious,
        };
        let p = req.prompt();
        assert!(p.contains("- Tonalidad: La menor\n"));
        assert!(p.contains("- Estilo: Jazz\n"));
        assert!(p.contains("- Emoción: Misterioso\n"));
        assert!(p.contains("**C - G - Am - F**"));
    }

    #[test]
    fn prompts_are_deterministic() {
        let path = LearningPathRequest::default();
        assert_eq!(path.prompt(), path.prompt());
        let lib = LibraryRequest {
            title: "Let It Be".into(),
            artist: "The Beatles".into(),
            level: SkillLevel::Intermediate,
        };
        assert_eq!(lib.prompt(), lib.clone().prompt());
    }

    #[test]
    fn every_chord_combination_yields_a_prompt() {
        for &key in Key::ALL {
            for &style in Style::ALL {
                for &mood in Mood::ALL {
                    let p = ChordRequest { key, style, mood }.prompt();
                    assert!(p.contains(key.label()));
                }
            }
        }
    }

    #[test]
    fn exercise_prompt_quotes_weakness() {
        let req = ExerciseRequest {
            instrument: Instrument::Violin,
            weakness: Weakness::Intonation,
        };
        let p = req.prompt();
        assert!(p.contains("músico de Violín que tiene dificultades con \"Afinación\""));
    }

    #[test]
    fn library_requires_title_and_artist() {
        let mut lib = LibraryRequest::default();
        assert!(!lib.is_complete());
        lib.title = "Yesterday".into();
        lib.artist = "   ".into();
        assert!(!lib.is_complete());
        lib.artist = "The Beatles".into();
        assert!(lib.is_complete());
        assert_eq!(lib.print_subtitle().as_deref(), Some("Yesterday - The Beatles"));
    }

    #[test]
    fn question_is_trimmed() {
        let q = Question::new("  ¿Qué es una escala?  ");
        assert!(q.is_complete());
        assert!(q.prompt().starts_with("Un estudiante de música pregunta: \"¿Qué es una escala?\"."));
        assert!(!Question::new(" \n").is_complete());
    }

    #[test]
    fn learning_path_title_names_instrument_and_level() {
        let req = LearningPathRequest {
            instrument: Instrument::Drums,
            level: SkillLevel::Advanced,
            goal: Goal::AuditionPrep,
        };
        assert_eq!(req.print_title(), "Ruta de Aprendizaje para Batería (Avanzado)");
        assert_eq!(req.markup(), Markup::EmphasisAndWeeks);
    }
}
