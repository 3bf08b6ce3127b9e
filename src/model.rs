use crate::engine::GenerationError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Declares a fixed vocabulary list: a `ValueEnum` for the CLI, a Spanish
/// label used in prompts and on screen, and `ALL` in display order.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

vocabulary!(Instrument {
    Guitar => "Guitarra",
    ElectricGuitar => "Guitarra Eléctrica",
    ElectricBass => "Bajo Eléctrico",
    Piano => "Piano",
    Violin => "Violín",
    Voice => "Voz",
    Drums => "Batería",
});

vocabulary!(SkillLevel {
    Beginner => "Principiante",
    Intermediate => "Intermedio",
    Advanced => "Avanzado",
});

vocabulary!(Goal {
    Improvisation => "Aprender a improvisar",
    AuditionPrep => "Preparar una audición",
    LearnTheory => "Aprender teoría musical",
    Songwriting => "Componer canciones",
    TechnicalSkill => "Mejorar la técnica",
});

vocabulary!(
    /// Major keys first, then minor keys, in circle-of-fifths order.
    Key {
        CMajor => "Do Mayor",
        GMajor => "Sol Mayor",
        FMajor => "Fa Mayor",
        DMajor => "Re Mayor",
        BbMajor => "Si bemol Mayor",
        AMajor => "La Mayor",
        EbMajor => "Mi bemol Mayor",
        EMajor => "Mi Mayor",
        AbMajor => "La bemol Mayor",
        BMajor => "Si Mayor",
        DbMajor => "Re bemol Mayor",
        FSharpMajor => "Fa sostenido / Sol bemol Mayor",
        AMinor => "La menor",
        EMinor => "Mi menor",
        DMinor => "Re menor",
        BMinor => "Si menor",
        GMinor => "Sol menor",
        FSharpMinor => "Fa sostenido menor",
        CMinor => "Do menor",
        CSharpMinor => "Do sostenido menor",
        FMinor => "Fa menor",
        GSharpMinor => "Sol sostenido menor",
        BbMinor => "Si bemol menor",
        EbMinor => "Re sostenido / Mi bemol menor",
    }
);

impl Key {
    pub fn is_major(self) -> bool {
        self.label().ends_with("Mayor")
    }
}

vocabulary!(Style {
    Pop => "Pop",
    Rock => "Rock",
    Jazz => "Jazz",
    Blues => "Blues",
    Classical => "Clásico",
    Folk => "Folk",
    Electronic => "Electrónica",
});

vocabulary!(Mood {
    Happy => "Alegre",
    Sad => "Triste",
    Epic => "Épico",
    Relaxed => "Relajado",
    Energetic => "Enérgico",
    Mysterious => "Misterioso",
});

vocabulary!(
    /// Practice weaknesses offered by the exercise generator.
    Weakness {
        FingerSpeed => "Velocidad de los dedos",
        RhythmicPrecision => "Precisión rítmica",
        Intonation => "Afinación",
        ChordTransitions => "Transiciones de acordes",
        BreathControl => "Control de la respiración (voz)",
        Dynamics => "Dinámicas (tocar suave/fuerte)",
    }
);

/// Independently operating UI units. Each owns its own token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    Assistant,
    Chords,
    Exercises,
    LearningPath,
    Library,
}

impl SurfaceKind {
    pub fn title(self) -> &'static str {
        match self {
            SurfaceKind::Assistant => "Asistente",
            SurfaceKind::Chords => "Acordes",
            SurfaceKind::Exercises => "Ejercicios",
            SurfaceKind::LearningPath => "Ruta",
            SurfaceKind::Library => "Biblioteca",
        }
    }
}

/// Marks "the current request" of a surface. Zero means no active request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestToken(pub u64);

impl RequestToken {
    pub const NONE: RequestToken = RequestToken(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SurfaceState {
    #[default]
    Idle,
    Loading,
    Success {
        text: String,
    },
    Error {
        message: String,
    },
}

impl SurfaceState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SurfaceState::Loading)
    }

    /// Generated text, empty unless the last request succeeded.
    pub fn text(&self) -> &str {
        match self {
            SurfaceState::Success { text } => text,
            _ => "",
        }
    }
}

/// Work handed from a coordinator to the controller.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub surface: SurfaceKind,
    pub token: RequestToken,
    pub prompt: String,
    pub failure_context: &'static str,
}

/// Outcome of one collaborator call, tagged with the token that issued it.
#[derive(Debug, Clone)]
pub struct Completion {
    pub surface: SurfaceKind,
    pub token: RequestToken,
    pub failure_context: &'static str,
    pub outcome: Result<String, GenerationError>,
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    Completed(Completion),
    Info(InfoEvent),
}

/// Structured info events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone)]
pub enum InfoEvent {
    Dispatched {
        surface: SurfaceKind,
        token: RequestToken,
    },
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Dispatched { surface, token } => {
                format!("{}: solicitud {} enviada", surface.title(), token)
            }
        }
    }
}

/// Serializable summary of one finished generation, used for JSON output and export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub surface: SurfaceKind,
    pub model: String,
    pub generated_at: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub prompt: String,
    #[serde(flatten)]
    pub state: SurfaceState,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub speech: Option<String>,
}
