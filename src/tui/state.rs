use crate::model::{
    AppEvent, Completion, Goal, Instrument, Key, Mood, RequestToken, SkillLevel, Style,
    SurfaceKind, SurfaceState, Weakness,
};
use crate::orchestrator::{RequestCoordinator, Resolution, UiCommand};
use crate::prompt::{
    ChordRequest, ExerciseRequest, LearningPathRequest, LibraryRequest, PromptSpec, Question,
};
use tokio::sync::mpsc::UnboundedSender;

pub const TABS: [&str; 6] = [
    "Asistente",
    "Acordes",
    "Ejercicios",
    "Ruta",
    "Biblioteca",
    "Ayuda",
];
pub const HELP_TAB: usize = 5;

pub const GREETING: &str = "¡Hola! Soy Asistente Musical. ¿En qué puedo ayudarte hoy?";

/// One labelled input as shown in a form.
pub struct FieldView {
    pub label: &'static str,
    pub value: String,
    pub editable: bool,
}

/// Step through a fixed vocabulary, wrapping at both ends.
pub fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let len = all.len();
    let idx = all.iter().position(|v| *v == current).unwrap_or(0);
    let next = if forward {
        (idx + 1) % len
    } else {
        (idx + len - 1) % len
    };
    all[next]
}

/// Inputs editable from a form tab.
pub trait Form: PromptSpec + Default {
    fn fields(&self) -> Vec<FieldView>;
    fn cycle(&mut self, field: usize, forward: bool);
    fn text_mut(&mut self, _field: usize) -> Option<&mut String> {
        None
    }
}

impl Form for ChordRequest {
    fn fields(&self) -> Vec<FieldView> {
        vec![
            FieldView {
                label: "Tonalidad",
                value: key_label(self.key),
                editable: false,
            },
            selector("Estilo", self.style.label()),
            selector("Emoción", self.mood.label()),
        ]
    }

    fn cycle(&mut self, field: usize, forward: bool) {
        match field {
            0 => self.key = cycle(Key::ALL, self.key, forward),
            1 => self.style = cycle(Style::ALL, self.style, forward),
            _ => self.mood = cycle(Mood::ALL, self.mood, forward),
        }
    }
}

impl Form for ExerciseRequest {
    fn fields(&self) -> Vec<FieldView> {
        vec![
            selector("Instrumento", self.instrument.label()),
            selector("Debilidad", self.weakness.label()),
        ]
    }

    fn cycle(&mut self, field: usize, forward: bool) {
        match field {
            0 => self.instrument = cycle(Instrument::ALL, self.instrument, forward),
            _ => self.weakness = cycle(Weakness::ALL, self.weakness, forward),
        }
    }
}

impl Form for LearningPathRequest {
    fn fields(&self) -> Vec<FieldView> {
        vec![
            selector("Instrumento", self.instrument.label()),
            selector("Nivel", self.level.label()),
            selector("Objetivo", self.goal.label()),
        ]
    }

    fn cycle(&mut self, field: usize, forward: bool) {
        match field {
            0 => self.instrument = cycle(Instrument::ALL, self.instrument, forward),
            1 => self.level = cycle(SkillLevel::ALL, self.level, forward),
            _ => self.goal = cycle(Goal::ALL, self.goal, forward),
        }
    }
}

impl Form for LibraryRequest {
    fn fields(&self) -> Vec<FieldView> {
        vec![
            FieldView {
                label: "Título",
                value: self.title.clone(),
                editable: true,
            },
            FieldView {
                label: "Artista",
                value: self.artist.clone(),
                editable: true,
            },
            selector("Nivel", self.level.label()),
        ]
    }

    fn cycle(&mut self, field: usize, forward: bool) {
        if field == 2 {
            self.level = cycle(SkillLevel::ALL, self.level, forward);
        }
    }

    fn text_mut(&mut self, field: usize) -> Option<&mut String> {
        match field {
            0 => Some(&mut self.title),
            1 => Some(&mut self.artist),
            _ => None,
        }
    }
}

/// Key names grouped the way the selector lists them, majors before minors.
fn key_label(key: Key) -> String {
    let group = if key.is_major() { "Mayores" } else { "Menores" };
    format!("{group} · {}", key.label())
}

fn selector(label: &'static str, value: &str) -> FieldView {
    FieldView {
        label,
        value: value.to_string(),
        editable: false,
    }
}

/// Operations the key handler and event router need from any tab.
pub(crate) trait Surface {
    fn coordinator(&self) -> &RequestCoordinator;
    fn inputs(&self) -> &dyn PromptSpec;
    fn submit(&mut self, dispatch: &UnboundedSender<UiCommand>) -> Option<RequestToken>;
    fn resolve(&mut self, completion: Completion) -> Resolution;
    fn reset(&mut self);
    fn move_focus(&mut self, forward: bool);
    fn cycle_focused(&mut self, forward: bool);
    fn type_char(&mut self, c: char);
    fn backspace(&mut self);
    fn scroll_by(&mut self, delta: i32);
    /// Text Ctrl-Y copies.
    fn copy_text(&self) -> Option<String>;
}

fn scrolled(current: u16, delta: i32) -> u16 {
    (current as i32 + delta).clamp(0, u16::MAX as i32) as u16
}

pub(crate) struct FormSurface<F: Form> {
    pub inputs: F,
    pub coordinator: RequestCoordinator,
    pub focus: usize,
    pub scroll: u16,
}

impl<F: Form> FormSurface<F> {
    pub fn new() -> Self {
        let inputs = F::default();
        let coordinator = RequestCoordinator::new(inputs.surface());
        Self {
            inputs,
            coordinator,
            focus: 0,
            scroll: 0,
        }
    }
}

impl<F: Form + 'static> Surface for FormSurface<F> {
    fn coordinator(&self) -> &RequestCoordinator {
        &self.coordinator
    }

    fn inputs(&self) -> &dyn PromptSpec {
        &self.inputs
    }

    fn submit(&mut self, dispatch: &UnboundedSender<UiCommand>) -> Option<RequestToken> {
        let token = self.coordinator.issue(&self.inputs, dispatch);
        if token.is_some() {
            self.scroll = 0;
        }
        token
    }

    fn resolve(&mut self, completion: Completion) -> Resolution {
        self.coordinator.resolve(completion)
    }

    fn reset(&mut self) {
        self.coordinator.reset();
        self.scroll = 0;
    }

    fn move_focus(&mut self, forward: bool) {
        let n = self.inputs.fields().len();
        self.focus = if forward {
            (self.focus + 1) % n
        } else {
            (self.focus + n - 1) % n
        };
    }

    fn cycle_focused(&mut self, forward: bool) {
        self.inputs.cycle(self.focus, forward);
    }

    fn type_char(&mut self, c: char) {
        if let Some(text) = self.inputs.text_mut(self.focus) {
            text.push(c);
        }
    }

    fn backspace(&mut self) {
        if let Some(text) = self.inputs.text_mut(self.focus) {
            text.pop();
        }
    }

    fn scroll_by(&mut self, delta: i32) {
        self.scroll = scrolled(self.scroll, delta);
    }

    fn copy_text(&self) -> Option<String> {
        let text = self.coordinator.state().text();
        (!text.is_empty()).then(|| text.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text: String,
}

/// Conversational tab. The transcript lives only for the session.
pub(crate) struct AssistantSurface {
    pub input: String,
    pub transcript: Vec<ChatMessage>,
    pub last_question: Question,
    pub coordinator: RequestCoordinator,
    pub scroll: u16,
}

impl AssistantSurface {
    pub fn new() -> Self {
        Self {
            input: String::new(),
            transcript: vec![ChatMessage {
                speaker: Speaker::Assistant,
                text: GREETING.to_string(),
            }],
            last_question: Question::default(),
            coordinator: RequestCoordinator::new(SurfaceKind::Assistant),
            scroll: 0,
        }
    }
}

impl Surface for AssistantSurface {
    fn coordinator(&self) -> &RequestCoordinator {
        &self.coordinator
    }

    fn inputs(&self) -> &dyn PromptSpec {
        &self.last_question
    }

    fn submit(&mut self, dispatch: &UnboundedSender<UiCommand>) -> Option<RequestToken> {
        if self.coordinator.state().is_loading() {
            return None;
        }
        let question = Question::new(self.input.trim());
        let token = self.coordinator.issue(&question, dispatch)?;
        self.transcript.push(ChatMessage {
            speaker: Speaker::User,
            text: question.text.clone(),
        });
        self.last_question = question;
        self.input.clear();
        Some(token)
    }

    fn resolve(&mut self, completion: Completion) -> Resolution {
        let resolution = self.coordinator.resolve(completion);
        if resolution == Resolution::Applied {
            let text = match self.coordinator.state() {
                SurfaceState::Success { text } => text.clone(),
                SurfaceState::Error { message } => message.clone(),
                SurfaceState::Idle | SurfaceState::Loading => return resolution,
            };
            self.transcript.push(ChatMessage {
                speaker: Speaker::Assistant,
                text,
            });
        }
        resolution
    }

    fn reset(&mut self) {
        self.coordinator.reset();
        self.input.clear();
        self.scroll = 0;
    }

    fn move_focus(&mut self, _forward: bool) {}

    fn cycle_focused(&mut self, _forward: bool) {}

    fn type_char(&mut self, c: char) {
        self.input.push(c);
    }

    fn backspace(&mut self) {
        self.input.pop();
    }

    fn scroll_by(&mut self, delta: i32) {
        self.scroll = scrolled(self.scroll, delta);
    }

    fn copy_text(&self) -> Option<String> {
        self.transcript
            .iter()
            .rev()
            .find(|m| m.speaker == Speaker::Assistant)
            .map(|m| m.text.clone())
    }
}

/// Everything the UI thread draws. Owned by that thread only.
pub(crate) struct UiState {
    pub tab: usize,
    pub model: String,
    pub info: String,
    pub show_speech: bool,
    pub assistant: AssistantSurface,
    pub chords: FormSurface<ChordRequest>,
    pub exercises: FormSurface<ExerciseRequest>,
    pub path: FormSurface<LearningPathRequest>,
    pub library: FormSurface<LibraryRequest>,
}

impl UiState {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            tab: 0,
            model: model.into(),
            info: "Enter: generar  Tab: cambiar pestaña  F1: ayuda  Esc: salir".into(),
            show_speech: false,
            assistant: AssistantSurface::new(),
            chords: FormSurface::new(),
            exercises: FormSurface::new(),
            path: FormSurface::new(),
            library: FormSurface::new(),
        }
    }

    pub fn surface_mut(&mut self, kind: SurfaceKind) -> &mut dyn Surface {
        match kind {
            SurfaceKind::Assistant => &mut self.assistant,
            SurfaceKind::Chords => &mut self.chords,
            SurfaceKind::Exercises => &mut self.exercises,
            SurfaceKind::LearningPath => &mut self.path,
            SurfaceKind::Library => &mut self.library,
        }
    }

    pub fn surface(&self, kind: SurfaceKind) -> &dyn Surface {
        match kind {
            SurfaceKind::Assistant => &self.assistant,
            SurfaceKind::Chords => &self.chords,
            SurfaceKind::Exercises => &self.exercises,
            SurfaceKind::LearningPath => &self.path,
            SurfaceKind::Library => &self.library,
        }
    }

    pub fn active_kind(&self) -> Option<SurfaceKind> {
        match self.tab {
            0 => Some(SurfaceKind::Assistant),
            1 => Some(SurfaceKind::Chords),
            2 => Some(SurfaceKind::Exercises),
            3 => Some(SurfaceKind::LearningPath),
            4 => Some(SurfaceKind::Library),
            _ => None,
        }
    }

    pub fn active_mut(&mut self) -> Option<&mut dyn Surface> {
        let kind = self.active_kind()?;
        Some(self.surface_mut(kind))
    }

    pub fn next_tab(&mut self, forward: bool) {
        let n = TABS.len();
        self.tab = if forward {
            (self.tab + 1) % n
        } else {
            (self.tab + n - 1) % n
        };
    }

    /// Route a controller event to the surface that issued it.
    pub fn apply_event(&mut self, ev: AppEvent) {
        match ev {
            AppEvent::Completed(c) => {
                let kind = c.surface;
                let token = c.token;
                match self.surface_mut(kind).resolve(c) {
                    Resolution::Applied => {
                        self.info = format!("{}: respuesta {} recibida", kind.title(), token);
                    }
                    Resolution::Stale => {
                        tracing::debug!(surface = ?kind, %token, "stale completion dropped by UI");
                    }
                }
            }
            AppEvent::Info(info) => self.info = info.to_message(),
        }
    }
}
