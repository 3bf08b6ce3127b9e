use crate::config::{self, Settings};
use crate::engine::{GeminiClient, Generator};
use crate::model::{
    AppEvent, Goal, Instrument, Key, Mood, SkillLevel, Style, SurfaceState, Weakness,
};
use crate::orchestrator::{self, ExportTargets, RequestCoordinator, Resolution, UiCommand};
use crate::prompt::{
    ChordRequest, ExerciseRequest, LearningPathRequest, LibraryRequest, PromptSpec, Question,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "asistente-musical",
    version,
    about = "Musical practice assistant backed by Gemini, with an optional TUI"
)]
pub struct Cli {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Model identifier [default: gemini-2.5-flash]
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Base URL of the Generative Language API
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Per-request timeout [default: 60s]
    #[arg(long, global = true)]
    pub timeout: Option<humantime::Duration>,

    /// Path to a JSON config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the result as JSON (no TUI)
    #[arg(long, global = true)]
    pub json: bool,

    /// Print the result as plain text (no TUI)
    #[arg(long, global = true, conflicts_with = "json")]
    pub text: bool,

    /// Write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Generate a chord progression for a key, style and mood
    Chords {
        #[arg(long, value_enum, default_value_t = Key::CMajor)]
        key: Key,
        #[arg(long, value_enum, default_value_t = Style::Pop)]
        style: Style,
        #[arg(long, value_enum, default_value_t = Mood::Happy)]
        mood: Mood,
        /// Also produce the spoken (text-to-speech) rendition
        #[arg(long)]
        speech: bool,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Generate three warm-up exercises for a weakness
    Exercises {
        #[arg(long, value_enum, default_value_t = Instrument::Guitar)]
        instrument: Instrument,
        #[arg(long, value_enum, default_value_t = Weakness::FingerSpeed)]
        weakness: Weakness,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Create a four-week learning path
    Path {
        #[arg(long, value_enum, default_value_t = Instrument::Piano)]
        instrument: Instrument,
        #[arg(long, value_enum, default_value_t = SkillLevel::Beginner)]
        level: SkillLevel,
        #[arg(long, value_enum, default_value_t = Goal::Improvisation)]
        goal: Goal,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Produce a simplified chord chart for a song
    Library {
        #[arg(long)]
        title: String,
        #[arg(long)]
        artist: String,
        #[arg(long, value_enum, default_value_t = SkillLevel::Beginner)]
        level: SkillLevel,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Ask the assistant a music theory question
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
        #[command(flatten)]
        export: ExportArgs,
    },
}

#[derive(Debug, Args, Clone, Default)]
pub struct ExportArgs {
    /// Write a printable HTML document
    #[arg(long)]
    pub export_html: Option<PathBuf>,

    /// Write the result record as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,
}

impl From<&ExportArgs> for ExportTargets {
    fn from(a: &ExportArgs) -> Self {
        ExportTargets {
            html: a.export_html.clone(),
            json: a.export_json.clone(),
        }
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let interactive = args.command.is_none();
    crate::logging::init(args.verbose, args.log_file.as_deref(), !interactive)?;

    let Some(command) = args.command.clone() else {
        if args.json || args.text {
            return Err(anyhow::anyhow!(
                "--json and --text need a subcommand (chords, exercises, path, library, ask)"
            ));
        }
        return run_interactive(args).await;
    };

    let settings = config::resolve(&args)?;
    match command {
        Command::Chords {
            key,
            style,
            mood,
            speech,
            export,
        } => {
            let inputs = ChordRequest { key, style, mood };
            run_once(&args, settings, &inputs, speech, &export).await
        }
        Command::Exercises {
            instrument,
            weakness,
            export,
        } => {
            let inputs = ExerciseRequest {
                instrument,
                weakness,
            };
            run_once(&args, settings, &inputs, false, &export).await
        }
        Command::Path {
            instrument,
            level,
            goal,
            export,
        } => {
            let inputs = LearningPathRequest {
                instrument,
                level,
                goal,
            };
            run_once(&args, settings, &inputs, false, &export).await
        }
        Command::Library {
            title,
            artist,
            level,
            export,
        } => {
            let inputs = LibraryRequest {
                title,
                artist,
                level,
            };
            run_once(&args, settings, &inputs, false, &export).await
        }
        Command::Ask { question, export } => {
            let inputs = Question::new(question.join(" "));
            run_once(&args, settings, &inputs, false, &export).await
        }
    }
}

#[cfg(feature = "tui")]
async fn run_interactive(args: Cli) -> Result<()> {
    let settings = config::resolve(&args)?;
    crate::tui::run(settings).await
}

#[cfg(not(feature = "tui"))]
async fn run_interactive(_args: Cli) -> Result<()> {
    Err(anyhow::anyhow!(
        "built without TUI support; use a subcommand (chords, exercises, path, library, ask)"
    ))
}

/// Issue a single request through the same controller/coordinator path the TUI uses,
/// wait for it to resolve and print the outcome.
async fn run_once<P>(
    args: &Cli,
    settings: Settings,
    inputs: &P,
    speech: bool,
    export: &ExportArgs,
) -> Result<()>
where
    P: PromptSpec + ?Sized,
{
    let generator: Arc<dyn Generator> = Arc::new(GeminiClient::new(&settings)?);
    let state = generate_once(generator.clone(), inputs).await?;

    let processed =
        orchestrator::process_generation(inputs, generator.model(), &state, speech, &export.into());

    let (out_tx, out_handle) = spawn_output_writer();
    for msg in &processed.export_messages {
        let _ = out_tx.send(OutputLine::Stderr(msg.clone()));
    }

    let failure = match &processed.record.state {
        SurfaceState::Error { message } => Some(message.clone()),
        _ => None,
    };

    if args.json {
        let out = serde_json::to_string_pretty(&processed.record)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else if let SurfaceState::Success { text } = &processed.record.state {
        let _ = out_tx.send(OutputLine::Stdout(text.clone()));
        if let Some(spoken) = processed.record.speech.as_deref() {
            let _ = out_tx.send(OutputLine::Stdout(String::new()));
            let _ = out_tx.send(OutputLine::Stdout(format!("Lectura: {spoken}")));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;

    match failure {
        Some(message) => Err(anyhow::anyhow!(message)),
        None => Ok(()),
    }
}

/// Run one request to resolution and return the surface's final state.
async fn generate_once<P>(generator: Arc<dyn Generator>, inputs: &P) -> Result<SurfaceState>
where
    P: PromptSpec + ?Sized,
{
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let controller = tokio::spawn(orchestrator::run_controller(generator, event_tx, cmd_rx));

    let mut coordinator = RequestCoordinator::new(inputs.surface());
    coordinator
        .issue(inputs, &cmd_tx)
        .context("missing input: title, artist and question must not be empty")?;

    while coordinator.state().is_loading() {
        let event = tokio::select! {
            ev = event_rx.recv() => ev,
            _ = tokio::signal::ctrl_c() => {
                let _ = cmd_tx.send(UiCommand::Quit);
                return Err(anyhow::anyhow!("interrupted"));
            }
        };
        match event {
            Some(AppEvent::Completed(c)) => {
                if coordinator.resolve(c) == Resolution::Stale {
                    tracing::debug!("ignored completion for an older request");
                }
            }
            Some(AppEvent::Info(info)) => tracing::info!("{}", info.to_message()),
            None => break,
        }
    }

    let _ = cmd_tx.send(UiCommand::Quit);
    controller.await.context("controller task failed")??;
    Ok(coordinator.state().clone())
}
