//! Per-surface request coordination.
//!
//! A surface may have several requests in flight; only the most recently issued
//! one is allowed to change what the surface shows. Earlier requests are not
//! cancelled, their completions are dropped when they arrive.

use super::controller::UiCommand;
use crate::engine::GenerationError;
use crate::model::{Completion, GenerationRequest, RequestToken, SurfaceKind, SurfaceState};
use crate::prompt::PromptSpec;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution {
    Applied,
    Stale,
}

#[derive(Debug)]
pub(crate) struct RequestCoordinator {
    surface: SurfaceKind,
    current: RequestToken,
    minted: u64,
    state: SurfaceState,
}

impl RequestCoordinator {
    pub fn new(surface: SurfaceKind) -> Self {
        Self {
            surface,
            current: RequestToken::NONE,
            minted: 0,
            state: SurfaceState::Idle,
        }
    }

    pub fn state(&self) -> &SurfaceState {
        &self.state
    }

    #[cfg(test)]
    pub fn current_token(&self) -> RequestToken {
        self.current
    }

    /// Start a request for `inputs`. Returns `None` without touching state
    /// when the inputs are incomplete.
    pub fn issue<P>(
        &mut self,
        inputs: &P,
        dispatch: &UnboundedSender<UiCommand>,
    ) -> Option<RequestToken>
    where
        P: PromptSpec + ?Sized,
    {
        debug_assert_eq!(inputs.surface(), self.surface);
        if !inputs.is_complete() {
            tracing::debug!(surface = ?self.surface, "inputs incomplete, request not issued");
            return None;
        }

        self.minted += 1;
        let token = RequestToken(self.minted);
        self.current = token;
        self.state = SurfaceState::Loading;

        let request = GenerationRequest {
            surface: self.surface,
            token,
            prompt: inputs.prompt(),
            failure_context: inputs.failure_context(),
        };
        tracing::info!(surface = ?self.surface, %token, "request issued");

        if dispatch.send(UiCommand::Generate(request)).is_err() {
            tracing::error!(surface = ?self.surface, %token, "controller is gone");
            self.state = SurfaceState::Error {
                message: GenerationError::Generic("controller stopped".into())
                    .user_message(inputs.failure_context()),
            };
        }
        Some(token)
    }

    /// Apply a completion if it belongs to the current request.
    pub fn resolve(&mut self, completion: Completion) -> Resolution {
        if completion.surface != self.surface
            || completion.token.is_none()
            || completion.token != self.current
        {
            tracing::debug!(
                surface = ?self.surface,
                token = %completion.token,
                current = %self.current,
                "discarding stale completion"
            );
            return Resolution::Stale;
        }

        self.state = match completion.outcome {
            Ok(text) => SurfaceState::Success { text },
            Err(e) => {
                tracing::warn!(
                    surface = ?self.surface,
                    token = %completion.token,
                    error = %e,
                    "generation failed"
                );
                SurfaceState::Error {
                    message: e.user_message(completion.failure_context),
                }
            }
        };
        tracing::info!(surface = ?self.surface, token = %completion.token, "completion applied");
        Resolution::Applied
    }

    /// Return to idle. Anything still in flight will be discarded.
    pub fn reset(&mut self) {
        self.current = RequestToken::NONE;
        self.state = SurfaceState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Key, Mood, Style};
    use crate::prompt::{ChordRequest, LibraryRequest};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn chords() -> ChordRequest {
        ChordRequest {
            key: Key::GMajor,
            style: Style::Rock,
            mood: Mood::Epic,
        }
    }

    fn next_request(rx: &mut UnboundedReceiver<UiCommand>) -> GenerationRequest {
        match rx.try_recv() {
            Ok(UiCommand::Generate(req)) => req,
            other => panic!("expected a generate command, got {other:?}"),
        }
    }

    fn done(req: &GenerationRequest, outcome: Result<&str, GenerationError>) -> Completion {
        Completion {
            surface: req.surface,
            token: req.token,
            failure_context: req.failure_context,
            outcome: outcome.map(str::to_string),
        }
    }

    #[test]
    fn issue_enters_loading_and_dispatches_prompt() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut c = RequestCoordinator::new(SurfaceKind::Chords);
        let token = c.issue(&chords(), &tx).unwrap();
        assert_eq!(c.state(), &SurfaceState::Loading);
        assert_eq!(c.current_token(), token);

        let req = next_request(&mut rx);
        assert_eq!(req.token, token);
        assert_eq!(req.prompt, chords().prompt());
    }

    #[test]
    fn last_issued_wins_over_last_completed() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut c = RequestCoordinator::new(SurfaceKind::Chords);
        c.issue(&chords(), &tx);
        c.issue(&chords(), &tx);
        let first = next_request(&mut rx);
        let second = next_request(&mut rx);
        assert!(second.token > first.token);

        assert_eq!(c.resolve(done(&first, Ok("A"))), Resolution::Stale);
        assert_eq!(c.state(), &SurfaceState::Loading);
        assert_eq!(c.resolve(done(&second, Ok("B"))), Resolution::Applied);
        assert_eq!(c.state(), &SurfaceState::Success { text: "B".into() });
    }

    #[test]
    fn late_stale_completion_changes_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut c = RequestCoordinator::new(SurfaceKind::Chords);
        c.issue(&chords(), &tx);
        c.issue(&chords(), &tx);
        let first = next_request(&mut rx);
        let second = next_request(&mut rx);

        assert_eq!(c.resolve(done(&second, Ok("B"))), Resolution::Applied);
        assert_eq!(c.resolve(done(&first, Ok("A"))), Resolution::Stale);
        assert_eq!(c.state(), &SurfaceState::Success { text: "B".into() });
    }

    #[test]
    fn many_issues_resolved_in_reverse_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut c = RequestCoordinator::new(SurfaceKind::Chords);
        let mut reqs = Vec::new();
        for _ in 0..5 {
            c.issue(&chords(), &tx);
            reqs.push(next_request(&mut rx));
        }
        for (i, req) in reqs.iter().enumerate().rev() {
            let text = format!("r{i}");
            c.resolve(done(req, Ok(text.as_str())));
        }
        assert_eq!(c.state(), &SurfaceState::Success { text: "r4".into() });
    }

    #[test]
    fn reset_discards_pending_completion() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut c = RequestCoordinator::new(SurfaceKind::Chords);
        c.issue(&chords(), &tx);
        let req = next_request(&mut rx);
        c.reset();
        assert_eq!(c.resolve(done(&req, Ok("tarde"))), Resolution::Stale);
        assert_eq!(c.state(), &SurfaceState::Idle);
        assert_eq!(c.state().text(), "");
        assert!(c.current_token().is_none());
    }

    #[test]
    fn rate_limit_then_success_overwrites_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut c = RequestCoordinator::new(SurfaceKind::Chords);
        c.issue(&chords(), &tx);
        let first = next_request(&mut rx);
        c.resolve(done(&first, Err(GenerationError::RateLimited)));
        assert_eq!(
            c.state(),
            &SurfaceState::Error {
                message: GenerationError::RateLimited.user_message("")
            }
        );

        c.issue(&chords(), &tx);
        let second = next_request(&mut rx);
        c.resolve(done(&second, Ok("Am - F - C - G")));
        assert_eq!(c.state(), &SurfaceState::Success { text: "Am - F - C - G".into() });
    }

    #[test]
    fn generic_failure_uses_flow_context() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut c = RequestCoordinator::new(SurfaceKind::Chords);
        c.issue(&chords(), &tx);
        let req = next_request(&mut rx);
        c.resolve(done(&req, Err(GenerationError::Generic("boom".into()))));
        match c.state() {
            SurfaceState::Error { message } => {
                assert!(message.contains("generar la progresión de acordes"))
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn incomplete_inputs_do_not_issue() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut c = RequestCoordinator::new(SurfaceKind::Library);
        assert_eq!(c.issue(&LibraryRequest::default(), &tx), None);
        assert_eq!(c.state(), &SurfaceState::Idle);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn completion_for_another_surface_is_ignored() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut c = RequestCoordinator::new(SurfaceKind::Chords);
        c.issue(&chords(), &tx);
        let mut req = next_request(&mut rx);
        req.surface = SurfaceKind::Exercises;
        assert_eq!(c.resolve(done(&req, Ok("x"))), Resolution::Stale);
        assert!(c.state().is_loading());
    }

    #[test]
    fn closed_controller_is_a_terminal_error() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut c = RequestCoordinator::new(SurfaceKind::Chords);
        assert!(c.issue(&chords(), &tx).is_some());
        assert!(matches!(c.state(), SurfaceState::Error { .. }));
    }
}
