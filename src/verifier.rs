use crate::collaborators::{DrawingCanvas, RecognitionCandidate};
use crate::content::{ClassLevel, ItemKind, PracticeItem};
use crate::error::PracticeError;
use crate::normalize::normalize;
use crate::sampler::SamplingSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierState {
    AwaitingInput,
    Checking,
    Passed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The recognizer produced nothing (or is switched off).
    NoRecognitionAvailable,
    /// Normalized texts differ.
    Mismatch,
    /// There was no target to check against.
    EmptyContentPool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed(FailureReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub verdict: Verdict,
    pub recognized_text: String,
    pub expected_text: String,
}

impl VerificationResult {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }

    pub fn failure(&self) -> Option<FailureReason> {
        match self.verdict {
            Verdict::Passed => None,
            Verdict::Failed(reason) => Some(reason),
        }
    }

    /// The user-facing error for a failed check.
    pub fn error(&self, level: Option<ClassLevel>, kind: ItemKind) -> Option<PracticeError> {
        match self.failure()? {
            FailureReason::NoRecognitionAvailable => Some(PracticeError::NoRecognitionAvailable),
            FailureReason::Mismatch => Some(PracticeError::Mismatch {
                recognized: self.recognized_text.clone(),
                expected: self.expected_text.clone(),
            }),
            FailureReason::EmptyContentPool => Some(PracticeError::EmptyContentPool {
                level: level.unwrap_or_default(),
                kind,
            }),
        }
    }
}

/// Holds the current target, checks recognized text against it and moves the
/// sampler on a pass.
pub struct PracticeVerifier<C: DrawingCanvas> {
    session: SamplingSession,
    target: PracticeItem,
    state: VerifierState,
    last: Option<VerificationResult>,
    canvas: C,
}

impl<C: DrawingCanvas> PracticeVerifier<C> {
    pub fn new(session: SamplingSession, canvas: C) -> Self {
        let target = session.current();
        Self {
            session,
            target,
            state: VerifierState::AwaitingInput,
            last: None,
            canvas,
        }
    }

    /// Replace the expected text without touching the sampler cursor.
    pub fn set_target(&mut self, item: PracticeItem) {
        self.target = item;
        self.last = None;
        self.state = VerifierState::AwaitingInput;
    }

    /// Check the recognizer's best guess against the target.
    ///
    /// A pass advances the sampler, clears the canvas and loads the next
    /// target. A failure leaves everything in place so the user can retry.
    pub fn submit_recognition(&mut self, candidate: Option<&str>) -> VerificationResult {
        self.state = VerifierState::Checking;
        let expected_text = self.target.text.clone();
        let recognized_text = candidate.unwrap_or_default().to_string();

        let verdict = if recognized_text.is_empty() {
            Verdict::Failed(FailureReason::NoRecognitionAvailable)
        } else if self.target.is_empty() {
            Verdict::Failed(FailureReason::EmptyContentPool)
        } else if normalize(&recognized_text) == normalize(&expected_text) {
            Verdict::Passed
        } else {
            Verdict::Failed(FailureReason::Mismatch)
        };

        let result = VerificationResult {
            verdict,
            recognized_text,
            expected_text,
        };

        match verdict {
            Verdict::Passed => {
                tracing::info!(expected = %result.expected_text, "verification_passed");
                self.advance();
                self.state = VerifierState::Passed;
            }
            Verdict::Failed(reason) => {
                tracing::info!(
                    ?reason,
                    expected = %result.expected_text,
                    recognized = %result.recognized_text,
                    "verification_failed"
                );
                self.state = VerifierState::Failed;
            }
        }

        self.last = Some(result.clone());
        result
    }

    /// Use the first candidate from a recognizer callback; the rest are ignored.
    pub fn submit_candidates(&mut self, candidates: &[RecognitionCandidate]) -> VerificationResult {
        self.submit_recognition(candidates.first().map(|c| c.text.as_str()))
    }

    /// Move to the next item without checking anything.
    pub fn advance(&mut self) -> &PracticeItem {
        self.canvas.clear();
        self.target = self.session.advance();
        self.state = VerifierState::AwaitingInput;
        &self.target
    }

    /// Dismiss the verdict dialog and go back to waiting for input.
    pub fn acknowledge(&mut self) {
        if matches!(self.state, VerifierState::Passed | VerifierState::Failed) {
            self.state = VerifierState::AwaitingInput;
        }
    }

    /// Swap in a freshly drawn session (level or mode change).
    pub fn replace_session(&mut self, session: SamplingSession) {
        self.session = session;
        let first = self.session.current();
        self.set_target(first);
    }

    /// [`VerificationResult::error`] for this verifier's level and item kind.
    pub fn explain(&self, result: &VerificationResult) -> Option<PracticeError> {
        result.error(self.session.level(), self.session.kind())
    }

    pub fn target(&self) -> &PracticeItem {
        &self.target
    }

    pub fn state(&self) -> VerifierState {
        self.state
    }

    pub fn last_result(&self) -> Option<&VerificationResult> {
        self.last.as_ref()
    }

    pub fn session(&self) -> &SamplingSession {
        &self.session
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }
}
