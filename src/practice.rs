use crate::clock::Clock;
use crate::collaborators::{DrawingCanvas, RecognitionCandidate, SpeechSynthesizer};
use crate::content::{ClassLevel, ContentStore, ItemKind, PracticeItem};
use crate::countdown::CountdownTimer;
use crate::error::PracticeError;
use crate::phonics::{PhonicsScheduler, PlaybackRate};
use crate::sampler::SamplingSession;
use crate::timers::TimerGroup;
use crate::verifier::{PracticeVerifier, VerificationResult, VerifierState};
use clap::ValueEnum;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PracticeMode {
    #[default]
    Word,
    Sentence,
    Phonics,
}

impl PracticeMode {
    /// Pool the mode draws from. Phonics sounds out words.
    pub fn item_kind(self) -> ItemKind {
        match self {
            PracticeMode::Word | PracticeMode::Phonics => ItemKind::Word,
            PracticeMode::Sentence => ItemKind::Sentence,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub level: Option<ClassLevel>,
    pub mode: PracticeMode,
    pub size: usize,
    pub rate: f32,
    pub time_limit_secs: Option<u32>,
    pub recognition_enabled: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            level: Some(ClassLevel::default()),
            mode: PracticeMode::Word,
            size: 10,
            rate: crate::phonics::DEFAULT_RATE,
            time_limit_secs: None,
            recognition_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub attempts: u32,
    pub passed: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollOutcome {
    pub spoken: usize,
    pub ticks: u32,
    pub expired: bool,
}

/// One practice run: the current target, its verifier, the phonics player
/// and an optional time limit.
///
/// Every timer the session starts belongs to it. [`PracticeSession::teardown`]
/// (or dropping the session) cancels all of them, and nothing fires afterwards.
pub struct PracticeSession<S: SpeechSynthesizer, C: DrawingCanvas> {
    store: Box<dyn ContentStore>,
    rng: StdRng,
    settings: SessionSettings,
    verifier: PracticeVerifier<C>,
    phonics: PhonicsScheduler<S>,
    countdown: Option<CountdownTimer>,
    timed_out: Rc<Cell<bool>>,
    closed: bool,
    tally: Tally,
}

impl<S: SpeechSynthesizer, C: DrawingCanvas> PracticeSession<S, C> {
    pub fn new(
        settings: SessionSettings,
        store: Box<dyn ContentStore>,
        clock: Arc<dyn Clock>,
        speech: S,
        canvas: C,
        mut rng: StdRng,
    ) -> Self {
        let sampling = SamplingSession::new(
            store.as_ref(),
            settings.level,
            settings.mode.item_kind(),
            settings.size,
            &mut rng,
        );
        let verifier = PracticeVerifier::new(sampling, canvas);
        let phonics = PhonicsScheduler::new(clock.clone(), speech, PlaybackRate::new(settings.rate));

        let timed_out = Rc::new(Cell::new(false));
        let countdown = settings.time_limit_secs.map(|secs| {
            let flag = timed_out.clone();
            let mut timer = CountdownTimer::new(clock.clone()).on_expire(move || flag.set(true));
            timer.start(secs);
            timer
        });

        tracing::info!(
            level = ?settings.level.map(ClassLevel::get),
            mode = %settings.mode,
            size = settings.size,
            time_limit_secs = ?settings.time_limit_secs,
            "practice_session_started"
        );

        Self {
            store,
            rng,
            settings,
            verifier,
            phonics,
            countdown,
            timed_out,
            closed: false,
            tally: Tally::default(),
        }
    }

    /// Check a recognized string against the target.
    ///
    /// Returns `None` once the session is over. With recognition switched off
    /// every submission counts as "no recognition".
    pub fn submit(&mut self, candidate: Option<&str>) -> Option<VerificationResult> {
        if self.is_finished() {
            return None;
        }
        let candidate = candidate.filter(|_| self.settings.recognition_enabled);
        let result = self.verifier.submit_recognition(candidate);

        self.tally.attempts += 1;
        if result.passed() {
            self.tally.passed += 1;
            self.phonics.stop();
        }
        Some(result)
    }

    pub fn submit_candidates(
        &mut self,
        candidates: &[RecognitionCandidate],
    ) -> Option<VerificationResult> {
        self.submit(candidates.first().map(|c| c.text.as_str()))
    }

    /// Move on without checking. Any playback of the old word is cancelled.
    pub fn next(&mut self) -> Option<&PracticeItem> {
        if self.is_finished() {
            return None;
        }
        self.phonics.stop();
        Some(self.verifier.advance())
    }

    /// Sound out the current target. `None` if there is nothing to play.
    pub fn play(&mut self) -> Option<TimerGroup> {
        if self.is_finished() {
            return None;
        }
        let word = self.verifier.target().text.clone();
        self.phonics.play_word(&word)
    }

    pub fn stop_playback(&mut self) -> usize {
        self.phonics.stop()
    }

    pub fn faster(&self) -> f32 {
        self.phonics.rate().step_up()
    }

    pub fn slower(&self) -> f32 {
        self.phonics.rate().step_down()
    }

    pub fn set_rate(&self, rate: f32) -> f32 {
        self.phonics.rate().set(rate)
    }

    pub fn rate(&self) -> PlaybackRate {
        self.phonics.rate()
    }

    /// Change class level. Draws a fresh subset.
    pub fn set_level(&mut self, level: Option<ClassLevel>) {
        self.settings.level = level;
        self.resample();
    }

    /// Change practice mode. Draws a fresh subset.
    pub fn switch_mode(&mut self, mode: PracticeMode) {
        self.settings.mode = mode;
        self.resample();
    }

    pub fn acknowledge(&mut self) {
        self.verifier.acknowledge();
    }

    /// Fire whatever playback steps and countdown ticks have come due.
    pub fn poll(&mut self) -> PollOutcome {
        if self.closed {
            return PollOutcome::default();
        }

        let ticks = self.countdown.as_mut().map_or(0, CountdownTimer::poll);
        if self.timed_out.get() {
            let cancelled = self.phonics.stop();
            tracing::info!(
                attempts = self.tally.attempts,
                passed = self.tally.passed,
                cancelled,
                "practice_time_up"
            );
            self.closed = true;
            return PollOutcome {
                spoken: 0,
                ticks,
                expired: true,
            };
        }

        PollOutcome {
            spoken: self.phonics.poll(),
            ticks,
            expired: false,
        }
    }

    /// End the session and cancel every pending timer it owns.
    pub fn teardown(&mut self) {
        let cancelled = self.phonics.stop();
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.cancel();
        }
        if !self.closed {
            tracing::debug!(cancelled, "practice_session_teardown");
        }
        self.closed = true;
    }

    pub fn is_finished(&self) -> bool {
        self.closed || self.timed_out.get()
    }

    pub fn explain(&self, result: &VerificationResult) -> Option<PracticeError> {
        self.verifier.explain(result)
    }

    pub fn target(&self) -> &PracticeItem {
        self.verifier.target()
    }

    pub fn state(&self) -> VerifierState {
        self.verifier.state()
    }

    pub fn mode(&self) -> PracticeMode {
        self.settings.mode
    }

    pub fn level(&self) -> Option<ClassLevel> {
        self.settings.level
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn verifier(&self) -> &PracticeVerifier<C> {
        &self.verifier
    }

    pub fn phonics(&self) -> &PhonicsScheduler<S> {
        &self.phonics
    }

    pub fn is_playing(&self) -> bool {
        self.phonics.is_playing()
    }

    /// Time left as `M:SS`, when the session has a limit.
    pub fn time_left(&self) -> Option<String> {
        self.countdown.as_ref().map(CountdownTimer::display)
    }

    pub fn pending_timers(&self) -> usize {
        self.phonics.pending_steps()
            + self
                .countdown
                .as_ref()
                .map_or(0, CountdownTimer::pending_ticks)
    }

    fn resample(&mut self) {
        self.phonics.stop();
        let sampling = SamplingSession::new(
            self.store.as_ref(),
            self.settings.level,
            self.settings.mode.item_kind(),
            self.settings.size,
            &mut self.rng,
        );
        self.verifier.replace_session(sampling);
        tracing::debug!(
            level = ?self.settings.level.map(ClassLevel::get),
            mode = %self.settings.mode,
            "practice_session_resampled"
        );
    }
}

impl<S: SpeechSynthesizer, C: DrawingCanvas> Drop for PracticeSession<S, C> {
    fn drop(&mut self) {
        self.teardown();
    }
}
