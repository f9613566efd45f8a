use crate::clock::Clock;
use crate::collaborators::SpeechSynthesizer;
use crate::timers::{TimerGroup, TimerRegistry};
use itertools::Itertools;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Gap between consecutive sounds.
pub const STEP_INTERVAL: Duration = Duration::from_millis(600);

pub const MIN_RATE: f32 = 0.3;
pub const MAX_RATE: f32 = 1.5;
pub const RATE_STEP: f32 = 0.1;
pub const DEFAULT_RATE: f32 = 1.0;

/// Round to the slider's 0.1 steps and keep inside 0.3..=1.5.
pub fn clamp_rate(rate: f32) -> f32 {
    if !rate.is_finite() {
        return DEFAULT_RATE;
    }
    ((rate / RATE_STEP).round() * RATE_STEP).clamp(MIN_RATE, MAX_RATE)
}

/// Speech rate shared between the slider and in-flight playback.
///
/// Steps read the rate when they fire, so moving the slider mid-word changes
/// the sounds that have not played yet.
#[derive(Debug, Clone)]
pub struct PlaybackRate {
    bits: Arc<AtomicU32>,
}

impl PlaybackRate {
    pub fn new(rate: f32) -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(clamp_rate(rate).to_bits())),
        }
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::SeqCst))
    }

    /// Store a new rate; returns what was actually stored after clamping.
    pub fn set(&self, rate: f32) -> f32 {
        let rate = clamp_rate(rate);
        self.bits.store(rate.to_bits(), Ordering::SeqCst);
        rate
    }

    pub fn step_up(&self) -> f32 {
        self.set(self.get() + RATE_STEP)
    }

    pub fn step_down(&self) -> f32 {
        self.set(self.get() - RATE_STEP)
    }
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self::new(DEFAULT_RATE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhonicsPlan {
    pub word: String,
    pub units: Vec<String>,
    pub rate: f32,
}

impl PhonicsPlan {
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = clamp_rate(rate);
        self
    }

    /// Units joined for display, e.g. `c-a-t`.
    pub fn display(&self) -> String {
        self.units.iter().join("-")
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Split a word into one unit per character.
pub fn build_plan(word: &str) -> PhonicsPlan {
    PhonicsPlan {
        word: word.to_string(),
        units: word.chars().map(String::from).collect(),
        rate: DEFAULT_RATE,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackStep {
    pub delay: Duration,
    pub text: String,
}

impl PlaybackStep {
    pub fn delay_ms(&self) -> u64 {
        self.delay.as_millis() as u64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackSchedule {
    pub steps: Vec<PlaybackStep>,
}

impl PlaybackSchedule {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

/// Each unit at `i * 600ms`, then the whole word after the last unit.
/// An empty plan produces no steps at all.
pub fn schedule_playback(plan: &PhonicsPlan) -> PlaybackSchedule {
    if plan.is_empty() {
        return PlaybackSchedule::default();
    }

    let mut steps: Vec<PlaybackStep> = plan
        .units
        .iter()
        .enumerate()
        .map(|(i, unit)| PlaybackStep {
            delay: STEP_INTERVAL * i as u32,
            text: unit.clone(),
        })
        .collect();
    steps.push(PlaybackStep {
        delay: STEP_INTERVAL * plan.units.len() as u32,
        text: plan.word.clone(),
    });

    PlaybackSchedule { steps }
}

/// Plays at most one schedule at a time through a speech synthesizer.
pub struct PhonicsScheduler<S: SpeechSynthesizer> {
    clock: Arc<dyn Clock>,
    timers: TimerRegistry<String>,
    active: Option<TimerGroup>,
    rate: PlaybackRate,
    synth: S,
}

impl<S: SpeechSynthesizer> PhonicsScheduler<S> {
    pub fn new(clock: Arc<dyn Clock>, synth: S, rate: PlaybackRate) -> Self {
        Self {
            clock,
            timers: TimerRegistry::new(),
            active: None,
            rate,
            synth,
        }
    }

    /// Cancel whatever is playing, then queue every step of `plan`.
    ///
    /// Returns the group of the new schedule, or `None` when the plan is empty.
    pub fn start(&mut self, plan: &PhonicsPlan) -> Option<TimerGroup> {
        self.stop();

        let schedule = schedule_playback(plan);
        if schedule.is_empty() {
            return None;
        }

        let group = self.timers.new_group();
        let base = self.clock.now();
        for step in schedule.steps {
            self.timers.schedule(group, base + step.delay, step.text);
        }
        self.active = Some(group);

        tracing::debug!(
            word = %plan.word,
            units = %plan.display(),
            group = group.0,
            "phonics_playback_started"
        );
        Some(group)
    }

    /// Build a plan for `word` at the current rate and start it.
    pub fn play_word(&mut self, word: &str) -> Option<TimerGroup> {
        let plan = build_plan(word).with_rate(self.rate.get());
        self.start(&plan)
    }

    /// Cancel every unfired step of one schedule.
    pub fn cancel_playback(&mut self, group: TimerGroup) -> usize {
        let cancelled = self.timers.cancel_group(group);
        if self.active == Some(group) {
            self.active = None;
        }
        if cancelled > 0 {
            tracing::debug!(group = group.0, cancelled, "phonics_playback_cancelled");
        }
        cancelled
    }

    /// Cancel the active schedule, if any.
    pub fn stop(&mut self) -> usize {
        match self.active {
            Some(group) => self.cancel_playback(group),
            None => 0,
        }
    }

    /// Speak every step that has come due. Returns how many fired.
    pub fn poll(&mut self) -> usize {
        let now = self.clock.now();
        let mut fired = 0;
        while let Some((_, text)) = self.timers.pop_due(now) {
            let rate = self.rate.get();
            tracing::trace!(%text, rate, "phonics_step_fired");
            self.synth.speak(&text, rate);
            fired += 1;
        }
        if let Some(group) = self.active {
            if self.timers.pending_in(group) == 0 {
                self.active = None;
            }
        }
        fired
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    pub fn pending_steps(&self) -> usize {
        self.timers.pending()
    }

    pub fn rate(&self) -> PlaybackRate {
        self.rate.clone()
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }
}

impl<S: SpeechSynthesizer> Drop for PhonicsScheduler<S> {
    fn drop(&mut self) {
        self.timers.clear();
    }
}
