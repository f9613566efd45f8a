use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::{Arc, Mutex};

/// One hypothesis from the handwriting recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionCandidate {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl RecognitionCandidate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Text-to-speech engine. Calls are fire-and-forget.
pub trait SpeechSynthesizer {
    fn speak(&mut self, text: &str, rate: f32);
}

/// Drawing surface that holds the user's strokes.
pub trait DrawingCanvas {
    fn clear(&mut self);
}

impl<S: SpeechSynthesizer + ?Sized> SpeechSynthesizer for Box<S> {
    fn speak(&mut self, text: &str, rate: f32) {
        (**self).speak(text, rate)
    }
}

impl<C: DrawingCanvas + ?Sized> DrawingCanvas for Box<C> {
    fn clear(&mut self) {
        (**self).clear()
    }
}

/// Speaks by printing to a writer, one line per utterance.
pub struct TerminalSpeech<W: Write> {
    out: W,
}

impl<W: Write> TerminalSpeech<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> SpeechSynthesizer for TerminalSpeech<W> {
    fn speak(&mut self, text: &str, rate: f32) {
        let _ = writeln!(self.out, "  >> {text}  (rate {rate:.1})");
        let _ = self.out.flush();
    }
}

/// Canvas stand-in for a terminal: announces each clear.
pub struct TerminalCanvas<W: Write> {
    out: W,
}

impl<W: Write> TerminalCanvas<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> DrawingCanvas for TerminalCanvas<W> {
    fn clear(&mut self) {
        let _ = writeln!(self.out, "  [canvas cleared]");
        let _ = self.out.flush();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
}

/// Records every utterance. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSpeech {
    spoken: Arc<Mutex<Vec<Utterance>>>,
}

impl RecordingSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.spoken.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn texts(&self) -> Vec<String> {
        self.spoken().into_iter().map(|u| u.text).collect()
    }
}

impl SpeechSynthesizer for RecordingSpeech {
    fn speak(&mut self, text: &str, rate: f32) {
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push(Utterance {
                text: text.to_string(),
                rate,
            });
        }
    }
}

/// Counts clears. Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    clears: Arc<Mutex<usize>>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clears(&self) -> usize {
        self.clears.lock().map(|c| *c).unwrap_or_default()
    }
}

impl DrawingCanvas for RecordingCanvas {
    fn clear(&mut self) {
        if let Ok(mut clears) = self.clears.lock() {
            *clears += 1;
        }
    }
}
