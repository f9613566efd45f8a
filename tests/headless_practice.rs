use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use scrawl::clock::ManualClock;
use scrawl::collaborators::{RecordingCanvas, RecordingSpeech};
use scrawl::content::{ClassLevel, JsonContentStore};
use scrawl::runtime::{FixedTicker, PracticeEvent, Runner, TestEventSource};
use scrawl::{PracticeError, PracticeMode, PracticeSession, SessionSettings};

const CONTENT: &str = r#"{
    "levels": {
        "1": { "words": ["cat"], "sentences": ["I see a cat."] },
        "3": { "words": ["frog", "ship", "drum"], "sentences": [] }
    }
}"#;

type Session = PracticeSession<RecordingSpeech, RecordingCanvas>;

fn session(settings: SessionSettings) -> (Session, ManualClock, RecordingSpeech, RecordingCanvas) {
    let clock = ManualClock::new();
    let speech = RecordingSpeech::new();
    let canvas = RecordingCanvas::new();
    let session = PracticeSession::new(
        settings,
        Box::new(JsonContentStore::from_json(CONTENT).unwrap()),
        Arc::new(clock.clone()),
        speech.clone(),
        canvas.clone(),
        StdRng::seed_from_u64(3),
    );
    (session, clock, speech, canvas)
}

// Each Tick stands for 100ms of simulated time.
fn drive(session: &mut Session, clock: &ManualClock, rx: mpsc::Receiver<PracticeEvent>, max_steps: u32) {
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );
    for _ in 0..max_steps {
        match runner.step() {
            PracticeEvent::Tick => clock.advance_ms(100),
            PracticeEvent::Line(line) if line.is_empty() => {
                session.play();
            }
            PracticeEvent::Line(line) if line == ":next" => {
                session.next();
            }
            PracticeEvent::Line(line) => {
                session.submit(Some(&line));
            }
            PracticeEvent::Closed => break,
        }
        if session.poll().expired {
            break;
        }
    }
    session.teardown();
}

#[test]
fn headless_writing_flow_passes_and_clears_canvas() {
    let (mut s, clock, _, canvas) = session(SessionSettings::default());
    assert_eq!(s.target().text, "cat");

    let (tx, rx) = mpsc::channel();
    tx.send(PracticeEvent::Line("dog".into())).unwrap();
    tx.send(PracticeEvent::Line("CAT.".into())).unwrap();
    drop(tx);

    drive(&mut s, &clock, rx, 50);

    assert_eq!(s.tally().attempts, 2);
    assert_eq!(s.tally().passed, 1);
    assert_eq!(canvas.clears(), 1);
    assert!(s.is_finished());
}

#[test]
fn headless_phonics_playback_runs_to_the_whole_word() {
    let (mut s, clock, speech, _) = session(SessionSettings {
        level: ClassLevel::new(1),
        mode: PracticeMode::Phonics,
        ..SessionSettings::default()
    });

    let (tx, rx) = mpsc::channel();
    tx.send(PracticeEvent::Line(String::new())).unwrap();

    // The sender stays alive, so the loop keeps ticking through the schedule.
    drive(&mut s, &clock, rx, 40);
    drop(tx);

    assert_eq!(speech.texts(), vec!["c", "a", "t", "cat"]);
}

#[test]
fn headless_next_word_cancels_pending_sounds() {
    let (mut s, clock, speech, _) = session(SessionSettings {
        level: ClassLevel::new(3),
        mode: PracticeMode::Phonics,
        ..SessionSettings::default()
    });
    let first = s.target().text.clone();

    let (tx, rx) = mpsc::channel();
    tx.send(PracticeEvent::Line(String::new())).unwrap();
    tx.send(PracticeEvent::Line(":next".into())).unwrap();
    drop(tx);

    drive(&mut s, &clock, rx, 50);

    // Only the first sound fired before the word changed.
    assert_eq!(speech.texts(), vec![first[..1].to_string()]);
    assert_eq!(s.pending_timers(), 0);
}

#[test]
fn headless_timed_session_stops_at_expiry() {
    let (mut s, clock, _, _) = session(SessionSettings {
        time_limit_secs: Some(1),
        ..SessionSettings::default()
    });

    let (_tx, rx) = mpsc::channel();
    drive(&mut s, &clock, rx, 100);

    assert!(s.is_finished());
    assert_eq!(s.time_left().as_deref(), Some("0:00"));
    assert_eq!(s.submit(Some("cat")), None);
}

#[test]
fn headless_empty_pool_reports_no_content() {
    let (mut s, _, _, _) = session(SessionSettings {
        level: ClassLevel::new(3),
        mode: PracticeMode::Sentence,
        ..SessionSettings::default()
    });
    let result = s.submit(Some("A frog.")).unwrap();
    assert_eq!(
        s.explain(&result).map(|e| e.to_string()),
        Some("No sentences available for class 3".to_string())
    );
    assert!(matches!(
        s.explain(&result),
        Some(PracticeError::EmptyContentPool { .. })
    ));
}
