// Library surface for the binary and for headless/integration tests.
pub mod app_dirs;
pub mod clock;
pub mod collaborators;
pub mod config;
pub mod content;
pub mod countdown;
pub mod error;
pub mod history;
pub mod limiter;
pub mod normalize;
pub mod phonics;
pub mod practice;
pub mod runtime;
pub mod sampler;
pub mod timers;
pub mod verifier;

pub use error::{ContentError, HistoryError, PracticeError};
pub use practice::{PracticeMode, PracticeSession, SessionSettings};
