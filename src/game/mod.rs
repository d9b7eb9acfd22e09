//! Round resolution: cast queue, payloads, effects, passives and the
//! phase orchestrator

/// Conditional logging that avoids allocation when the feature is disabled
///
/// `log_if_verbose!(state, "...")` logs at normal verbosity,
/// `log_if_verbose!(state, verbose: "...")` at verbose. Without the
/// verbose-logging feature both compile to nothing, so no `format!` runs.
macro_rules! log_if_verbose {
    ($self:expr, verbose: $($arg:tt)*) => {{
        #[cfg(feature = "verbose-logging")]
        {
            $self.log_verbose(&format!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$self;
        }
    }};
    ($self:expr, $($arg:tt)*) => {{
        #[cfg(feature = "verbose-logging")]
        {
            $self.log_normal(&format!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$self;
        }
    }};
}

pub mod cast_queue;
pub mod effects;
pub mod logger;
pub mod passives;
pub mod payload;
pub mod round;
pub mod snapshot;
pub mod state;
pub mod state_hash;
pub mod stats;
pub mod targeting;

pub use cast_queue::CastEntry;
pub use effects::CastOutcome;
pub use logger::{LogEntry, LogSink, OutputMode, RoundLogger, VerbosityLevel};
pub use payload::{CastRecord, RuntimeSpellPayload};
pub use round::{
    MatchResult, RoundEngine, RoundInput, RoundOptions, RoundPhase, RoundResult,
    DEFAULT_MAX_CASTS_PER_ROUND,
};
pub use snapshot::{recording_callback, LastAction, RoundStep, StepCallback};
pub use state::{DamageCause, RoundState};
pub use state_hash::{compute_board_hash, format_hash};
