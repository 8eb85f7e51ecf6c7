//! Observable events
//!
//! Every log line the crate emits names one of these events.

use std::fmt;

use super::logger::Severity;

/// Observable events in offlinedb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Process startup begins
    BootStart,
    /// Configuration loaded and validated
    ConfigLoaded,
    /// HTTP server bound and accepting requests
    Serving,
    /// Shutdown initiated
    ShutdownStart,
    /// Shutdown complete, log synced
    ShutdownComplete,

    // Store lifecycle
    /// Log replay begins
    ReplayBegin,
    /// Log replay complete, store ready
    ReplayComplete,
    /// Replay hit a complete but invalid frame (FATAL)
    ReplayFailed,
    /// A torn final frame was cut from the log
    TornTailDiscarded,
    /// Log rewritten to live records only
    LogCompacted,

    // Store operations
    /// Record committed
    RecordStored,
    /// Oldest record evicted to make room
    RecordEvicted,
    /// Record refused by the oversize policy
    RecordRejected,
    /// Record dropped by the oversize policy
    StorageExhausted,
    /// Commit failed; store unchanged
    StoreFailed,

    // Task submitter
    /// Mint task finished
    TaskExecuted,
    /// Live build simulated
    LiveBuild,
    /// Token minted
    TokenMinted,
    /// Voice query answered
    QueryProcessed,
    /// Voice mode switched
    VoiceModeSwitched,
    /// Voice websocket connected
    VoiceSocketOpened,
    /// Voice websocket closed
    VoiceSocketClosed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "OFFLINEDB_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::Serving => "OFFLINEDB_SERVING",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::ReplayBegin => "LOG_REPLAY_BEGIN",
            Event::ReplayComplete => "LOG_REPLAY_COMPLETE",
            Event::ReplayFailed => "LOG_REPLAY_FAILED",
            Event::TornTailDiscarded => "LOG_TORN_TAIL_DISCARDED",
            Event::LogCompacted => "LOG_COMPACTED",

            Event::RecordStored => "RECORD_STORED",
            Event::RecordEvicted => "RECORD_EVICTED",
            Event::RecordRejected => "RECORD_REJECTED",
            Event::StorageExhausted => "STORAGE_EXHAUSTED",
            Event::StoreFailed => "STORE_FAILED",

            Event::TaskExecuted => "TASK_EXECUTED",
            Event::LiveBuild => "LIVE_BUILD",
            Event::TokenMinted => "TOKEN_MINTED",
            Event::QueryProcessed => "QUERY_PROCESSED",
            Event::VoiceModeSwitched => "VOICE_MODE_SWITCHED",
            Event::VoiceSocketOpened => "VOICE_SOCKET_OPENED",
            Event::VoiceSocketClosed => "VOICE_SOCKET_CLOSED",
        }
    }

    /// Severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ReplayFailed => Severity::Fatal,
            Event::StoreFailed => Severity::Error,
            Event::TornTailDiscarded
            | Event::RecordEvicted
            | Event::RecordRejected
            | Event::StorageExhausted => Severity::Warn,
            _ => Severity::Info,
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
