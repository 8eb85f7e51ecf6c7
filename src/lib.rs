//! offlinedb - a bounded, redacting, append-only offline record store
//!
//! - `store`: the capacity-bounded store producers write through
//! - `storage`: the checksummed record log behind it
//! - `submitter`: task flows that produce records via pluggable collaborators
//! - `http_server` and `cli`: outer surfaces
//! - `observability`: structured logs and counters

pub mod cli;
pub mod http_server;
pub mod observability;
pub mod storage;
pub mod store;
pub mod submitter;
