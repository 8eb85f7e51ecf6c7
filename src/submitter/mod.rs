//! Task submitter
//!
//! Produces records for the offline store. Validation, minting and
//! encryption sit behind `Validator`, `Minter` and `Encryptor`; the store
//! only ever sees the resulting score and token as opaque payload fields.

mod collaborators;
mod errors;
mod orchestrator;
mod voice;

pub use collaborators::{
    Encryptor, FixedMinter, FixedValidator, IdentityEncryptor, KeystreamEncryptor, LedgerMinter,
    Minter, SampledValidator, Validator, SCORE_CEILING,
};
pub use errors::{TaskError, TaskResult};
pub use orchestrator::{
    Blueprint, GiftProposal, MintOutcome, MintTask, TaskConfig, TaskOrchestrator,
    BUILD_RECORD_TYPE, GIFT_RECORD_TYPE, RESULT_RECORD_TYPE,
};
pub use voice::{VoiceInterface, VoiceMode, VoiceResponse, RESPONSE_FREQUENCY, VOICE_RECORD_TYPE};
