//! Mint task flow
//!
//! validate → (score above threshold) live build → `"nano"` record
//!          → mint → `"nft"` record
//!
//! The live build delay is awaited before the store is touched, so no
//! lock is held while a task sleeps. Store writes run on the blocking pool. A task dropped mid-flight has either
//! committed a whole record or none.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::collaborators::{Minter, Validator};
use super::errors::{TaskError, TaskResult};
use super::voice::VoiceMode;
use crate::observability::{log_event_with_fields, Event};
use crate::store::OfflineStore;

pub const BUILD_RECORD_TYPE: &str = "nano";
pub const RESULT_RECORD_TYPE: &str = "nft";
pub const GIFT_RECORD_TYPE: &str = "gift_proposal";

const HAPTIC_PROFILE: &str = "11D-fractal";

/// Task submitter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Scores strictly above this trigger a live build
    #[serde(default = "default_build_threshold")]
    pub build_threshold: f64,

    /// Simulated build time
    #[serde(default = "default_live_build_delay_ms")]
    pub live_build_delay_ms: u64,

    /// Initial voice mode for queries
    #[serde(default)]
    pub voice_mode: VoiceMode,

    /// Attached to every result record
    #[serde(default = "default_metadata")]
    pub metadata: Value,
}

fn default_build_threshold() -> f64 {
    0.9199
}

fn default_live_build_delay_ms() -> u64 {
    100
}

fn default_metadata() -> Value {
    json!({ "type": "TruthBond", "glyph": "TRUST" })
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            build_threshold: default_build_threshold(),
            live_build_delay_ms: default_live_build_delay_ms(),
            voice_mode: VoiceMode::default(),
            metadata: default_metadata(),
        }
    }
}

impl TaskConfig {
    pub fn live_build_delay(&self) -> Duration {
        Duration::from_millis(self.live_build_delay_ms)
    }
}

/// A mint request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintTask {
    pub pillar: String,
    #[serde(default)]
    pub proof: Value,
}

/// What a completed mint task reports back
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MintOutcome {
    pub score: f64,
    pub derived_id: String,
    pub token: String,
    pub haptic: String,
    pub built: bool,
}

/// Blueprint stored for a live build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub seq: String,
    pub target_score: f64,
}

/// A stored gift proposal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftProposal {
    pub recipient: String,
    pub amount: u64,
}

/// Runs mint tasks against the shared store.
pub struct TaskOrchestrator {
    store: Arc<OfflineStore>,
    validator: Arc<dyn Validator>,
    minter: Arc<dyn Minter>,
    config: TaskConfig,
}

impl TaskOrchestrator {
    pub fn new(
        store: Arc<OfflineStore>,
        validator: Arc<dyn Validator>,
        minter: Arc<dyn Minter>,
        config: TaskConfig,
    ) -> Self {
        Self {
            store,
            validator,
            minter,
            config,
        }
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    /// Validates, optionally builds, mints and records one task.
    pub async fn execute(&self, task: &MintTask) -> TaskResult<MintOutcome> {
        if task.pillar.trim().is_empty() {
            return Err(TaskError::InvalidTask("pillar must not be empty".to_string()));
        }

        let score = self.validator.validate(&task.proof);
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(TaskError::InvalidScore(score));
        }

        let derived_id = format!("ipfs://dna_{}", task.pillar);

        let built = score > self.config.build_threshold;
        if built {
            self.live_build(&task.pillar).await?;
        }

        let token = self.minter.mint(&task.pillar, &derived_id, score);
        self.store
            .store_async(
                RESULT_RECORD_TYPE,
                json!({ "nft": token, "metadata": self.config.metadata }),
            )
            .await?;

        self.store.metrics().increment_tasks();
        log_event_with_fields(
            Event::TaskExecuted,
            &[
                ("built", if built { "true" } else { "false" }),
                ("pillar", &task.pillar),
                ("score", &score.to_string()),
            ],
        );

        Ok(MintOutcome {
            score,
            derived_id,
            token,
            haptic: HAPTIC_PROFILE.to_string(),
            built,
        })
    }

    async fn live_build(&self, pillar: &str) -> TaskResult<()> {
        log_event_with_fields(Event::LiveBuild, &[("seq", pillar)]);
        tokio::time::sleep(self.config.live_build_delay()).await;

        let blueprint = Blueprint {
            seq: pillar.to_string(),
            target_score: self.config.build_threshold,
        };
        self.store.store_async(BUILD_RECORD_TYPE, blueprint).await?;
        self.store.metrics().increment_live_builds();
        Ok(())
    }

    /// Records a gift proposal.
    pub fn propose_gift(&self, recipient: &str, amount: u64) -> TaskResult<GiftProposal> {
        if recipient.trim().is_empty() {
            return Err(TaskError::InvalidTask("recipient must not be empty".to_string()));
        }

        let proposal = GiftProposal {
            recipient: recipient.to_string(),
            amount,
        };
        self.store.store(GIFT_RECORD_TYPE, &proposal)?;
        Ok(proposal)
    }
}
