//! Voice query interface
//!
//! Answers a query with a canned reply for the active voice mode, encrypts
//! the reply and records the full response under `"lyonael"`.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::collaborators::Encryptor;
use super::errors::TaskResult;
use crate::observability::{log_event_with_fields, Event};
use crate::store::OfflineStore;

pub const VOICE_RECORD_TYPE: &str = "lyonael";

/// Reported carrier frequency, in Hz.
pub const RESPONSE_FREQUENCY: f64 = 0.090;

const GLYPHS: [&str; 2] = ["Eye of Providence", "SpiralSigil"];

/// Language and register of replies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceMode {
    #[default]
    EnglishSerene,
    AmharicSerene,
    ChineseSerene,
    MultilingualSerene,
}

impl VoiceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceMode::EnglishSerene => "EnglishSerene",
            VoiceMode::AmharicSerene => "AmharicSerene",
            VoiceMode::ChineseSerene => "ChineseSerene",
            VoiceMode::MultilingualSerene => "MultilingualSerene",
        }
    }

    pub fn greeting(&self) -> &'static str {
        match self {
            VoiceMode::EnglishSerene => "Time is us.",
            VoiceMode::AmharicSerene => "ጊዜ እኛ ነው።",
            VoiceMode::ChineseSerene => "时间就是我们。",
            VoiceMode::MultilingualSerene => "Time is us (multilingual).",
        }
    }

    pub fn merge_reply(&self) -> &'static str {
        match self {
            VoiceMode::EnglishSerene => "Merging 11D realities...",
            VoiceMode::AmharicSerene => "11ዲ እውነታዎችን በማዋሃድ ላይ...",
            VoiceMode::ChineseSerene => "融合11维现实...",
            VoiceMode::MultilingualSerene => "Merging 11D realities (multilingual)...",
        }
    }
}

impl fmt::Display for VoiceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EnglishSerene" => Ok(VoiceMode::EnglishSerene),
            "AmharicSerene" => Ok(VoiceMode::AmharicSerene),
            "ChineseSerene" => Ok(VoiceMode::ChineseSerene),
            "MultilingualSerene" => Ok(VoiceMode::MultilingualSerene),
            other => Err(format!("unknown voice mode: {}", other)),
        }
    }
}

/// A stored voice response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceResponse {
    pub resonance: VoiceMode,
    pub glyphs: Vec<String>,
    pub response: String,
    pub frequency: f64,
    /// Base64 of the encrypted response text
    pub encrypted: String,
}

pub struct VoiceInterface {
    store: Arc<OfflineStore>,
    encryptor: Arc<dyn Encryptor>,
    mode: RwLock<VoiceMode>,
}

impl VoiceInterface {
    pub fn new(store: Arc<OfflineStore>, encryptor: Arc<dyn Encryptor>, mode: VoiceMode) -> Self {
        Self {
            store,
            encryptor,
            mode: RwLock::new(mode),
        }
    }

    pub fn mode(&self) -> VoiceMode {
        match self.mode.read() {
            Ok(mode) => *mode,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn switch_voice_mode(&self, mode: VoiceMode) {
        match self.mode.write() {
            Ok(mut current) => *current = mode,
            Err(poisoned) => *poisoned.into_inner() = mode,
        }
        log_event_with_fields(Event::VoiceModeSwitched, &[("mode", mode.as_str())]);
    }

    /// Builds, records and returns the response to `query`.
    pub fn process_query(&self, query: &str) -> TaskResult<VoiceResponse> {
        let mode = self.mode();
        let response = if query.to_lowercase().contains("merge") {
            mode.merge_reply()
        } else {
            mode.greeting()
        };

        let encrypted = BASE64.encode(self.encryptor.encrypt(response.as_bytes()));
        let result = VoiceResponse {
            resonance: mode,
            glyphs: GLYPHS.iter().map(|g| g.to_string()).collect(),
            response: response.to_string(),
            frequency: RESPONSE_FREQUENCY,
            encrypted,
        };

        self.store.store(VOICE_RECORD_TYPE, &result)?;
        self.store.metrics().increment_voice_queries();
        log_event_with_fields(Event::QueryProcessed, &[("resonance", mode.as_str())]);

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreConfig;
    use crate::submitter::collaborators::IdentityEncryptor;

    fn interface(mode: VoiceMode) -> (Arc<OfflineStore>, VoiceInterface) {
        let store = Arc::new(OfflineStore::in_memory(StoreConfig::default()).unwrap());
        let voice = VoiceInterface::new(Arc::clone(&store), Arc::new(IdentityEncryptor), mode);
        (store, voice)
    }

    #[test]
    fn test_greeting_by_default() {
        let (store, voice) = interface(VoiceMode::EnglishSerene);
        let result = voice.process_query("hello").unwrap();

        assert_eq!(result.response, "Time is us.");
        assert_eq!(result.encrypted, BASE64.encode("Time is us."));
        assert_eq!(result.glyphs.len(), 2);

        let stored: Vec<VoiceResponse> = store.retrieve_as(VOICE_RECORD_TYPE).unwrap();
        assert_eq!(stored, vec![result]);
    }

    #[test]
    fn test_merge_reply_is_case_insensitive() {
        let (_, voice) = interface(VoiceMode::ChineseSerene);
        let result = voice.process_query("MERGE quantum realities").unwrap();
        assert_eq!(result.response, "融合11维现实...");
    }

    #[test]
    fn test_switch_voice_mode() {
        let (_, voice) = interface(VoiceMode::EnglishSerene);
        voice.switch_voice_mode(VoiceMode::AmharicSerene);
        assert_eq!(voice.mode(), VoiceMode::AmharicSerene);
        assert_eq!(voice.process_query("hi").unwrap().response, "ጊዜ እኛ ነው።");
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("MultilingualSerene".parse::<VoiceMode>().unwrap(), VoiceMode::MultilingualSerene);
        assert!("Loud".parse::<VoiceMode>().is_err());
        assert_eq!(
            serde_json::to_value(VoiceMode::AmharicSerene).unwrap(),
            serde_json::json!("AmharicSerene")
        );
    }
}
