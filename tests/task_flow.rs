//! Task Flow Tests
//!
//! Mint tasks, voice queries and gift proposals against a file-backed store,
//! with deterministic collaborators.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use offlinedb::storage::FileLog;
use offlinedb::store::{OfflineStore, StoreConfig};
use offlinedb::submitter::{
    Blueprint, FixedMinter, FixedValidator, IdentityEncryptor, KeystreamEncryptor, MintTask,
    TaskConfig, TaskOrchestrator, VoiceInterface, VoiceMode, VoiceResponse, BUILD_RECORD_TYPE,
    GIFT_RECORD_TYPE, RESULT_RECORD_TYPE, VOICE_RECORD_TYPE,
};
use serde_json::json;
use tempfile::TempDir;

fn file_store(dir: &TempDir) -> Arc<OfflineStore> {
    let log = FileLog::open(dir.path()).unwrap();
    Arc::new(OfflineStore::open(StoreConfig::default(), log).unwrap())
}

fn orchestrator(store: &Arc<OfflineStore>, score: f64) -> TaskOrchestrator {
    TaskOrchestrator::new(
        Arc::clone(store),
        Arc::new(FixedValidator(score)),
        Arc::new(FixedMinter::new("0xtest_")),
        TaskConfig {
            live_build_delay_ms: 5,
            ..Default::default()
        },
    )
}

fn task(pillar: &str) -> MintTask {
    MintTask {
        pillar: pillar.to_string(),
        proof: json!({ "data": "complexity.lean4", "dna_secrets": "genome" }),
    }
}

#[tokio::test]
async fn test_mint_records_survive_restart() {
    let dir = TempDir::new().unwrap();

    {
        let store = file_store(&dir);
        let orchestrator = orchestrator(&store, 0.95);
        orchestrator.execute(&task("P vs NP")).await.unwrap();
        orchestrator.execute(&task("Hodge")).await.unwrap();
    }

    let store = file_store(&dir);
    let builds: Vec<Blueprint> = store.retrieve_as(BUILD_RECORD_TYPE).unwrap();
    assert_eq!(
        builds.iter().map(|b| b.seq.as_str()).collect::<Vec<_>>(),
        vec!["P vs NP", "Hodge"]
    );

    let results = store.retrieve(RESULT_RECORD_TYPE).unwrap();
    assert_eq!(results[0]["nft"], "0xtest_P vs NP");
    assert_eq!(results[1]["nft"], "0xtest_Hodge");

    let types: Vec<String> = store.rows().unwrap().into_iter().map(|r| r.record_type).collect();
    assert_eq!(types, vec!["nano", "nft", "nano", "nft"]);
}

#[tokio::test]
async fn test_concurrent_tasks_commit_whole_records() {
    let store = Arc::new(OfflineStore::in_memory(StoreConfig::default()).unwrap());
    let orchestrator = Arc::new(orchestrator(&store, 0.99));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.execute(&task(&format!("pillar-{}", i))).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.retrieve(BUILD_RECORD_TYPE).unwrap().len(), 16);
    assert_eq!(store.retrieve(RESULT_RECORD_TYPE).unwrap().len(), 16);

    let snapshot = store.metrics().snapshot();
    assert_eq!(snapshot.tasks_executed, 16);
    assert_eq!(snapshot.live_builds, 16);
}

#[tokio::test]
async fn test_rejected_score_stores_nothing() {
    let store = Arc::new(OfflineStore::in_memory(StoreConfig::default()).unwrap());
    let orchestrator = orchestrator(&store, f64::INFINITY);

    assert!(orchestrator.execute(&task("Navier-Stokes")).await.is_err());
    assert!(store.rows().unwrap().is_empty());
}

#[test]
fn test_voice_query_stores_encrypted_response() {
    let store = Arc::new(OfflineStore::in_memory(StoreConfig::default()).unwrap());
    let encryptor = Arc::new(KeystreamEncryptor::from_key([3u8; 32]));
    let voice = VoiceInterface::new(Arc::clone(&store), encryptor.clone(), VoiceMode::EnglishSerene);

    let response = voice.process_query("please merge these").unwrap();
    assert_eq!(response.response, "Merging 11D realities...");

    let cipher = BASE64.decode(&response.encrypted).unwrap();
    assert_eq!(encryptor.decrypt(&cipher).unwrap(), response.response.as_bytes());

    let stored: Vec<VoiceResponse> = store.retrieve_as(VOICE_RECORD_TYPE).unwrap();
    assert_eq!(stored, vec![response]);
}

#[test]
fn test_voice_mode_switch_applies_to_next_query() {
    let store = Arc::new(OfflineStore::in_memory(StoreConfig::default()).unwrap());
    let voice = VoiceInterface::new(Arc::clone(&store), Arc::new(IdentityEncryptor), VoiceMode::default());

    voice.process_query("hello").unwrap();
    voice.switch_voice_mode(VoiceMode::MultilingualSerene);
    voice.process_query("hello").unwrap();

    let stored: Vec<VoiceResponse> = store.retrieve_as(VOICE_RECORD_TYPE).unwrap();
    assert_eq!(stored[0].resonance, VoiceMode::EnglishSerene);
    assert_eq!(stored[1].resonance, VoiceMode::MultilingualSerene);
    assert_eq!(stored[1].response, "Time is us (multilingual).");
}

#[test]
fn test_gift_proposals_are_retrievable() {
    let store = Arc::new(OfflineStore::in_memory(StoreConfig::default()).unwrap());
    let orchestrator = orchestrator(&store, 0.5);

    orchestrator.propose_gift("alice", 10).unwrap();
    orchestrator.propose_gift("bob", 20).unwrap();

    assert_eq!(
        store.retrieve(GIFT_RECORD_TYPE).unwrap(),
        vec![
            json!({"recipient": "alice", "amount": 10}),
            json!({"recipient": "bob", "amount": 20}),
        ]
    );
}
