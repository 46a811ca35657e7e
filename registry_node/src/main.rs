use anyhow::Result;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use deedchain_node::api::{self, AppState};
use deedchain_node::artifacts::ArtifactStore;
use deedchain_node::config::Config;
use deedchain_node::consent::MockConsentVerifier;
use deedchain_node::finalization::MockFinalizationLedger;
use deedchain_node::identity::IdentityManager;
use deedchain_node::ledger::TransactionStore;
use deedchain_node::storage::{RocksDbStorage, Storage};
use deedchain_node::workflow::WorkflowEngine;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config_path = std::env::var("DEEDCHAIN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("deedchain.yaml"));
    let config = Config::load(Some(config_path.as_path()))?;
    info!("starting deedchain registry node v{}", env!("CARGO_PKG_VERSION"));

    let storage: Arc<dyn Storage> =
        Arc::new(RocksDbStorage::open(Path::new(&config.storage.data_dir))?);

    let engine = WorkflowEngine::new(
        TransactionStore::new(storage.clone()),
        Arc::new(MockConsentVerifier::new(config.consent.mock_delay())),
        Arc::new(MockFinalizationLedger),
    );
    let identity = IdentityManager::new(
        storage.clone(),
        &config.auth.jwt_secret,
        config.auth.token_ttl_secs,
    );
    let artifacts = ArtifactStore::open(
        PathBuf::from(&config.storage.artifact_temp_dir),
        PathBuf::from(&config.storage.artifact_archive_dir),
    )?;

    let state = AppState {
        engine: Arc::new(engine),
        identity: Arc::new(identity),
        artifacts: Arc::new(artifacts),
    };

    api::serve(state, &config.api.bind_addr, config.api.port).await
}
