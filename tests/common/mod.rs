//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use confer::agent::{ConversationEngine, DeploymentCatalog};
use confer::core::Config;
use confer::llm::{Completer, ScriptedCompleter};
use confer::service::AgentService;
use confer::session::SessionStore;
use confer::tools::standard_registry;

/// Service wired to scripted completers
pub struct Harness {
    pub service: AgentService,
    pub assistant: Arc<ScriptedCompleter>,
    pub manager: Arc<ScriptedCompleter>,
    pub extractor: Arc<ScriptedCompleter>,
}

/// Directory holding the sample finance records
pub fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// Configuration independent of the environment
pub fn config(weather_url: Option<String>, weather_key: Option<&str>) -> Config {
    let mut config = Config::default();
    config.weather.api_url = weather_url;
    config.weather.api_key = weather_key.map(str::to_string);
    config.finance.data_dir = data_dir();
    config.weather.max_rounds = 10;
    config.finance.max_rounds = 20;
    config.engine.termination_token = "TERMINATE".to_string();
    config
}

pub fn harness(
    config: &Config,
    assistant: ScriptedCompleter,
    manager: ScriptedCompleter,
    extractor: ScriptedCompleter,
) -> Harness {
    let assistant = Arc::new(assistant);
    let manager = Arc::new(manager);
    let extractor = Arc::new(extractor);

    let registry = standard_registry(config, extractor.clone() as Arc<dyn Completer>)
        .expect("registry builds");
    let engine = ConversationEngine::from_config(config, assistant.clone(), Arc::new(registry));
    let catalog = DeploymentCatalog::new(config).with_manager_completer(manager.clone());
    let service = AgentService::new(engine, catalog, Arc::new(SessionStore::from_config(config)));

    Harness {
        service,
        assistant,
        manager,
        extractor,
    }
}
