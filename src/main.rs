mod config;
mod llm;
mod quiz;
mod server;
mod store;

use crate::config::Config;
use crate::llm::LLMClient;
use crate::quiz::QuizService;
use crate::server::AppState;
use crate::store::{CommandStore, SqliteCommandStore};
use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    if config.llm_api_key.is_empty() {
        warn!("LLM_API_KEY is not set; upstream calls will be sent without credentials");
    }

    let store: Arc<dyn CommandStore> = Arc::new(
        SqliteCommandStore::open(&config.database_path).with_context(|| {
            format!(
                "failed to open command store at {}",
                config.database_path.display()
            )
        })?,
    );
    let gateway = Arc::new(LLMClient::new(config.llm_settings())?);

    info!(
        "Using model {} at {} (timeout {}s)",
        config.llm_model, config.llm_api_url, config.llm_timeout_secs
    );

    let state = AppState {
        quiz: QuizService::new(gateway, store.clone()),
        commands: store,
        quiz_tools: config.quiz_tools.clone(),
        llm_errors_as_status: config.llm_errors_as_status,
    };

    server::run(state, config.bind_addr).await
}
