use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_QUIZ_TOOLS: [&str; 11] = [
    "git",
    "docker",
    "kubernetes",
    "bash",
    "npm",
    "yarn",
    "mvn",
    "gradle",
    "terraform",
    "aws",
    "gcloud",
];

/// Runtime configuration. Every flag can also be set through the
/// environment (or a `.env` file loaded before parsing).
#[derive(Debug, Clone, Parser)]
#[command(name = "command-buddy", version, about = "Command-line quiz backend")]
pub struct Config {
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8080")]
    pub bind_addr: SocketAddr,

    #[arg(long, env = "DATABASE_PATH", default_value = "command-buddy.db")]
    pub database_path: PathBuf,

    #[arg(long, env = "LLM_API_KEY", default_value = "", hide_env_values = true)]
    pub llm_api_key: String,

    #[arg(
        long,
        env = "LLM_API_URL",
        default_value = "https://api.groq.com/openai/v1/chat/completions"
    )]
    pub llm_api_url: String,

    #[arg(long, env = "LLM_MODEL", default_value = "llama-3.3-70b-versatile")]
    pub llm_model: String,

    /// Name used in error messages returned for failed upstream calls.
    #[arg(long, env = "LLM_API_NAME", default_value = "Groq")]
    pub llm_api_name: String,

    #[arg(long, env = "LLM_TIMEOUT_SECS", default_value_t = 30)]
    pub llm_timeout_secs: u64,

    /// Answer 502/504 on upstream failures instead of 200 with the error text.
    #[arg(long, env = "LLM_ERRORS_AS_STATUS")]
    pub llm_errors_as_status: bool,

    #[arg(
        long,
        env = "QUIZ_TOOLS",
        value_delimiter = ',',
        default_values = DEFAULT_QUIZ_TOOLS
    )]
    pub quiz_tools: Vec<String>,
}

/// The subset of the configuration the LLM gateway needs.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub api_name: String,
    pub timeout: Duration,
}

impl Config {
    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            api_key: self.llm_api_key.clone(),
            api_url: self.llm_api_url.clone(),
            model: self.llm_model.clone(),
            api_name: self.llm_api_name.clone(),
            timeout: Duration::from_secs(self.llm_timeout_secs),
        }
    }
}
