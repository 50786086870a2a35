use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "google")]
    Gemini,
    #[value(name = "openai", alias = "open-ai")]
    OpenAI,
}

#[derive(Parser, Debug)]
#[command(name = "vibe_blueprint", version, about = "Turn a product idea into a platform pick, PRD, tickets and codegen prompts")]
pub struct Args {
    /// Root directory for recorded request/response artifacts.
    #[arg(long)]
    pub root: Option<String>,

    /// TOML config file; CLI flags override its values.
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub api_base: Option<String>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Where exported documents are written.
    #[arg(long)]
    pub out_dir: Option<String>,

    /// Prefill product data from a JSON or TOML file.
    #[arg(long)]
    pub input: Option<String>,

    /// Run the whole flow without prompting (requires --input), export and exit.
    #[arg(long, default_value_t = false)]
    pub batch: bool,

    #[arg(long, default_value_t = false)]
    pub save_request: bool,

    #[arg(long, default_value_t = false)]
    pub save_response: bool,

    #[arg(long, default_value_t = false)]
    pub debug: bool,
}
