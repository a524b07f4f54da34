use clap::Parser;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";
pub const DEFAULT_MODEL: &str = "o4-mini";

/// Sysaidmin - AI System Administration Helper
#[derive(Debug, Parser)]
#[command(name = "sysaidmin", version)]
pub struct Args {
    /// A detailed description of your problem
    pub problem: String,

    /// Custom base URL for the AI API
    #[arg(
        short = 'b',
        long,
        env = "SYSAIDMIN_BASE_URL",
        default_value = DEFAULT_BASE_URL
    )]
    pub base_url: String,

    /// API key for the AI service
    #[arg(
        short = 'a',
        long,
        env = "SYSAIDMIN_API_KEY",
        default_value = "",
        hide_env_values = true
    )]
    pub api_key: String,

    /// The model to use for the AI agent
    #[arg(short = 'm', long, env = "SYSAIDMIN_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,
}
