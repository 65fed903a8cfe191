use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};

use crate::engine::EngineClient;
use crate::error::Result;
use crate::model;

/// Command-line options for the translation gateway.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "OPUS-MT translation gateway", long_about = None)]
pub struct CliArgs {
    /// Listen address for the HTTP server.
    #[arg(long = "listen", value_name = "ADDR", env = "OPUS_GATEWAY_LISTEN", default_value = "0.0.0.0:8003")]
    pub listen: String,

    /// Base URL of the inference server hosting the OPUS-MT models.
    #[arg(
        long = "engine-url",
        value_name = "URL",
        env = "OPUS_ENGINE_URL",
        default_value = "https://api-inference.huggingface.co"
    )]
    pub engine_url: String,

    /// Bearer token sent with every inference request.
    #[arg(long = "engine-token", env = "HF_API_TOKEN", hide_env_values = true)]
    pub engine_token: Option<String>,

    /// File holding the feedback history as a JSON array.
    #[arg(
        long = "history-file",
        value_name = "PATH",
        env = "OPUS_HISTORY_FILE",
        default_value = "translation_history.json"
    )]
    pub history_file: PathBuf,

    /// Translate this text once and exit instead of serving.
    #[arg(long = "text")]
    pub text: Option<String>,

    /// Model used when a request names none; also the one-shot model.
    #[arg(
        long = "model",
        env = "OPUS_DEFAULT_MODEL",
        default_value = model::DEFAULT_MODEL_ID,
        value_parser = model::model_value_parser()
    )]
    pub model: String,

    /// List the loaded models and exit.
    #[arg(long = "list-models", action = ArgAction::SetTrue)]
    pub list_models: bool,

    /// Trust the catalog instead of probing each model at startup.
    #[arg(long = "skip-warmup", action = ArgAction::SetTrue)]
    pub skip_warmup: bool,

    /// Network timeout (seconds) applied to inference requests.
    #[arg(long = "timeout", default_value_t = 120, value_parser = clap::value_parser!(u64).range(1..=600))]
    timeout_secs: u64,

    /// Deployment mode; development turns on verbose gateway logging.
    #[arg(long = "app-env", value_enum, env = "APP_ENV", default_value_t = RunMode::Production)]
    pub run_mode: RunMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    Development,
    Production,
}

impl RunMode {
    /// Log filter applied when `RUST_LOG` is not set.
    pub fn default_log_filter(self) -> &'static str {
        match self {
            RunMode::Development => "opus_gateway=debug,info",
            RunMode::Production => "info",
        }
    }
}

impl CliArgs {
    /// Returns the configured network timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the outbound HTTP client from CLI inputs.
    pub fn engine_client(&self) -> Result<EngineClient> {
        EngineClient::new(&self.engine_url, self.engine_token.as_deref(), self.timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_settings() {
        let args = CliArgs::try_parse_from(["opus-gateway"]).expect("defaults should parse");

        assert_eq!(args.listen, "0.0.0.0:8003");
        assert_eq!(args.engine_url, "https://api-inference.huggingface.co");
        assert_eq!(args.history_file, PathBuf::from("translation_history.json"));
        assert_eq!(args.model, model::DEFAULT_MODEL_ID);
        assert_eq!(args.timeout(), Duration::from_secs(120));
        assert_eq!(args.run_mode, RunMode::Production);
        assert!(!args.skip_warmup);
        assert!(args.text.is_none());
    }

    #[test]
    fn rejects_models_outside_the_catalog() {
        let result = CliArgs::try_parse_from(["opus-gateway", "--model", "gpt-4o-mini"]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_out_of_range_timeouts() {
        assert!(CliArgs::try_parse_from(["opus-gateway", "--timeout", "0"]).is_err());
        assert!(CliArgs::try_parse_from(["opus-gateway", "--timeout", "601"]).is_err());
        assert!(CliArgs::try_parse_from(["opus-gateway", "--timeout", "600"]).is_ok());
    }

    #[test]
    fn run_mode_parses_from_kebab_case() {
        let args = CliArgs::try_parse_from(["opus-gateway", "--app-env", "development"])
            .expect("development should parse");
        assert_eq!(args.run_mode, RunMode::Development);
        assert_eq!(args.run_mode.default_log_filter(), "opus_gateway=debug,info");
    }
}
