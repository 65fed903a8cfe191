mod cli;
mod engine;
mod error;
mod feedback;
mod metrics;
mod model;
mod server;
mod translate;

use clap::Parser;
use cli::{CliArgs, RunMode};
use error::Result;
use feedback::FeedbackStore;
use model::ModelRegistry;
use translate::{Selector, TranslationService};

fn init_tracing(run_mode: RunMode) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(run_mode.default_log_filter()));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

async fn run(args: &CliArgs) -> Result<()> {
    let client = args.engine_client()?;

    if let Some(text) = args.text.as_deref() {
        // One-shot mode talks straight to the chosen model; the translation
        // request itself tells us whether the model is up.
        let registry = ModelRegistry::load(&client, true).await?;
        let service = TranslationService::new(registry, args.model.clone());
        return run_once(args, &service, text).await;
    }

    let registry = ModelRegistry::load(&client, args.skip_warmup).await?;
    if args.list_models {
        for entry in registry.entries() {
            println!(
                "{}\t{} ({} to {})",
                entry.spec.id, entry.spec.description, entry.spec.source, entry.spec.target
            );
        }
        return Ok(());
    }
    if registry.is_empty() {
        tracing::warn!("no models answered the startup probe; translation requests will be rejected");
    }

    let service = TranslationService::new(registry, args.model.clone());
    let store = FeedbackStore::new(&args.history_file);
    server::run_server(args, service, store).await
}

async fn run_once(args: &CliArgs, service: &TranslationService, text: &str) -> Result<()> {
    let translation = service
        .translate(Selector::ById(&args.model), Some(text))
        .await?;

    let payload = serde_json::json!({
        "translated_text": translation.translated_text,
        "source_language": translation.source_lang,
        "target_language": translation.target_lang,
        "time": translation.time,
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    // Environment overrides come from `.env` when present; CLI parsing reads
    // them, so this has to happen first.
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    init_tracing(args.run_mode);

    if let Err(error) = run(&args).await {
        tracing::error!("{error:?}");
        std::process::exit(1);
    }
}
