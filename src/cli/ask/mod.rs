//! Ask command - one-shot pipeline run over stdout
//!
//! The line-by-line transport: every trace step prints as it happens,
//! followed by the final result. Callers driving this binary as a
//! subprocess consume the same computation as `POST /ask`.

use std::time::Duration;

use clap::Args;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::domain::{AnswerMode, FinalResponse, RequestContext, TraceLog};
use crate::infrastructure::logging;

/// Arguments for the ask command
#[derive(Args)]
pub struct AskArgs {
    /// The question to answer
    pub query: String,

    /// Produce a structured card instead of markdown
    #[arg(long)]
    pub card: bool,

    /// Caller latitude
    #[arg(long, requires = "lon")]
    pub lat: Option<f64>,

    /// Caller longitude
    #[arg(long, requires = "lat")]
    pub lon: Option<f64>,
}

/// Run one query and stream step lines to stdout
pub async fn run(args: AskArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&logging::LoggingConfig {
        level: "warn".to_string(),
        format: config.logging.format.clone(),
    });

    let state = crate::create_app_state_with_config(&config)?;

    let mode = if args.card {
        AnswerMode::Card
    } else {
        AnswerMode::Markdown
    };

    let mut ctx = RequestContext::new(mode);
    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        ctx = ctx.with_location(lat, lon);
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let printer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            println!("{}", line);
        }
    });

    let mut trace = TraceLog::new().with_sink(tx);
    let deadline = Duration::from_secs(config.pipeline.request_timeout_secs);

    let result = tokio::time::timeout(
        deadline,
        state.pipeline.ask(&args.query, &ctx, &mut trace),
    )
    .await
    .map_err(|_| anyhow::anyhow!("request deadline exceeded"))??;

    drop(trace);
    printer.await?;

    match result {
        FinalResponse::Markdown(text) => println!("result: {}", serde_json::json!(text)),
        FinalResponse::Card(card) => println!("result: {}", serde_json::to_string(&card)?),
    }

    Ok(())
}
