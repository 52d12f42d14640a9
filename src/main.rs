//! Fusion Leads CLI
//!
//! Drives the same submission pipeline the funnel pages use, from the
//! terminal. Handy for smoke-testing a backend deployment or replaying a
//! lead that a visitor reported as lost.
//!
//! ```text
//! fusion-leads list
//! fusion-leads submit --funnel trades --field name="Bob" --field email=bob@plumb.co \
//!     --field business_name="Bob's Plumbing" --field trade=Plumbing --dry-run
//! ```

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fusion_leads::analytics::sink_from_config;
use fusion_leads::config::PipelineConfig;
use fusion_leads::form::{validate, FieldValues, SubmitOutcome, ValidationErrors};
use fusion_leads::funnels::Funnel;
use fusion_leads::metrics::metrics;
use fusion_leads::transport::{HttpTransport, LeadTransport};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "fusion-leads.toml", env = "FUSION_CONFIG")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List funnels with their endpoints and fields
    List,

    /// Validate and submit one lead
    Submit {
        /// Funnel form type (healthcare, trades, small_business, ...)
        #[arg(short, long)]
        funnel: Funnel,

        /// Field value, repeatable
        #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        fields: Vec<(String, String)>,

        /// Print the payload instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    Ok((key.trim().to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose)?;

    match args.command {
        Command::List => list_funnels(),
        Command::Submit {
            funnel,
            fields,
            dry_run,
        } => {
            let config = load_config(&args.config)?;
            let values: FieldValues = fields.into_iter().collect();
            if dry_run {
                preview(funnel, &config, &values)
            } else {
                submit(funnel, &config, values).await
            }
        }
    }
}

/// Initialize logging
fn init_logging(verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        "fusion_leads=debug,info"
    } else {
        "fusion_leads=info,warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load configuration from file with fallback to defaults
fn load_config(path: &str) -> Result<PipelineConfig> {
    if std::path::Path::new(path).exists() {
        PipelineConfig::from_file_with_env(path)
            .with_context(|| format!("Failed to load config from {}", path))
    } else {
        warn!("Config file '{}' not found, using defaults", path);
        PipelineConfig::with_env_overrides()
    }
}

fn list_funnels() -> Result<()> {
    for funnel in Funnel::ALL {
        let def = funnel.definition()?;
        println!("{:<16} POST {}", funnel.form_type(), funnel.endpoint());
        for field in def.schema.fields() {
            let marker = if field.required { "*" } else { " " };
            println!("  {}{:<18} {}", marker, field.key, field.kind);
        }
    }
    Ok(())
}

fn print_errors(errors: &ValidationErrors) {
    for (key, error) in errors.iter() {
        eprintln!("  {}: {}", key, error);
    }
}

fn preview(funnel: Funnel, config: &PipelineConfig, values: &FieldValues) -> Result<()> {
    let def = funnel.definition()?.configured(config);

    match validate(&def.schema, values) {
        Ok(normalized) => {
            let payload = def.adapter.adapt(&normalized, &config.source);
            println!("POST {}{}", config.api.base_url.trim_end_matches('/'), def.adapter.endpoint());
            println!("{}", serde_json::to_string_pretty(&payload.to_json())?);
            Ok(())
        }
        Err(errors) => {
            print_errors(&errors);
            bail!("{}", errors)
        }
    }
}

async fn submit(funnel: Funnel, config: &PipelineConfig, values: FieldValues) -> Result<()> {
    let def = funnel.definition()?.configured(config);
    let transport: Arc<dyn LeadTransport> = Arc::new(HttpTransport::from_config(&config.api)?);
    let sink = sink_from_config(&config.analytics)?;
    let controller = def.controller(transport, sink, &config.source);

    info!(funnel = %funnel, base_url = %config.api.base_url, "Submitting lead");

    let outcome = controller.submit(values).await;

    if let Ok(text) = metrics().gather_text() {
        debug!("Lead metrics:\n{}", text);
    }

    match outcome {
        SubmitOutcome::Succeeded { message } => {
            println!("{}", message);
            Ok(())
        }
        SubmitOutcome::Invalid(errors) => {
            print_errors(&errors);
            bail!("{}", errors)
        }
        SubmitOutcome::Failed { message } => bail!("{}", message),
        SubmitOutcome::Ignored | SubmitOutcome::Discarded => {
            bail!("Submission did not complete")
        }
    }
}
