//! upcvault CLI
//!
//! Command-line front end for the product cache:
//! - `lookup` / `list` / `delete` for cache entries
//! - `prompts` / `responses` for the flat-directory repositories
//! - `respond` to render a prompt template against a cached record, send
//!   it to the completion endpoint, and save the reply

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;
use upcvault_core::{ProductKey, VaultContext, VaultResult};
use upcvault_events::Notifier;
use upcvault_llm::CleanupService;
use upcvault_service::{HttpSourceFetcher, LookupService};
use upcvault_store::{CacheStore, PromptStore, ResponseStore};

#[derive(Parser)]
#[command(name = "upcvault")]
#[command(author, version, about = "Key-addressed product lookup cache")]
struct Cli {
    /// Storage base directory.
    #[arg(long, env = "UPCVAULT_BASE", default_value = "./storage")]
    base_dir: PathBuf,

    /// Lookup API endpoint.
    #[arg(long, env = "UPCVAULT_SOURCE")]
    source_endpoint: Option<String>,

    /// Chat-completions base URL for text cleanup.
    #[arg(long, env = "UPCVAULT_CLEANUP")]
    cleanup_endpoint: Option<String>,

    /// Model name sent with cleanup requests.
    #[arg(long, env = "UPCVAULT_MODEL")]
    cleanup_model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a key: cache hit or fetch-normalize-clean-persist.
    Lookup { key: String },
    /// List cached entries, newest first.
    List,
    /// Delete an entry, its images, and its saved responses.
    Delete { key: String },
    /// Prompt template operations.
    Prompts {
        #[command(subcommand)]
        command: PromptCommands,
    },
    /// List saved responses, optionally for one key.
    Responses {
        #[arg(long)]
        key: Option<String>,
    },
    /// Render a template against a cached record, send it to the
    /// completion endpoint, and save the reply.
    Respond { key: String, template: String },
}

#[derive(Subcommand)]
enum PromptCommands {
    /// List template names.
    List,
    /// Print one template.
    Show { name: String },
}

fn build_context(cli: &Cli) -> VaultContext {
    let mut ctx = VaultContext::new(&cli.base_dir);
    if let Some(endpoint) = &cli.source_endpoint {
        ctx = ctx.with_source_endpoint(endpoint);
    }
    if let Some(endpoint) = &cli.cleanup_endpoint {
        ctx = ctx.with_cleanup_endpoint(endpoint);
    }
    if let Some(model) = &cli.cleanup_model {
        ctx = ctx.with_cleanup_model(model);
    }
    ctx
}

async fn run(cli: Cli) -> VaultResult<()> {
    let ctx = build_context(&cli);
    ctx.init()?;

    let notifier = Notifier::default();
    let store = CacheStore::from_context(&ctx, notifier.clone());
    let prompts = PromptStore::from_context(&ctx, notifier.clone());
    let responses = ResponseStore::from_context(&ctx, notifier.clone());
    let cleanup = CleanupService::from_context(&ctx);

    match cli.command {
        Commands::Lookup { key } => {
            let service = LookupService::new(
                store,
                HttpSourceFetcher::from_context(&ctx),
                cleanup,
                notifier,
            );
            let outcome = service.lookup(&key).await?;
            for (name, value) in outcome.record.iter() {
                println!("{name}: {}", format_value(value));
            }
            match &outcome.image {
                Some(path) => println!("image: {}", path.display()),
                None => println!("image: (placeholder) {}", ctx.placeholder.display()),
            }
            for path in &outcome.gallery {
                println!("gallery: {}", path.display());
            }
        }
        Commands::List => {
            for summary in store.list()? {
                let price = match (summary.lowest_price, summary.highest_price) {
                    (Some(low), Some(high)) => {
                        format!(" {low}-{high} {}", summary.currency)
                    }
                    _ => String::new(),
                };
                println!("{}  {}{}", summary.key, summary.title, price);
            }
        }
        Commands::Delete { key } => {
            let service = LookupService::new(
                store,
                HttpSourceFetcher::from_context(&ctx),
                cleanup,
                notifier,
            );
            service.delete(&key).await?;
            println!("deleted {key}");
        }
        Commands::Prompts { command } => match command {
            PromptCommands::List => {
                prompts.seed_default()?;
                for name in prompts.list()? {
                    println!("{name}");
                }
            }
            PromptCommands::Show { name } => {
                let template = prompts.get(&name)?;
                print!("{}", template.content);
            }
        },
        Commands::Responses { key } => {
            let filter = match &key {
                Some(raw) => Some(ProductKey::parse(raw)?),
                None => None,
            };
            for record in responses.list(filter.as_ref())? {
                println!(
                    "{}_{}_{:03}  {}",
                    record.key, record.template, record.sequence, record.modified
                );
            }
        }
        Commands::Respond { key, template } => {
            let parsed = ProductKey::parse(&key)?;
            let record = store.get(&parsed)?;
            let prompt = prompts.get(&template)?;
            let prepared = prompt.render(&record);
            let reply = cleanup.complete(&prepared).await?;
            let path = responses.save(&parsed, &template, &reply)?;
            println!("saved {}", path.display());
        }
    }
    Ok(())
}

fn format_value(value: &upcvault_core::FieldValue) -> String {
    use upcvault_core::FieldValue;
    match value {
        FieldValue::Text(s) => s.clone(),
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Flag(b) => b.to_string(),
        FieldValue::List(items) => items.join(", "),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
