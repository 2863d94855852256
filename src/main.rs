#![deny(unused)]
//! cachewarden — policy-enforcing CLI for a remote semantic cache.
//!
//! Thin wrapper over the policy gateway: parses arguments, loads
//! configuration, and renders outcomes. Exit code 0 on success, 1 on any
//! error, 2 when an operation was refused by policy.

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;

use cachewarden_client::RemoteCacheClient;
use cachewarden_core::config::AppConfig;
use cachewarden_core::{DeleteSelector, SearchOutcome, StoreOutcome};
use cachewarden_gateway::{configure_tracing, PolicyGateway};
use cachewarden_policy::{Classifier, RuleSet};

const EXIT_BLOCKED: u8 = 2;

#[derive(Parser)]
#[command(name = "cachewarden", version, about = "Policy gateway for a remote semantic cache")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Similarity search, subject to policy preflight.
    Search {
        query: String,
        /// Override the resolved similarity threshold (clamped to the
        /// category floor unless configured otherwise).
        #[arg(long)]
        threshold: Option<f64>,
        /// Attribute filter, repeatable as --attr key=value.
        #[arg(long = "attr", value_parser = parse_attr)]
        attrs: Vec<(String, String)>,
    },
    /// Store a prompt/response pair, subject to policy preflight.
    Store {
        prompt: String,
        response: String,
        /// Attribute tags, repeatable as --attr key=value.
        #[arg(long = "attr", value_parser = parse_attr)]
        attrs: Vec<(String, String)>,
    },
    /// Classify a text without touching the network.
    Check { text: String },
    /// Delete by entry id or by attribute filter (exactly one).
    Delete {
        #[arg(long)]
        id: Option<String>,
        #[arg(long = "attr", value_parser = parse_attr)]
        attrs: Vec<(String, String)>,
    },
    /// Remove every entry in the cache.
    Flush,
}

fn parse_attr(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

fn attr_map(attrs: Vec<(String, String)>) -> Option<HashMap<String, String>> {
    if attrs.is_empty() {
        None
    } else {
        Some(attrs.into_iter().collect())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };
    configure_tracing(config.logging.json_logs);
    tracing::info!("cachewarden v{}", env!("CARGO_PKG_VERSION"));

    match run(cli, config).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<ExitCode> {
    let rules = match &config.policy.rules_path {
        Some(path) => RuleSet::from_yaml_file(path)?,
        None => RuleSet::builtin(),
    };
    let classifier = Classifier::new(rules);

    // `check` works without any remote configuration.
    if let Command::Check { text } = &cli.command {
        match classifier.classify(text).block_details() {
            Some((category, _)) => println!("BLOCKED: {category}"),
            None => println!("OK"),
        }
        return Ok(ExitCode::SUCCESS);
    }

    let client = RemoteCacheClient::new(&config.remote, &config.http)?;
    let gateway = PolicyGateway::new(Arc::new(client))
        .with_classifier(classifier)
        .with_allow_override_below_floor(config.policy.allow_override_below_floor);

    match cli.command {
        Command::Search {
            query,
            threshold,
            attrs,
        } => {
            let filter = attr_map(attrs);
            match gateway.search(&query, threshold, filter.as_ref()).await? {
                SearchOutcome::Blocked {
                    category,
                    matched_rule,
                } => {
                    println!("BLOCKED: {category} (rule: {matched_rule})");
                    Ok(ExitCode::from(EXIT_BLOCKED))
                }
                SearchOutcome::Completed {
                    matches,
                    category,
                    threshold,
                } => {
                    if matches.is_empty() {
                        println!("no match (category: {category}, threshold: {threshold:.2})");
                    }
                    for m in matches {
                        println!("{:.4}  {}  {}", m.similarity, m.entry.id, m.entry.response);
                    }
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
        Command::Store {
            prompt,
            response,
            attrs,
        } => {
            let attrs = attr_map(attrs);
            match gateway.store(&prompt, &response, attrs.as_ref()).await? {
                StoreOutcome::Blocked {
                    category,
                    matched_rule,
                } => {
                    println!("BLOCKED: {category} (rule: {matched_rule})");
                    Ok(ExitCode::from(EXIT_BLOCKED))
                }
                StoreOutcome::Stored { id, category } => {
                    println!("stored {id} (category: {category})");
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
        Command::Delete { id, attrs } => {
            let selector = DeleteSelector::from_parts(id, attr_map(attrs))?;
            let deleted = gateway.delete(&selector).await?;
            println!("deleted {deleted}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Flush => {
            let deleted = gateway.flush().await?;
            println!("flushed {deleted} entries");
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { .. } => unreachable!("handled above"),
    }
}
