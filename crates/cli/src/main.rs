//! pacta Entry Point
//!
//! Thin invocation layer over the apply orchestrator: argument parsing,
//! wiring of the configured environment's catalog client, report printing,
//! and exit status mapping. Exit code 0 means converged or no-op, 2 means
//! partially converged, 1 means failed; the full distinction is in the
//! structured output.

use clap::{Parser, Subcommand, ValueEnum};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

use pacta_adapters::{AppConfig, DirectoryContractSource, HttpCatalog, RetryingCatalog};
use pacta_application::ApplyOrchestrator;
use pacta_domain::RunResult;
use pacta_ports::ContractSource;

#[derive(Parser)]
#[command(name = "pacta")]
#[command(about = "Converge catalog state onto declarative data contracts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a declared contract to an environment's catalog
    Apply {
        #[command(subcommand)]
        target: ApplyTarget,
    },
    /// List resources known to this deployment
    List {
        #[command(subcommand)]
        target: ListTarget,
    },
}

#[derive(Subcommand)]
enum ApplyTarget {
    /// Apply one named contract
    Contract {
        /// Contract name, resolved against the configured contract source
        name: String,

        /// Deployment environment selecting the catalog endpoint
        #[arg(long = "env")]
        environment: String,

        /// Apply destructive operations (drops, narrowing type changes,
        /// revokes) instead of blocking them
        #[arg(long, default_value_t = false)]
        allow_destructive: bool,

        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
}

#[derive(Subcommand)]
enum ListTarget {
    /// List contract names discoverable in the configured source
    Contracts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, "pacta failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    match cli.command {
        Commands::Apply {
            target:
                ApplyTarget::Contract {
                    name,
                    environment,
                    allow_destructive,
                    output,
                },
        } => {
            let environment_config = config.environment(&environment)?;
            let catalog = HttpCatalog::new(&environment, environment_config)?;
            let catalog = Arc::new(RetryingCatalog::new(catalog, config.retry.clone()));
            let source = DirectoryContractSource::new(&config.contracts_dir);
            let orchestrator = ApplyOrchestrator::new(source, catalog);

            let result = orchestrator.apply(&name, &environment, allow_destructive).await;
            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                OutputFormat::Text => print_report(&result),
            }
            Ok(ExitCode::from(result.exit_code() as u8))
        }
        Commands::List {
            target: ListTarget::Contracts,
        } => {
            let source = DirectoryContractSource::new(&config.contracts_dir);
            for name in source.list().await? {
                println!("{name}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_report(result: &RunResult) {
    println!(
        "contract '{}' on '{}': {} (run {})",
        result.contract, result.environment, result.status, result.run_id
    );
    for outcome in &result.outcomes {
        let status = outcome.status.to_string();
        match &outcome.detail {
            Some(detail) => println!(
                "  {}. {:<8} {} ({detail})",
                outcome.sequence, status, outcome.operation
            ),
            None => println!("  {}. {:<8} {}", outcome.sequence, status, outcome.operation),
        }
    }
    if !result.diagnostics.is_empty() {
        println!("diagnostics:");
        for diagnostic in &result.diagnostics {
            println!("  - {diagnostic}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_apply_contract_invocation() {
        let cli = Cli::try_parse_from([
            "pacta",
            "apply",
            "contract",
            "orders",
            "--env",
            "dev",
            "--allow-destructive",
        ])
        .unwrap();
        match cli.command {
            Commands::Apply {
                target:
                    ApplyTarget::Contract {
                        name,
                        environment,
                        allow_destructive,
                        output,
                    },
            } => {
                assert_eq!(name, "orders");
                assert_eq!(environment, "dev");
                assert!(allow_destructive);
                assert_eq!(output, OutputFormat::Text);
            }
            _ => panic!("expected apply contract"),
        }
    }

    #[test]
    fn parses_the_list_contracts_invocation() {
        let cli = Cli::try_parse_from(["pacta", "list", "contracts"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::List {
                target: ListTarget::Contracts
            }
        ));
    }
}
