use crate::demo::{run_catalog_import, run_demo, run_trend, CatalogImportArgs, DemoArgs, TrendArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use food_inspection::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Food Inspection Tracker",
    about = "Run and explore the food-safety inspection tracker from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the monthly conformity trend for a visit ledger CSV
    Trend(TrendArgs),
    /// Work with checklist catalogs
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Run an end-to-end demo covering judging, scoring and monthly trends
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Import a catalog CSV and print the resulting checklist
    Import(CatalogImportArgs),
}

#[derive(Args, Debug)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Catalog CSV to seed the checklist with (defaults to the bundled starter checklist)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Token accepted in the x-actor-id header for the administrator
    #[arg(long, default_value = "local-admin")]
    pub(crate) admin_token: String,
    /// Optional token for a read-only employee
    #[arg(long)]
    pub(crate) employee_token: Option<String>,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            catalog: None,
            admin_token: "local-admin".to_string(),
            employee_token: None,
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Trend(args) => run_trend(args),
        Command::Catalog {
            command: CatalogCommand::Import(args),
        } => run_catalog_import(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn trend_command_parses_filters() {
        let cli = Cli::try_parse_from([
            "food-inspection-api",
            "trend",
            "--visits",
            "visits.csv",
            "--year",
            "2025",
            "--branch",
            "centro",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Trend(args)) => {
                assert_eq!(args.year, Some(2025));
                assert_eq!(args.branch.as_deref(), Some("centro"));
            }
            other => panic!("expected trend command, got {other:?}"),
        }
    }

    #[test]
    fn serve_defaults_to_the_local_admin_token() {
        let cli = Cli::try_parse_from(["food-inspection-api", "serve"]).expect("arguments parse");
        match cli.command {
            Some(Command::Serve(args)) => assert_eq!(args.admin_token, "local-admin"),
            other => panic!("expected serve command, got {other:?}"),
        }
    }
}
