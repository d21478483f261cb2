// SPDX-FileCopyrightText: 2026 Helpdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpdesk - support-ticket tracker for customers and agents.
//!
//! This is the binary entry point and the presentation boundary: every
//! subcommand signs in, calls the ticket repository, and renders the result.

mod app;
mod doctor;
mod render;
mod shutdown;
mod tickets;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use helpdesk_config::HelpdeskConfig;
use helpdesk_core::{Category, HelpdeskError, Priority, TicketStatus};

use crate::app::App;

/// Helpdesk - support-ticket tracker.
#[derive(Parser, Debug)]
#[command(name = "helpdesk", version, about, long_about = None)]
struct Cli {
    /// E-mail of the principal to act as.
    #[arg(long = "as", global = true, value_name = "EMAIL")]
    principal: Option<String>,

    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List the tickets you can see.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Show one ticket in detail.
    Show {
        /// Ticket id.
        id: String,
    },
    /// File a new ticket (customers).
    Create(tickets::CreateArgs),
    /// Move a ticket to a new status (agents).
    Status {
        /// Ticket id.
        id: String,
        /// Target status: open, in-progress, or resolved.
        status: TicketStatus,
    },
    /// Assign a ticket to yourself (agents).
    Assign {
        /// Ticket id.
        id: String,
    },
    /// Permanently delete one of your tickets (customers).
    Delete {
        /// Ticket id.
        id: String,
        /// Skip the interactive confirmation.
        #[arg(long)]
        yes: bool,
    },
    /// Follow the tickets you can see until interrupted.
    Watch,
    /// Run health checks against the store, blob root, and identity directory.
    Doctor,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            helpdesk_config::render_errors(&errors);
            std::process::exit(2);
        }
    };

    init_tracing(&config.app.log_level);

    if let Err(e) = run(cli, config).await {
        render::error(&e);
        std::process::exit(1);
    }
}

fn load_config(
    path: Option<&std::path::Path>,
) -> Result<HelpdeskConfig, Vec<helpdesk_config::ConfigError>> {
    match path {
        Some(path) => helpdesk_config::load_and_validate_path(path),
        None => helpdesk_config::load_and_validate(),
    }
}

async fn run(cli: Cli, config: HelpdeskConfig) -> Result<(), HelpdeskError> {
    let color = render::use_color(cli.plain);

    if let Commands::Doctor = cli.command {
        return doctor::run_doctor(&config, color).await;
    }

    let app = App::open(config).await?;
    let session = app.sign_in(cli.principal.as_deref()).await?;

    let result = match cli.command {
        Commands::List { json } => tickets::list(&app, &session, json, color).await,
        Commands::Show { id } => tickets::show(&app, &session, &id, color).await,
        Commands::Create(args) => tickets::create(&app, &session, args).await,
        Commands::Status { id, status } => tickets::set_status(&app, &session, &id, status).await,
        Commands::Assign { id } => tickets::assign(&app, &session, &id).await,
        Commands::Delete { id, yes } => tickets::delete(&app, &session, &id, yes).await,
        Commands::Watch => tickets::watch(&app, &session, color).await,
        Commands::Doctor => Ok(()),
    };

    app.close(session).await;
    result
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides `app.log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("helpdesk={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse helpers shared by clap value parsers.
pub(crate) fn parse_priority(value: &str) -> Result<Priority, String> {
    value
        .parse()
        .map_err(|_| format!("expected low, medium, or high; got {value:?}"))
}

pub(crate) fn parse_category(value: &str) -> Result<Category, String> {
    value
        .parse()
        .map_err(|_| format!("expected technical, billing, feature, or other; got {value:?}"))
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
    fn global_principal_flag_parses_after_subcommand() {
        let cli = Cli::try_parse_from(["helpdesk", "list", "--as", "a@x.com", "--json"]).unwrap();
        assert_eq!(cli.principal.as_deref(), Some("a@x.com"));
        assert!(matches!(cli.command, Commands::List { json: true }));
    }

    #[test]
    fn status_argument_uses_wire_values() {
        let cli = Cli::try_parse_from(["helpdesk", "status", "t1", "in-progress"]).unwrap();
        match cli.command {
            Commands::Status { id, status } => {
                assert_eq!(id, "t1");
                assert_eq!(status, TicketStatus::InProgress);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["helpdesk", "status", "t1", "closed"]).is_err());
    }

    #[test]
    fn delete_defaults_to_interactive_confirmation() {
        let cli = Cli::try_parse_from(["helpdesk", "delete", "t1"]).unwrap();
        assert!(matches!(cli.command, Commands::Delete { yes: false, .. }));
    }

    #[test]
    fn priority_parser_rejects_unknown_values() {
        assert_eq!(parse_priority("high").unwrap(), Priority::High);
        assert!(parse_priority("urgent").is_err());
        assert_eq!(parse_category("billing").unwrap(), Category::Billing);
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = helpdesk_config::load_and_validate_str("").expect("default config is valid");
        assert_eq!(config.app.log_level, "info");
    }
}
