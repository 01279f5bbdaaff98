// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator CLI for the control plane daemon: a thin wrapper over the
//! admin socket for status, project listing, and forced reconciliation.
//! End users drive the control plane through the browser gateway, not
//! this binary — `scp` is for whoever is running the daemon.

mod client;
mod color;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "scp",
    version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH")),
    about = "Control plane operator CLI",
    styles = color::styles()
)]
struct Cli {
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show how many projects the daemon is tracking
    Status,
    /// List every project known to the daemon's registry
    Projects,
    /// Force a project's status to reconcile against its sandbox
    Reconcile {
        /// Project id, e.g. `proj_...`
        project_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Status => commands::status::handle(cli.output).await,
        Command::Projects => commands::projects::handle(cli.output).await,
        Command::Reconcile { project_id } => commands::reconcile::handle(project_id, cli.output).await,
    }
}
