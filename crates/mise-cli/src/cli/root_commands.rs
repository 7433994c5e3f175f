use clap::{Args, Subcommand};

use super::subcommands::{AuditCommands, EntityCommands};

/// Root commands for the `mise` binary.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Create, update or delete entities with auditing.
    Entity {
        #[command(subcommand)]
        action: EntityCommands,
    },
    /// Query and export the audit log.
    Audit {
        #[command(subcommand)]
        action: AuditCommands,
    },
    /// Print a registered JSON Schema.
    Schema(SchemaArgs),
}

/// Arguments for `mise schema`.
#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Schema name; lists the registered names when omitted.
    pub name: Option<String>,
}
