use clap::Subcommand;

/// Entity mutation commands.
#[derive(Clone, Debug, Subcommand)]
pub enum EntityCommands {
    /// Create an entity.
    Create {
        /// Entity type, e.g. `user`, `menu-category`.
        entity_type: String,
        /// Column assignment `column=value`; the value is parsed as JSON,
        /// falling back to a plain string.
        #[arg(long = "set", value_name = "COLUMN=VALUE")]
        set: Vec<String>,
    },
    /// Update an entity.
    Update {
        entity_type: String,
        id: String,
        #[arg(long = "set", value_name = "COLUMN=VALUE", required = true)]
        set: Vec<String>,
    },
    /// Delete an entity.
    Delete { entity_type: String, id: String },
    /// Show an entity's current column values.
    Get { entity_type: String, id: String },
}

/// Audit log commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AuditCommands {
    /// List audit records, newest first.
    Query {
        #[arg(long)]
        record_type: Option<String>,
        #[arg(long)]
        record_id: Option<String>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        change_type: Option<String>,
    },
    /// Full history of one entity in version order.
    History { record_type: String, record_id: String },
    /// Write audit records to a JSONL file.
    Export {
        path: String,
        #[arg(long)]
        record_type: Option<String>,
        #[arg(long)]
        record_id: Option<String>,
    },
}
