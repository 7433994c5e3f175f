use std::path::Path;

use mise_core::enums::{ChangeType, EntityType};
use mise_db::repos::AuditFilter;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuditCommands;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ExportResult<'a> {
    path: &'a str,
    records: usize,
}

fn parse_record_type(raw: Option<&str>) -> anyhow::Result<Option<EntityType>> {
    raw.map(|value| parse_enum::<EntityType>(value, "record-type"))
        .transpose()
}

/// Handle `mise audit`.
pub async fn handle(
    action: &AuditCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        AuditCommands::Query {
            record_type,
            record_id,
            user,
            change_type,
        } => {
            let filter = AuditFilter {
                record_type: parse_record_type(record_type.as_deref())?,
                record_id: record_id.clone(),
                user_id: user.clone(),
                change_type: change_type
                    .as_deref()
                    .map(|value| parse_enum::<ChangeType>(value, "change-type"))
                    .transpose()?,
                limit: Some(effective_limit(flags.limit, ctx.config.general.default_limit)),
            };
            let records = ctx.db.query_audit(&filter).await?;
            output(&records, flags.format)
        }
        AuditCommands::History {
            record_type,
            record_id,
        } => {
            let record_type = parse_enum::<EntityType>(record_type, "record-type")?;
            let records = ctx.db.history(record_type, record_id).await?;
            output(&records, flags.format)
        }
        AuditCommands::Export {
            path,
            record_type,
            record_id,
        } => {
            let filter = AuditFilter {
                record_type: parse_record_type(record_type.as_deref())?,
                record_id: record_id.clone(),
                limit: Some(flags.limit.unwrap_or(u32::MAX)),
                ..AuditFilter::default()
            };
            let records = ctx.db.export_audit_jsonl(&filter, Path::new(path)).await?;
            output(&ExportResult { path, records }, flags.format)
        }
    }
}
