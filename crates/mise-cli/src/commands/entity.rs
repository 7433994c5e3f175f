use anyhow::bail;
use mise_core::context::AuditContext;
use mise_core::enums::EntityType;
use mise_core::ids::PREFIX_REQUEST;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::EntityCommands;
use crate::commands::shared::parse::{parse_assignments, parse_enum};
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct MutationResult {
    entity_type: EntityType,
    id: String,
    applied: bool,
}

fn audit_context(flags: &GlobalFlags, request_id: String) -> AuditContext {
    flags
        .actor
        .as_deref()
        .map_or_else(AuditContext::system, AuditContext::for_actor)
        .with_request_id(request_id)
}

/// Handle `mise entity`.
pub async fn handle(
    action: &EntityCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let request_id = ctx.db.generate_id(PREFIX_REQUEST).await?;
    let audit = audit_context(flags, request_id);
    match action {
        EntityCommands::Create { entity_type, set } => {
            let entity_type = parse_enum::<EntityType>(entity_type, "entity type")?;
            let row = parse_assignments(set)?;
            let id = ctx.dispatcher.create(&audit, entity_type, &row).await?;
            output(
                &MutationResult {
                    entity_type,
                    id,
                    applied: true,
                },
                flags.format,
            )
        }
        EntityCommands::Update {
            entity_type,
            id,
            set,
        } => {
            let entity_type = parse_enum::<EntityType>(entity_type, "entity type")?;
            let changes = parse_assignments(set)?;
            let matched = ctx
                .dispatcher
                .update(&audit, entity_type, id, &changes)
                .await?;
            if !matched {
                bail!("{entity_type} '{id}' not found");
            }
            output(
                &MutationResult {
                    entity_type,
                    id: id.clone(),
                    applied: true,
                },
                flags.format,
            )
        }
        EntityCommands::Delete { entity_type, id } => {
            let entity_type = parse_enum::<EntityType>(entity_type, "entity type")?;
            let removed = ctx.dispatcher.delete(&audit, entity_type, id).await?;
            output(
                &MutationResult {
                    entity_type,
                    id: id.clone(),
                    applied: removed,
                },
                flags.format,
            )
        }
        EntityCommands::Get { entity_type, id } => {
            let entity_type = parse_enum::<EntityType>(entity_type, "entity type")?;
            let schema = ctx.dispatcher.catalog().get(entity_type)?;
            match ctx.db.get_entity(schema, id).await? {
                Some(row) => output(&row, flags.format),
                None => bail!("{entity_type} '{id}' not found"),
            }
        }
    }
}
