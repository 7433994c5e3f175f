use anyhow::Context;
use mise_schema::SchemaRegistry;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SchemaArgs;
use crate::output::output;

/// Handle `mise schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let registry = SchemaRegistry::new();
    match args.name.as_deref() {
        Some(name) => {
            let schema = registry
                .get(name)
                .with_context(|| format!("unknown schema '{name}' (known: {})", registry.list().join(", ")))?;
            output(schema, flags.format)
        }
        None => output(&registry.list(), flags.format),
    }
}
