use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use mise_audit::{AuditSink, ChangeRecordBuilder, LifecycleDispatcher, RedactionPolicy, SinkOptions};
use mise_config::MiseConfig;
use mise_core::catalog::EntityCatalog;
use mise_db::MiseDb;
use tracing::debug;

use crate::cli::GlobalFlags;

pub type Dispatcher = LifecycleDispatcher<Arc<MiseDb>, MiseDb>;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub config: MiseConfig,
    pub db: Arc<MiseDb>,
    pub dispatcher: Dispatcher,
    sink: AuditSink,
}

impl AppContext {
    /// Open the database and start the audit pipeline.
    pub async fn init(config: MiseConfig, flags: &GlobalFlags) -> anyhow::Result<Self> {
        let mut database = config.database.clone();
        if let Some(path) = &flags.db {
            database.path.clone_from(path);
        }
        if !database.is_in_memory() {
            ensure_parent_dir(&database.path)?;
        }
        let db_path = database.path;

        let db = Arc::new(
            MiseDb::open_local(&db_path)
                .await
                .with_context(|| format!("failed to open database at {db_path}"))?,
        );

        let sink = AuditSink::spawn(Arc::clone(&db), SinkOptions::from_config(&config.audit));
        let policy = Arc::new(RedactionPolicy::from_config(&config.audit));
        let dispatcher = LifecycleDispatcher::new(
            Arc::clone(&db),
            Arc::clone(&db),
            sink.handle(),
            ChangeRecordBuilder::new(policy),
            Arc::new(EntityCatalog::builtin()),
        )
        .with_enabled(config.audit.enabled);

        Ok(Self {
            config,
            db,
            dispatcher,
            sink,
        })
    }

    /// Drain queued audit payloads before the process exits.
    pub async fn shutdown(self) {
        let stats = self.sink.shutdown().await;
        debug!(?stats, "audit pipeline stopped");
    }
}

fn ensure_parent_dir(db_path: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}
