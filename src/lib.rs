mod cache;
mod config;
mod daily;
mod errors;
mod ids;
mod models;
mod mutation;
mod notebook;
mod query;
mod schema;
mod store;
mod submit;

pub use crate::cache::{KeyedCache, StoreCache};
pub use crate::config::{CollectionConfig, NotionConfig, ParentConfig, SubmitPolicy, CONFIG_PATH_ENV};
pub use crate::errors::{AppError, AppResult};
pub use crate::ids::{canonicalize, is_dashed_id, locator_for_id, page_id_from_locator, strip_dashes, to_dashed_id, Canonicalized};
pub use crate::models::{
    BlockValue, CollectionDescriptor, CollectionKind, CollectionValue, Command, CreatedPage, Operation, QueryHit,
    RecordEntry, RecordMap, RemoteError, SchemaProperty, StampOutcome, SubmitResponse,
};
pub use crate::mutation::{append_memo, create_page, create_page_with_block, stamp_date, Stamp, Transaction};
pub use crate::notebook::{parse_draft_request, Clock, DraftRequest, NotebookCore};
pub use crate::query::{descriptor_from_snapshot, project_hits, queryable_pages, recent};
pub use crate::schema::property_codes;
pub use crate::store::DocumentStore;
pub use crate::submit::submit_transaction;

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// Installs a JSON subscriber writing to a daily rolling file under
/// `log_dir`. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(log_dir: &Path) -> AppResult<()> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "notion-util.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| AppError::Config(error.to_string()))
}
