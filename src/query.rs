use crate::cache::StoreCache;
use crate::config::NotionConfig;
use crate::errors::{AppError, AppResult};
use crate::ids::page_id_from_locator;
use crate::models::{BlockValue, CollectionDescriptor, CollectionKind, QueryHit, RecordMap};
use crate::schema::resolve_schema;
use crate::store::DocumentStore;
use std::time::Instant;

const UNDEFINED_STAMP: &str = "undefined";

pub async fn resolve_collection(
    store: &dyn DocumentStore,
    cache: &StoreCache,
    config: &NotionConfig,
    kind: CollectionKind,
) -> AppResult<CollectionDescriptor> {
    cache
        .collections
        .get_or_try_init(kind, || async move {
            let locator = &config.collection(kind)?.locator;
            let page_id = page_id_from_locator(locator)?;
            let snapshot = store.load_page_chunk(&page_id).await?;
            let descriptor = descriptor_from_snapshot(&snapshot)
                .ok_or_else(|| AppError::NotFound(format!("no collection id for {} ({})", kind, page_id)))?;
            tracing::info!(
                kind = %kind,
                collection_id = %descriptor.collection_id,
                collection_view_id = %descriptor.collection_view_id,
                "resolved collection"
            );
            Ok(descriptor)
        })
        .await
}

pub fn descriptor_from_snapshot(snapshot: &RecordMap) -> Option<CollectionDescriptor> {
    Some(CollectionDescriptor {
        collection_id: snapshot.first_collection_id()?.to_string(),
        collection_view_id: snapshot.first_collection_view_id()?.to_string(),
    })
}

/// Pages of `kind` whose title contains `search_term`, in store order.
pub async fn query_collection(
    store: &dyn DocumentStore,
    cache: &StoreCache,
    config: &NotionConfig,
    kind: CollectionKind,
    search_term: &str,
) -> AppResult<Vec<QueryHit>> {
    let descriptor = resolve_collection(store, cache, config, kind).await?;

    let started = Instant::now();
    let snapshot = store
        .query_collection(&descriptor.collection_id, &descriptor.collection_view_id, &[])
        .await?;
    tracing::debug!(
        kind = %kind,
        elapsed_ms = started.elapsed().as_millis() as u64,
        blocks = snapshot.block.len(),
        "queried collection"
    );

    let codes = resolve_schema(&snapshot.collections());
    let stamp_code = config
        .collection(kind)?
        .stamp_property
        .as_ref()
        .and_then(|name| codes.get(name))
        .map(String::as_str);

    Ok(project_hits(&queryable_pages(&snapshot), search_term, stamp_code))
}

/// Pages whose title equals `title` exactly.
pub async fn find_by_title(
    store: &dyn DocumentStore,
    cache: &StoreCache,
    config: &NotionConfig,
    kind: CollectionKind,
    title: &str,
) -> AppResult<Option<QueryHit>> {
    let hits = query_collection(store, cache, config, kind, title).await?;
    Ok(hits.into_iter().find(|hit| hit.title == title))
}

pub fn queryable_pages(snapshot: &RecordMap) -> Vec<BlockValue> {
    snapshot.blocks().into_iter().filter(BlockValue::is_page).collect()
}

pub fn project_hits(pages: &[BlockValue], search_term: &str, stamp_code: Option<&str>) -> Vec<QueryHit> {
    pages
        .iter()
        .filter(|page| page.title_text().contains(search_term))
        .map(|page| QueryHit {
            id: page.id.clone(),
            title: page.title_text().to_string(),
            stamp: stamp_code
                .and_then(|code| page.property(code))
                .map(|value| value.to_string())
                .unwrap_or_else(|| UNDEFINED_STAMP.to_string()),
        })
        .collect()
}

/// Keeps the last `limit` hits, the most recent end of store order.
pub fn recent(hits: Vec<QueryHit>, limit: usize) -> Vec<QueryHit> {
    let skip = hits.len().saturating_sub(limit);
    hits.into_iter().skip(skip).collect()
}
