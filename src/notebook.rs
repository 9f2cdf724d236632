use crate::cache::StoreCache;
use crate::config::NotionConfig;
use crate::errors::{AppError, AppResult};
use crate::ids::locator_for_id;
use crate::models::{CollectionDescriptor, CollectionKind, CreatedPage, QueryHit, StampOutcome, SubmitResponse};
use crate::mutation::{self, Stamp, Transaction};
use crate::query;
use crate::store::DocumentStore;
use crate::submit::submit_transaction;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use uuid::Uuid;

static DRAFT_REQUEST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*([^-]+?)\s*(?:-\s*(.*?))?\s*$").expect("valid regex"));

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRequest {
    pub title: String,
    pub content: Option<String>,
}

/// Splits `"<title> - <content>"`. The title runs up to the first dash.
pub fn parse_draft_request(text: &str) -> Option<DraftRequest> {
    let captures = DRAFT_REQUEST.captures(text)?;
    let title = captures.get(1)?.as_str().trim().to_string();
    if title.is_empty() {
        return None;
    }
    let content = captures
        .get(2)
        .map(|value| value.as_str().to_string())
        .filter(|value| !value.trim().is_empty());
    Some(DraftRequest { title, content })
}

/// Entry point for every lookup and mutation. Cloning is cheap and clones
/// share the same cache.
#[derive(Clone)]
pub struct NotebookCore {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) config: Arc<NotionConfig>,
    pub(crate) cache: Arc<StoreCache>,
    clock: Clock,
}

impl NotebookCore {
    pub fn new(store: Arc<dyn DocumentStore>, config: NotionConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config: Arc::new(config),
            cache: Arc::new(StoreCache::new()),
            clock: Arc::new(Utc::now),
        })
    }

    pub fn with_cache(mut self, cache: Arc<StoreCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache(&self) -> &Arc<StoreCache> {
        &self.cache
    }

    pub fn config(&self) -> &NotionConfig {
        &self.config
    }

    pub fn stamp(&self) -> Stamp {
        Stamp::new((self.clock)(), self.config.utc_offset_hours, self.config.time_zone.clone())
    }

    pub fn page_url(&self, id: &str) -> String {
        locator_for_id(&self.config.base_url, id)
    }

    pub async fn resolve_collection(&self, kind: CollectionKind) -> AppResult<CollectionDescriptor> {
        query::resolve_collection(self.store.as_ref(), &self.cache, &self.config, kind).await
    }

    pub async fn search(&self, kind: CollectionKind, search_term: &str) -> AppResult<Vec<QueryHit>> {
        query::query_collection(self.store.as_ref(), &self.cache, &self.config, kind, search_term).await
    }

    pub(crate) async fn find_exact(&self, kind: CollectionKind, title: &str) -> AppResult<Option<QueryHit>> {
        query::find_by_title(self.store.as_ref(), &self.cache, &self.config, kind, title).await
    }

    pub(crate) async fn submit(&self, transaction: &Transaction) -> AppResult<SubmitResponse> {
        submit_transaction(self.store.as_ref(), transaction, &self.config.submit).await
    }

    pub async fn mark_read(&self, search_term: &str) -> AppResult<StampOutcome> {
        self.mark_stamped(CollectionKind::Book, search_term).await
    }

    pub async fn mark_met(&self, search_term: &str) -> AppResult<StampOutcome> {
        self.mark_stamped(CollectionKind::People, search_term).await
    }

    /// Stamps today's date on the single page matching `search_term`.
    pub async fn mark_stamped(&self, kind: CollectionKind, search_term: &str) -> AppResult<StampOutcome> {
        let stamp_code = self
            .config
            .collection(kind)?
            .stamp_code
            .clone()
            .ok_or_else(|| AppError::Config(format!("no stamp property code configured for {}", kind)))?;

        let mut hits = self.search(kind, search_term).await?;
        if hits.len() > 1 {
            return Ok(StampOutcome::Ambiguous {
                titles: hits.into_iter().map(|hit| hit.title).collect(),
            });
        }
        let Some(hit) = hits.pop() else {
            return Ok(StampOutcome::NoMatch);
        };

        self.submit(&mutation::stamp_date(&hit.id, &stamp_code, &self.stamp())).await?;
        tracing::info!(kind = %kind, page_id = %hit.id, "stamped page date");
        Ok(StampOutcome::Stamped { hit })
    }

    pub async fn create_draft(&self, title: &str, content: Option<&str>) -> AppResult<CreatedPage> {
        let page_id = Uuid::new_v4().to_string();
        let parent = &self.config.parents.drafts;
        let stamp = self.stamp();
        let transaction = match content {
            Some(content) => {
                let block_id = Uuid::new_v4().to_string();
                mutation::create_page_with_block(&page_id, &block_id, title, content, parent, &stamp)
            }
            None => mutation::create_page(&page_id, title, parent, &stamp),
        };
        self.submit(&transaction).await?;
        tracing::info!(page_id = %page_id, operations = transaction.len(), "created draft");
        Ok(CreatedPage {
            url: self.page_url(&page_id),
            id: page_id,
        })
    }

    /// Appends a timestamped memo to the configured memo bucket.
    pub async fn memo(&self, text: &str) -> AppResult<CreatedPage> {
        let bucket = self.config.parents.memo_bucket.clone();
        self.append_memo_to(&bucket, text).await
    }

    /// Appends a timestamped memo to today's note, creating the note first
    /// when it does not exist yet.
    pub async fn today_memo(&self, text: &str) -> AppResult<CreatedPage> {
        let today_id = self.ensure_today_id().await?;
        self.append_memo_to(&today_id, text).await
    }

    async fn append_memo_to(&self, parent_id: &str, text: &str) -> AppResult<CreatedPage> {
        let block_id = Uuid::new_v4().to_string();
        let transaction = mutation::append_memo(&block_id, parent_id, text, &self.config.memo_block_type, &self.stamp());
        self.submit(&transaction).await?;
        tracing::debug!(parent_id = %parent_id, block_id = %block_id, "appended memo");
        Ok(CreatedPage {
            id: parent_id.to_string(),
            url: self.page_url(parent_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::parse_draft_request;

    #[test]
    fn splits_title_and_content() {
        let request = parse_draft_request("Weekly review - what went well").expect("request");
        assert_eq!(request.title, "Weekly review");
        assert_eq!(request.content.as_deref(), Some("what went well"));
    }

    #[test]
    fn content_is_optional() {
        let request = parse_draft_request("  Just a title ").expect("request");
        assert_eq!(request.title, "Just a title");
        assert_eq!(request.content, None);

        let dangling = parse_draft_request("Title -").expect("request");
        assert_eq!(dangling.title, "Title");
        assert_eq!(dangling.content, None);
    }

    #[test]
    fn title_stops_at_first_dash() {
        let request = parse_draft_request("Re-read notes - soon").expect("request");
        assert_eq!(request.title, "Re");
        assert_eq!(request.content.as_deref(), Some("read notes - soon"));
    }

    #[test]
    fn rejects_missing_title() {
        assert!(parse_draft_request("- only content").is_none());
        assert!(parse_draft_request("   ").is_none());
    }

    #[test]
    fn content_may_span_lines() {
        let request = parse_draft_request("Plan - line one\nline two").expect("request");
        assert_eq!(request.content.as_deref(), Some("line one\nline two"));
    }
}
