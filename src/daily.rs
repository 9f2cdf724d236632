use crate::errors::{AppError, AppResult};
use crate::models::CollectionKind;
use crate::mutation::create_page;
use crate::notebook::NotebookCore;
use uuid::Uuid;

impl NotebookCore {
    /// Calendar date of today's note in the configured fixed offset.
    pub fn today_key(&self) -> String {
        self.stamp().local_date()
    }

    /// Page id of today's note, created on first use. Concurrent callers on
    /// the same day share one lookup, and this process submits at most one
    /// create per day even when the new page is slow to become visible.
    pub async fn ensure_today_id(&self) -> AppResult<String> {
        let key = self.today_key();
        self.cache
            .daily_notes
            .get_or_try_init(key.clone(), || self.find_or_create_daily_note(key))
            .await
    }

    async fn find_or_create_daily_note(&self, key: String) -> AppResult<String> {
        if let Some(hit) = self.find_exact(CollectionKind::Note, &key).await? {
            tracing::debug!(date = %key, page_id = %hit.id, "found daily note");
            return Ok(hit.id);
        }

        if let Some(page_id) = self.cache.created_daily_notes.get(&key).await {
            tracing::debug!(date = %key, page_id = %page_id, "daily note already submitted; not creating again");
            return Err(not_yet_visible(&key));
        }

        let page_id = self
            .cache
            .created_daily_notes
            .get_or_try_init(key.clone(), || self.create_daily_note(&key))
            .await?;

        match self.find_exact(CollectionKind::Note, &key).await? {
            Some(hit) => Ok(hit.id),
            None => {
                tracing::warn!(date = %key, page_id = %page_id, "daily note not visible after creation");
                Err(not_yet_visible(&key))
            }
        }
    }

    async fn create_daily_note(&self, key: &str) -> AppResult<String> {
        let parent_id = match &self.config.parents.daily_notes {
            Some(parent_id) => parent_id.clone(),
            None => self.resolve_collection(CollectionKind::Note).await?.collection_id,
        };
        let page_id = Uuid::new_v4().to_string();
        self.submit(&create_page(&page_id, key, &parent_id, &self.stamp())).await?;
        tracing::info!(date = %key, page_id = %page_id, "created daily note");
        Ok(page_id)
    }
}

fn not_yet_visible(key: &str) -> AppError {
    AppError::NotFound(format!("daily note {} was created but is not yet visible", key))
}
