//! The page-level operations a router calls.

use crate::Result;
use crate::author::resolve_author;
use crate::category::CategoryRegistry;
use crate::config::Config;
use crate::index::{CategoryPage, ContentIndex, PostSummary};
use crate::model::{DailyViewStat, PostList, PostRecord, Video};
use crate::pagination::PageRequest;
use crate::reading_time::reading_time_minutes;
use crate::store::ContentStore;
use crate::views::{SeenViews, ViewAccounting, VisitorToken};
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

/// Result of a lookup that may legitimately find nothing.
///
/// Not-found is an ordinary outcome (the router renders a 404), so it is a
/// value here rather than an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Lookup::Found(value),
            None => Lookup::NotFound,
        }
    }
}

/// Everything the post page renders.
#[derive(Debug, Clone, PartialEq)]
pub struct PostPage {
    pub record: PostRecord,
    /// Resolved byline
    pub author: String,
    /// Display name of the post's legacy category, if it has one
    pub category_name: Option<String>,
    pub reading_time: u32,
    /// Visitor token to hand back to the client
    pub token: VisitorToken,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HomePage {
    pub featured: Vec<PostSummary>,
    pub latest: Vec<PostSummary>,
    pub popular: Vec<PostSummary>,
    pub trending: Vec<PostSummary>,
}

/// Videos listed per page.
pub const VIDEOS_PAGE_SIZE: u32 = 20;

/// A content site over some [`ContentStore`].
pub struct Site<S: ?Sized> {
    store: Arc<S>,
    registry: CategoryRegistry,
    index: ContentIndex<S>,
    views: ViewAccounting<S>,
    page_size: u32,
    home_list_size: u32,
    recent_views_capacity: usize,
}

impl<S: ContentStore + ?Sized> Site<S> {
    pub fn new(store: Arc<S>, registry: CategoryRegistry, config: &Config) -> Self {
        let seen = SeenViews::new(config.seen_views_capacity, config.seen_views_ttl);
        Self {
            index: ContentIndex::new(store.clone()),
            views: ViewAccounting::new(store.clone(), seen),
            store,
            registry,
            page_size: config.page_size,
            home_list_size: config.home_list_size,
            recent_views_capacity: config.recent_views_capacity,
        }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn index(&self) -> &ContentIndex<S> {
        &self.index
    }

    pub fn views(&self) -> &ViewAccounting<S> {
        &self.views
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Decode a visitor token from its cookie value. A missing cookie gives
    /// an empty token.
    pub fn parse_token(&self, raw: Option<&str>) -> VisitorToken {
        match raw {
            Some(raw) => VisitorToken::parse(raw, self.recent_views_capacity),
            None => VisitorToken::new(self.recent_views_capacity),
        }
    }

    /// A category listing page. Unknown slugs are not found.
    pub async fn category_page(&self, slug: &str, page: i64) -> Result<Lookup<CategoryPage>> {
        if !self.registry.category_exists(slug) {
            tracing::debug!(slug, "unknown category");
            return Ok(Lookup::NotFound);
        }
        let request = PageRequest::new(page, self.page_size);
        let page = self.index.resolve_category_page(slug, request).await?;
        Ok(Lookup::Found(page))
    }

    /// A post page. Drafts and deleted posts are not found. Counts the view
    /// on the way out.
    pub async fn post_page(&self, post_id: Uuid, token: VisitorToken) -> Result<Lookup<PostPage>> {
        let Some(record) = self.store.post_by_public_id(post_id).await? else {
            return Ok(Lookup::NotFound);
        };
        if !record.post.is_visible() {
            tracing::debug!(%post_id, status = %record.post.status, deleted = record.post.deleted, "post not visible");
            return Ok(Lookup::NotFound);
        }

        let token = self.views.record_view(post_id, token).await;

        let author = resolve_author(&record).to_string();
        let category_name = record
            .post
            .category
            .as_deref()
            .map(|slug| self.registry.display_name(slug).to_string());
        let reading_time = reading_time_minutes(&record.post.content);

        Ok(Lookup::Found(PostPage {
            record,
            author,
            category_name,
            reading_time,
            token,
        }))
    }

    /// The four home page lists, fetched concurrently.
    pub async fn home_page(&self) -> Result<HomePage> {
        let limit = self.home_list_size;
        let (featured, latest, popular, trending) = tokio::try_join!(
            self.store.list_posts(PostList::Featured, limit),
            self.store.list_posts(PostList::Latest, limit),
            self.store.list_posts(PostList::Popular, limit),
            self.store.list_posts(PostList::Trending, limit),
        )?;

        Ok(HomePage {
            featured: summaries(&featured),
            latest: summaries(&latest),
            popular: summaries(&popular),
            trending: summaries(&trending),
        })
    }

    /// Newest videos, optionally in one category. Pages are 1-based.
    pub async fn videos(&self, category: Option<&str>, page: i64) -> Result<Vec<Video>> {
        let request = PageRequest::new(page, VIDEOS_PAGE_SIZE);
        self.store
            .list_videos(category, request.page_size(), request.offset())
            .await
    }

    /// Count a video view. Failures are logged, never returned.
    pub async fn record_video_view(&self, video_id: Uuid) {
        match self.store.increment_video_views(video_id).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!(%video_id, "no video to count a view for"),
            Err(e) => tracing::warn!(%video_id, error = %e, "failed to increment video views"),
        }
    }

    /// Site-wide views on `date`; 0 when nothing was recorded.
    pub async fn daily_views(&self, date: NaiveDate) -> Result<i64> {
        Ok(self.store.daily_views(date).await?.unwrap_or(0))
    }

    /// Site-wide views for each day in `from..=to`, oldest first. Days with
    /// no row report 0.
    pub async fn daily_stats(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyViewStat>> {
        let mut stats = Vec::new();
        for date in from.iter_days().take_while(|d| *d <= to) {
            stats.push(DailyViewStat {
                date,
                views: self.daily_views(date).await?,
            });
        }
        Ok(stats)
    }
}

fn summaries(records: &[PostRecord]) -> Vec<PostSummary> {
    records.iter().map(PostSummary::from_record).collect()
}
