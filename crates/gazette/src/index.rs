//! Category membership and category pages.
//!
//! A post belongs to a category when the `post_category` junction table says
//! so, or when its legacy `category` column names the category. Both sources
//! are consulted and their results unioned, so posts from before the
//! junction table existed keep showing up.

use crate::Result;
use crate::model::PostRecord;
use crate::pagination::{PageRequest, Pagination, page_slice};
use crate::store::ContentStore;
use crate::author::resolve_author;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use uuid::Uuid;

/// One way of finding the posts in a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipSource {
    /// The `post_category` junction table. May be missing on older
    /// deployments, so a failure here is logged and treated as empty.
    Junction,

    /// The legacy `post.category` column, published posts only. Always
    /// present; a failure here fails the read.
    LegacyColumn,
}

impl MembershipSource {
    pub const ALL: [MembershipSource; 2] = [MembershipSource::Junction, MembershipSource::LegacyColumn];

    pub fn name(self) -> &'static str {
        match self {
            MembershipSource::Junction => "junction",
            MembershipSource::LegacyColumn => "legacy_column",
        }
    }

    /// Whether a failed lookup may be replaced by an empty result.
    pub fn is_degradable(self) -> bool {
        matches!(self, MembershipSource::Junction)
    }

    async fn lookup<S: ContentStore + ?Sized>(self, store: &S, slug: &str) -> Result<Vec<Uuid>> {
        match self {
            MembershipSource::Junction => store.assigned_post_ids(slug).await,
            MembershipSource::LegacyColumn => store.legacy_post_ids(slug).await,
        }
    }
}

/// A post as listed on a category or home page.
#[derive(Debug, Clone, PartialEq)]
pub struct PostSummary {
    pub post_id: Uuid,
    pub title: String,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    /// Resolved byline
    pub author: String,
    pub views: i64,
    pub featured: bool,
    pub is_trending: bool,
    pub created_at: DateTime<Utc>,
}

impl PostSummary {
    pub fn from_record(record: &PostRecord) -> Self {
        let post = &record.post;
        Self {
            post_id: post.post_id,
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            category: post.category.clone(),
            author: resolve_author(record).to_string(),
            views: post.views,
            featured: post.featured,
            is_trending: post.is_trending,
            created_at: post.created_at,
        }
    }
}

/// One page of a category listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryPage {
    pub slug: String,
    pub posts: Vec<PostSummary>,
    pub pagination: Pagination,
}

/// Resolves category membership against a [`ContentStore`].
pub struct ContentIndex<S: ?Sized> {
    store: Arc<S>,
    sources: Vec<MembershipSource>,
}

impl<S: ContentStore + ?Sized> ContentIndex<S> {
    /// An index consulting both the junction table and the legacy column.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_sources(store, MembershipSource::ALL.to_vec())
    }

    pub fn with_sources(store: Arc<S>, sources: Vec<MembershipSource>) -> Self {
        Self { store, sources }
    }

    pub fn sources(&self) -> &[MembershipSource] {
        &self.sources
    }

    /// Every post id in `slug`, from any source, without duplicates.
    ///
    /// Visibility is not applied here beyond what each source does itself
    /// (the legacy column only matches published posts).
    pub async fn resolve_category_post_ids(&self, slug: &str) -> Result<BTreeSet<Uuid>> {
        let mut ids = BTreeSet::new();
        for source in &self.sources {
            match source.lookup(&*self.store, slug).await {
                Ok(found) => {
                    tracing::debug!(slug, source = source.name(), count = found.len(), "category membership");
                    ids.extend(found);
                }
                Err(e) if source.is_degradable() => {
                    tracing::warn!(
                        slug,
                        source = source.name(),
                        error = %e,
                        "category membership lookup failed, continuing without it"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(ids)
    }

    /// One page of visible posts in `slug`, featured first, then newest.
    ///
    /// The total count and the slice come from the same visible, ordered id
    /// list, so they always agree.
    pub async fn resolve_category_page(&self, slug: &str, request: PageRequest) -> Result<CategoryPage> {
        let ids: Vec<Uuid> = self
            .resolve_category_post_ids(slug)
            .await?
            .into_iter()
            .collect();

        if ids.is_empty() {
            return Ok(CategoryPage {
                slug: slug.to_string(),
                posts: Vec::new(),
                pagination: Pagination::empty(request),
            });
        }

        let ordered = self.store.visible_post_order(&ids).await?;
        let pagination = Pagination::compute(ordered.len() as u64, request);
        let slice = page_slice(&ordered, request);

        let posts = if slice.is_empty() {
            Vec::new()
        } else {
            let records = self.store.posts_by_ids(slice).await?;
            in_slice_order(slice, records)
        };

        Ok(CategoryPage {
            slug: slug.to_string(),
            posts,
            pagination,
        })
    }
}

/// Arrange fetched records in `order`. Ids with no record (the post changed
/// between the two reads) are skipped.
fn in_slice_order(order: &[Uuid], records: Vec<PostRecord>) -> Vec<PostSummary> {
    let by_id: HashMap<Uuid, PostRecord> = records
        .into_iter()
        .map(|r| (r.post.post_id, r))
        .collect();
    order
        .iter()
        .filter_map(|id| by_id.get(id))
        .map(PostSummary::from_record)
        .collect()
}
