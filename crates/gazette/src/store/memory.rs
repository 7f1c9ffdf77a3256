//! In-process [`ContentStore`].
//!
//! Rows live behind one mutex, so every operation, including the counter
//! writes, is atomic with respect to the others. Switches simulate the
//! failures the content core has to deal with: a missing `post_category`
//! table, a store that rejects writes, and one that rejects reads of the
//! `post` table.

use super::{BoxFuture, ContentStore};
use crate::model::{Admin, CategoryAssignment, Post, PostList, PostRecord, Video};
use crate::{Error, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::future::ready;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    admins: Vec<Admin>,
    posts: Vec<Post>,
    assignments: Vec<CategoryAssignment>,
    daily: BTreeMap<NaiveDate, i64>,
    videos: Vec<Video>,
    next_post_id: i64,
}

impl Tables {
    fn record(&self, post: &Post) -> PostRecord {
        let author_username = post.author_id.and_then(|id| {
            self.admins
                .iter()
                .find(|a| a.admin_id == id)
                .map(|a| a.username.clone())
        });
        PostRecord {
            post: post.clone(),
            author_username,
        }
    }

    fn visible(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter().filter(|p| p.is_visible())
    }
}

/// Featured first, then newest first; ties broken by internal id, newest
/// first, matching the Postgres ordering.
fn category_order(a: &Post, b: &Post) -> std::cmp::Ordering {
    b.featured
        .cmp(&a.featured)
        .then(b.created_at.cmp(&a.created_at))
        .then(b.id.cmp(&a.id))
}

/// An already-completed store result.
fn done<'a, T: Send + 'a>(result: Result<T>) -> BoxFuture<'a, Result<T>> {
    Box::pin(ready(result))
}

fn newest_first(a: &Post, b: &Post) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

/// [`ContentStore`] kept entirely in memory.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    junction_available: AtomicBool,
    writes_available: AtomicBool,
    reads_available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            junction_available: AtomicBool::new(true),
            writes_available: AtomicBool::new(true),
            reads_available: AtomicBool::new(true),
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_admin(&self, admin: Admin) {
        self.tables().admins.push(admin);
    }

    /// Change an admin's username. Returns `false` for an unknown admin.
    pub fn rename_admin(&self, admin_id: Uuid, username: impl Into<String>) -> bool {
        let mut tables = self.tables();
        match tables.admins.iter_mut().find(|a| a.admin_id == admin_id) {
            Some(admin) => {
                admin.username = username.into();
                true
            }
            None => false,
        }
    }

    /// Insert a post, assigning its internal id. Returns the public id.
    pub fn insert_post(&self, mut post: Post) -> Uuid {
        let mut tables = self.tables();
        tables.next_post_id += 1;
        post.id = tables.next_post_id;
        let post_id = post.post_id;
        tables.posts.push(post);
        post_id
    }

    /// Add a junction row. Duplicates are kept, as in the real table.
    pub fn assign(&self, post_id: Uuid, category_slug: impl Into<String>) {
        self.tables().assignments.push(CategoryAssignment {
            post_id,
            category_slug: category_slug.into(),
        });
    }

    pub fn insert_video(&self, video: Video) -> Uuid {
        let video_id = video.video_id;
        self.tables().videos.push(video);
        video_id
    }

    /// The stored post row, without any visibility filter.
    pub fn post(&self, post_id: Uuid) -> Option<Post> {
        self.tables()
            .posts
            .iter()
            .find(|p| p.post_id == post_id)
            .cloned()
    }

    pub fn video(&self, video_id: Uuid) -> Option<Video> {
        self.tables()
            .videos
            .iter()
            .find(|v| v.video_id == video_id)
            .cloned()
    }

    /// Simulate the junction table being absent (or back).
    pub fn set_junction_available(&self, available: bool) {
        self.junction_available.store(available, Ordering::SeqCst);
    }

    /// Simulate a store that rejects every write (or accepts them again).
    pub fn set_writes_available(&self, available: bool) {
        self.writes_available.store(available, Ordering::SeqCst);
    }

    /// Simulate `post` reads failing (or working again). The junction table
    /// is governed by [`MemoryStore::set_junction_available`] alone.
    pub fn set_reads_available(&self, available: bool) {
        self.reads_available.store(available, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<()> {
        if self.reads_available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Unavailable("post table unreachable".to_string()))
        }
    }

    fn check_writes(&self) -> Result<()> {
        if self.writes_available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Unavailable("store is read-only".to_string()))
        }
    }
}

impl ContentStore for MemoryStore {
    fn assigned_post_ids<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, Result<Vec<Uuid>>> {
        let result = if self.junction_available.load(Ordering::SeqCst) {
            Ok(self
                .tables()
                .assignments
                .iter()
                .filter(|a| a.category_slug == slug)
                .map(|a| a.post_id)
                .collect())
        } else {
            Err(Error::Unavailable(
                r#"relation "post_category" does not exist"#.to_string(),
            ))
        };
        done(result)
    }

    fn legacy_post_ids<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, Result<Vec<Uuid>>> {
        if let Err(e) = self.check_reads() {
            return done(Err(e));
        }
        let ids = self
            .tables()
            .posts
            .iter()
            .filter(|p| p.category.as_deref() == Some(slug))
            .filter(|p| p.status == crate::model::PostStatus::Published)
            .map(|p| p.post_id)
            .collect();
        done(Ok(ids))
    }

    fn visible_post_order<'a>(&'a self, ids: &'a [Uuid]) -> BoxFuture<'a, Result<Vec<Uuid>>> {
        if let Err(e) = self.check_reads() {
            return done(Err(e));
        }
        let tables = self.tables();
        let mut posts: Vec<&Post> = tables.visible().filter(|p| ids.contains(&p.post_id)).collect();
        posts.sort_by(|a, b| category_order(a, b));
        let ordered = posts.into_iter().map(|p| p.post_id).collect();
        drop(tables);
        done(Ok(ordered))
    }

    fn posts_by_ids<'a>(&'a self, ids: &'a [Uuid]) -> BoxFuture<'a, Result<Vec<PostRecord>>> {
        if let Err(e) = self.check_reads() {
            return done(Err(e));
        }
        let tables = self.tables();
        let records = tables
            .visible()
            .filter(|p| ids.contains(&p.post_id))
            .map(|p| tables.record(p))
            .collect();
        drop(tables);
        done(Ok(records))
    }

    fn post_by_public_id<'a>(
        &'a self,
        post_id: Uuid,
    ) -> BoxFuture<'a, Result<Option<PostRecord>>> {
        if let Err(e) = self.check_reads() {
            return done(Err(e));
        }
        let tables = self.tables();
        let record = tables
            .posts
            .iter()
            .find(|p| p.post_id == post_id)
            .map(|p| tables.record(p));
        drop(tables);
        done(Ok(record))
    }

    fn list_posts<'a>(
        &'a self,
        list: PostList,
        limit: u32,
    ) -> BoxFuture<'a, Result<Vec<PostRecord>>> {
        if let Err(e) = self.check_reads() {
            return done(Err(e));
        }
        let tables = self.tables();
        let mut posts: Vec<&Post> = tables
            .visible()
            .filter(|p| match list {
                PostList::Featured => p.featured,
                PostList::Trending => p.is_trending,
                PostList::Latest | PostList::Popular => true,
            })
            .collect();
        match list {
            PostList::Popular => {
                posts.sort_by(|a, b| b.views.cmp(&a.views).then(newest_first(a, b)))
            }
            _ => posts.sort_by(|a, b| newest_first(a, b)),
        }
        let records = posts
            .into_iter()
            .take(limit as usize)
            .map(|p| tables.record(p))
            .collect();
        drop(tables);
        done(Ok(records))
    }

    fn increment_post_views<'a>(&'a self, post_id: Uuid) -> BoxFuture<'a, Result<bool>> {
        let result = self.check_writes().map(|()| {
            let mut tables = self.tables();
            match tables
                .posts
                .iter_mut()
                .find(|p| p.post_id == post_id && p.is_visible())
            {
                Some(post) => {
                    post.views += 1;
                    true
                }
                None => false,
            }
        });
        done(result)
    }

    fn bump_daily_views<'a>(&'a self, date: NaiveDate) -> BoxFuture<'a, Result<i64>> {
        let result = self.check_writes().map(|()| {
            let mut tables = self.tables();
            let views = tables.daily.entry(date).or_insert(0);
            *views += 1;
            *views
        });
        done(result)
    }

    fn daily_views<'a>(&'a self, date: NaiveDate) -> BoxFuture<'a, Result<Option<i64>>> {
        let views = self.tables().daily.get(&date).copied();
        done(Ok(views))
    }

    fn list_videos<'a>(
        &'a self,
        category: Option<&'a str>,
        limit: u32,
        offset: u64,
    ) -> BoxFuture<'a, Result<Vec<Video>>> {
        let tables = self.tables();
        let mut videos: Vec<&Video> = tables
            .videos
            .iter()
            .filter(|v| category.is_none() || v.category.as_deref() == category)
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let page = videos
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .cloned()
            .collect();
        drop(tables);
        done(Ok(page))
    }

    fn increment_video_views<'a>(&'a self, video_id: Uuid) -> BoxFuture<'a, Result<bool>> {
        let result = self.check_writes().map(|()| {
            let mut tables = self.tables();
            match tables.videos.iter_mut().find(|v| v.video_id == video_id) {
                Some(video) => {
                    video.views += 1;
                    true
                }
                None => false,
            }
        });
        done(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_junction_keeps_duplicates() {
        let store = MemoryStore::new();
        let id = store.insert_post(Post::new("z", "body").published());
        store.assign(id, "sport");
        store.assign(id, "sport");

        let ids = store.assigned_post_ids("sport").await.unwrap();
        assert_eq!(ids, vec![id, id]);
    }

    #[tokio::test]
    async fn test_missing_junction_errors() {
        let store = MemoryStore::new();
        store.set_junction_available(false);
        let err = store.assigned_post_ids("news").await.unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_legacy_lookup_ignores_drafts() {
        let store = MemoryStore::new();
        let live = store.insert_post(Post::new("a", "b").published().in_category("news"));
        store.insert_post(Post::new("c", "d").in_category("news"));

        assert_eq!(store.legacy_post_ids("news").await.unwrap(), vec![live]);
    }

    #[tokio::test]
    async fn test_visible_order_featured_then_newest() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let old = store.insert_post(
            Post::new("old", "")
                .published()
                .created_at(now - Duration::days(2)),
        );
        let new = store.insert_post(Post::new("new", "").published().created_at(now));
        let pinned = store.insert_post(
            Post::new("pinned", "")
                .published()
                .featured()
                .created_at(now - Duration::days(9)),
        );
        let hidden = store.insert_post(Post::new("hidden", "").published().deleted());

        let order = store
            .visible_post_order(&[old, new, pinned, hidden])
            .await
            .unwrap();
        assert_eq!(order, vec![pinned, new, old]);
    }

    #[tokio::test]
    async fn test_increment_skips_invisible_posts() {
        let store = MemoryStore::new();
        let draft = store.insert_post(Post::new("d", ""));
        assert!(!store.increment_post_views(draft).await.unwrap());
        assert_eq!(store.post(draft).unwrap().views, 0);
    }

    #[tokio::test]
    async fn test_writes_can_be_disabled() {
        let store = MemoryStore::new();
        let id = store.insert_post(Post::new("p", "").published());
        store.set_writes_available(false);
        assert!(store.increment_post_views(id).await.is_err());
        assert!(store.bump_daily_views(Utc::now().date_naive()).await.is_err());
        store.set_writes_available(true);
        assert!(store.increment_post_views(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_daily_bump_creates_then_increments() {
        let store = MemoryStore::new();
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(store.daily_views(day).await.unwrap(), None);
        assert_eq!(store.bump_daily_views(day).await.unwrap(), 1);
        assert_eq!(store.bump_daily_views(day).await.unwrap(), 2);
        assert_eq!(store.daily_views(day).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_video_listing_filters_and_pages() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for i in 0..5 {
            store.insert_video(
                Video::new(format!("v{i}"), "https://example.com/v.mp4")
                    .in_category(if i % 2 == 0 { "music" } else { "sport" })
                    .created_at(now - Duration::minutes(i)),
            );
        }
        let music = store.list_videos(Some("music"), 10, 0).await.unwrap();
        let titles: Vec<_> = music.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["v0", "v2", "v4"]);

        let second_page = store.list_videos(None, 2, 2).await.unwrap();
        let titles: Vec<_> = second_page.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["v2", "v3"]);
    }
}
