//! Storage seam.
//!
//! Everything the content core reads or writes goes through [`ContentStore`].
//! [`PgStore`] talks to Postgres; [`MemoryStore`] keeps rows in process and
//! can simulate a missing junction table or failing writes.
//!
//! The trait is object safe (boxed futures) so a site can hold an
//! `Arc<dyn ContentStore>` as easily as a concrete store.

use crate::Result;
use crate::model::{PostList, PostRecord, Video};
use chrono::NaiveDate;
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{PgStore, sql};

/// Boxed, `Send` future returned by store methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Box a store future. Pins down the output type so `?` inside `async`
/// blocks converts into [`crate::Error`].
pub(crate) fn boxed<'a, T, F>(fut: F) -> BoxFuture<'a, Result<T>>
where
    F: Future<Output = Result<T>> + Send + 'a,
{
    Box::pin(fut)
}

/// Filtered, sorted and limited access to the content tables, plus the two
/// atomic counter writes.
pub trait ContentStore: Send + Sync {
    /// Post ids assigned to `slug` in the `post_category` junction table.
    /// May contain duplicates.
    fn assigned_post_ids<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, Result<Vec<Uuid>>>;

    /// Ids of published posts whose legacy `category` column is `slug`.
    fn legacy_post_ids<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, Result<Vec<Uuid>>>;

    /// The visible (published, not deleted) subset of `ids`, ordered by
    /// featured first, then newest first.
    fn visible_post_order<'a>(&'a self, ids: &'a [Uuid]) -> BoxFuture<'a, Result<Vec<Uuid>>>;

    /// Visible posts among `ids`, with the author join applied. Order is
    /// unspecified.
    fn posts_by_ids<'a>(&'a self, ids: &'a [Uuid]) -> BoxFuture<'a, Result<Vec<PostRecord>>>;

    /// One post by public id, whatever its status. Callers decide visibility.
    fn post_by_public_id<'a>(&'a self, post_id: Uuid)
    -> BoxFuture<'a, Result<Option<PostRecord>>>;

    /// One of the fixed home page lists, visible posts only.
    fn list_posts<'a>(&'a self, list: PostList, limit: u32)
    -> BoxFuture<'a, Result<Vec<PostRecord>>>;

    /// Add one view to a visible post in a single statement. Returns `false`
    /// when no visible post has that id.
    fn increment_post_views<'a>(&'a self, post_id: Uuid) -> BoxFuture<'a, Result<bool>>;

    /// Add one view to the site-wide counter for `date`, creating the row if
    /// needed, in a single statement. Returns the new count.
    fn bump_daily_views<'a>(&'a self, date: NaiveDate) -> BoxFuture<'a, Result<i64>>;

    /// Site-wide views for `date`, if a row exists.
    fn daily_views<'a>(&'a self, date: NaiveDate) -> BoxFuture<'a, Result<Option<i64>>>;

    /// Videos, newest first, optionally restricted to one category.
    fn list_videos<'a>(
        &'a self,
        category: Option<&'a str>,
        limit: u32,
        offset: u64,
    ) -> BoxFuture<'a, Result<Vec<Video>>>;

    /// Add one view to a video in a single statement.
    fn increment_video_views<'a>(&'a self, video_id: Uuid) -> BoxFuture<'a, Result<bool>>;
}
