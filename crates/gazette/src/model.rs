//! Row types for the content tables.
//!
//! Table names are singular (`post`, `admin`, `post_category`,
//! `daily_view_stat`, `video`): each type describes one record.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(format!("unknown post status '{}'", other)),
        }
    }
}

/// A post.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// Internal serial id
    pub id: i64,

    /// Public, opaque identifier used in URLs
    pub post_id: Uuid,

    pub title: String,

    pub content: String,

    pub excerpt: Option<String>,

    /// Legacy single-category column. Membership may also (or only) be
    /// recorded in `post_category`.
    pub category: Option<String>,

    pub status: PostStatus,

    pub featured: bool,

    pub is_trending: bool,

    /// Soft delete flag
    pub deleted: bool,

    pub views: i64,

    /// Live author reference (`admin.admin_id`)
    pub author_id: Option<Uuid>,

    /// Author name frozen at creation time
    pub author: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// A new draft with a fresh public id, authored by the default "Admin".
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            post_id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            excerpt: None,
            category: None,
            status: PostStatus::Draft,
            featured: false,
            is_trending: false,
            deleted: false,
            views: 0,
            author_id: None,
            author: "Admin".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn published(mut self) -> Self {
        self.status = PostStatus::Published;
        self
    }

    pub fn in_category(mut self, slug: impl Into<String>) -> Self {
        self.category = Some(slug.into());
        self
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    pub fn featured(mut self) -> Self {
        self.featured = true;
        self
    }

    pub fn trending(mut self) -> Self {
        self.is_trending = true;
        self
    }

    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    pub fn written_by(mut self, author_id: Option<Uuid>, legacy_name: impl Into<String>) -> Self {
        self.author_id = author_id;
        self.author = legacy_name.into();
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self.updated_at = at;
        self
    }

    pub fn with_views(mut self, views: i64) -> Self {
        self.views = views;
        self
    }

    /// Whether any public read path may show this post.
    pub fn is_visible(&self) -> bool {
        self.status == PostStatus::Published && !self.deleted
    }
}

/// A post as read through the public path: the post row left-joined to the
/// admin row its `author_id` points at.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub post: Post,

    /// `admin.username` at read time, `None` when there is no author_id or
    /// the admin no longer exists
    pub author_username: Option<String>,
}

/// A row of the `post_category` junction table. Not unique: the same pair
/// may appear more than once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryAssignment {
    pub post_id: Uuid,
    pub category_slug: String,
}

/// Site-wide view count for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyViewStat {
    pub date: NaiveDate,
    pub views: i64,
}

/// A site administrator. Usernames change; posts refer to admins by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admin {
    pub admin_id: Uuid,
    pub username: String,
    pub email: String,
    /// Opaque password hash, never read by the content path
    pub password_hash: String,
}

impl Admin {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            admin_id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password_hash: String::new(),
        }
    }
}

/// A video entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    pub video_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub category: Option<String>,
    pub author: String,
    pub duration: Option<String>,
    pub is_featured: bool,
    pub views: i64,
    pub created_at: DateTime<Utc>,
}

impl Video {
    pub fn new(title: impl Into<String>, video_url: impl Into<String>) -> Self {
        Self {
            video_id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            video_url: video_url.into(),
            thumbnail_url: String::new(),
            category: None,
            author: "Admin".to_string(),
            duration: None,
            is_featured: false,
            views: 0,
            created_at: Utc::now(),
        }
    }

    pub fn in_category(mut self, slug: impl Into<String>) -> Self {
        self.category = Some(slug.into());
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }
}

/// Fixed post lists shown on the home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostList {
    /// Featured posts, newest first
    Featured,
    /// All visible posts, newest first
    Latest,
    /// Most viewed first
    Popular,
    /// Posts flagged trending, newest first
    Trending,
}
