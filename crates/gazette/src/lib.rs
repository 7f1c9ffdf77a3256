//! Content core for a category-tagged news site on Postgres.
//!
//! This crate provides:
//! - A static category table with hierarchy and display metadata
//! - Category membership resolved from two sources (a `post_category`
//!   junction table and a legacy `post.category` column), unioned
//! - Offset pagination over the resolved set
//! - Deduplicated view counting with a per-day site-wide counter
//! - Author bylines resolved live from the `admin` table
//!
//! # Naming Convention
//!
//! **Table names use singular form** (`post`, `admin`, `video`,
//! `daily_view_stat`). The junction table is `post_category`.
//!
//! # Stores
//!
//! Everything goes through [`ContentStore`]. [`PgStore`] runs against
//! Postgres through a traced connection pool; [`MemoryStore`] keeps rows in
//! process and is what the tests use.
//!
//! ```ignore
//! let config = Config::from_env()?;
//! let store = Arc::new(PgStore::new(create_pool(&config)?));
//! let site = Site::new(store, CategoryRegistry::builtin(), &config);
//! let page = site.category_page("news", 1).await?;
//! ```

pub mod author;
pub mod category;
pub mod config;
mod error;
pub mod index;
pub mod migrate;
pub mod model;
pub mod pagination;
pub mod pool;
pub mod reading_time;
pub mod site;
pub mod store;
mod traced;
pub mod views;

pub use author::resolve_author;
pub use category::{Category, CategoryDef, CategoryHierarchy, CategoryRegistry};
pub use config::Config;
pub use error::Error;
pub use index::{CategoryPage, ContentIndex, MembershipSource, PostSummary};
pub use migrate::{Migration, MigrationRunner, MigrationStatus};
pub use model::{Admin, CategoryAssignment, DailyViewStat, Post, PostList, PostRecord, PostStatus, Video};
pub use pagination::{PageRequest, Pagination};
pub use pool::create_pool;
pub use site::{HomePage, Lookup, PostPage, Site};
pub use store::{BoxFuture, ContentStore, MemoryStore, PgStore};
pub use traced::{TracedObject, TracedPool, TracedTransaction};
pub use views::{SeenViews, ViewAccounting, VisitorToken};

/// Result type for gazette operations.
pub type Result<T> = std::result::Result<T, Error>;
