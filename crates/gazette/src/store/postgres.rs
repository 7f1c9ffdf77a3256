//! Postgres-backed [`ContentStore`].

use super::{BoxFuture, ContentStore, boxed};
use crate::model::{Post, PostList, PostRecord, PostStatus, Video};
use crate::traced::TracedPool;
use crate::{Error, Result};
use chrono::NaiveDate;
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;
use uuid::Uuid;

/// Statements issued by [`PgStore`].
///
/// Visibility (`status = 'published' AND deleted = false`) is spelled out in
/// every public read so no caller can forget it.
pub mod sql {
    /// Columns of `post` in the order [`super::post_record_from_row`] reads
    /// them, followed by the joined admin username.
    pub const POST_RECORD_COLUMNS: &str = r#"p."id", p."post_id", p."title", p."content", p."excerpt", p."category", p."status", p."featured", p."is_trending", p."deleted", p."views", p."author_id", p."author", p."created_at", p."updated_at", a."username""#;

    /// The author join. Left outer so posts without a live admin keep their
    /// legacy byline.
    pub const POST_AUTHOR_JOIN: &str =
        r#"FROM "post" p LEFT JOIN "admin" a ON a."admin_id" = p."author_id""#;

    pub const ASSIGNED_POST_IDS: &str =
        r#"SELECT "post_id" FROM "post_category" WHERE "category_slug" = $1"#;

    pub const LEGACY_POST_IDS: &str =
        r#"SELECT "post_id" FROM "post" WHERE "category" = $1 AND "status" = 'published'"#;

    pub const VISIBLE_POST_ORDER: &str = r#"SELECT "post_id" FROM "post" WHERE "post_id" = ANY($1) AND "status" = 'published' AND "deleted" = false ORDER BY "featured" DESC, "created_at" DESC, "id" DESC"#;

    pub const INCREMENT_POST_VIEWS: &str = r#"UPDATE "post" SET "views" = "views" + 1 WHERE "post_id" = $1 AND "status" = 'published' AND "deleted" = false"#;

    pub const BUMP_DAILY_VIEWS: &str = r#"INSERT INTO "daily_view_stat" ("date", "views") VALUES ($1, 1) ON CONFLICT ("date") DO UPDATE SET "views" = "daily_view_stat"."views" + 1, "updated_at" = now() RETURNING "views""#;

    pub const DAILY_VIEWS: &str = r#"SELECT "views" FROM "daily_view_stat" WHERE "date" = $1"#;

    pub const VIDEO_COLUMNS: &str = r#""video_id", "title", "description", "video_url", "thumbnail_url", "category", "author", "duration", "is_featured", "views", "created_at""#;

    pub const INCREMENT_VIDEO_VIEWS: &str =
        r#"UPDATE "video" SET "views" = "views" + 1 WHERE "video_id" = $1"#;
}

const VISIBLE: &str = r#"p."status" = 'published' AND p."deleted" = false"#;

fn posts_by_ids_sql() -> String {
    format!(
        r#"SELECT {} {} WHERE p."post_id" = ANY($1) AND {}"#,
        sql::POST_RECORD_COLUMNS,
        sql::POST_AUTHOR_JOIN,
        VISIBLE
    )
}

fn post_by_public_id_sql() -> String {
    format!(
        r#"SELECT {} {} WHERE p."post_id" = $1"#,
        sql::POST_RECORD_COLUMNS,
        sql::POST_AUTHOR_JOIN
    )
}

fn list_posts_sql(list: PostList) -> String {
    let (filter, order) = match list {
        PostList::Featured => (r#" AND p."featured" = true"#, r#"p."created_at" DESC"#),
        PostList::Latest => ("", r#"p."created_at" DESC"#),
        PostList::Popular => ("", r#"p."views" DESC, p."created_at" DESC"#),
        PostList::Trending => (r#" AND p."is_trending" = true"#, r#"p."created_at" DESC"#),
    };
    format!(
        r#"SELECT {} {} WHERE {}{} ORDER BY {}, p."id" DESC LIMIT $1"#,
        sql::POST_RECORD_COLUMNS,
        sql::POST_AUTHOR_JOIN,
        VISIBLE,
        filter,
        order
    )
}

fn list_videos_sql(filtered: bool) -> String {
    if filtered {
        format!(
            r#"SELECT {} FROM "video" WHERE "category" = $1 ORDER BY "created_at" DESC LIMIT $2 OFFSET $3"#,
            sql::VIDEO_COLUMNS
        )
    } else {
        format!(
            r#"SELECT {} FROM "video" ORDER BY "created_at" DESC LIMIT $1 OFFSET $2"#,
            sql::VIDEO_COLUMNS
        )
    }
}

/// Read one column, turning driver errors into [`Error::Decode`].
fn column<'r, T: FromSql<'r>>(
    row: &'r Row,
    idx: usize,
    table: &'static str,
    name: &'static str,
    expected: &'static str,
) -> Result<T> {
    row.try_get(idx).map_err(|e| Error::Decode {
        table,
        column: name,
        expected,
        message: e.to_string(),
    })
}

fn post_record_from_row(row: &Row) -> Result<PostRecord> {
    let status: String = column(row, 6, "post", "status", "text")?;
    let status = status.parse::<PostStatus>().map_err(|message| Error::Decode {
        table: "post",
        column: "status",
        expected: "'draft' or 'published'",
        message,
    })?;

    let post = Post {
        id: column(row, 0, "post", "id", "bigint")?,
        post_id: column(row, 1, "post", "post_id", "uuid")?,
        title: column(row, 2, "post", "title", "text")?,
        content: column(row, 3, "post", "content", "text")?,
        excerpt: column(row, 4, "post", "excerpt", "text")?,
        category: column(row, 5, "post", "category", "text")?,
        status,
        featured: column(row, 7, "post", "featured", "bool")?,
        is_trending: column(row, 8, "post", "is_trending", "bool")?,
        deleted: column(row, 9, "post", "deleted", "bool")?,
        views: column(row, 10, "post", "views", "bigint")?,
        author_id: column(row, 11, "post", "author_id", "uuid")?,
        author: column(row, 12, "post", "author", "text")?,
        created_at: column(row, 13, "post", "created_at", "timestamptz")?,
        updated_at: column(row, 14, "post", "updated_at", "timestamptz")?,
    };

    Ok(PostRecord {
        post,
        author_username: column(row, 15, "admin", "username", "text")?,
    })
}

fn video_from_row(row: &Row) -> Result<Video> {
    Ok(Video {
        video_id: column(row, 0, "video", "video_id", "uuid")?,
        title: column(row, 1, "video", "title", "text")?,
        description: column(row, 2, "video", "description", "text")?,
        video_url: column(row, 3, "video", "video_url", "text")?,
        thumbnail_url: column(row, 4, "video", "thumbnail_url", "text")?,
        category: column(row, 5, "video", "category", "text")?,
        author: column(row, 6, "video", "author", "text")?,
        duration: column(row, 7, "video", "duration", "text")?,
        is_featured: column(row, 8, "video", "is_featured", "bool")?,
        views: column(row, 9, "video", "views", "bigint")?,
        created_at: column(row, 10, "video", "created_at", "timestamptz")?,
    })
}

fn uuid_column(rows: &[Row], table: &'static str) -> Result<Vec<Uuid>> {
    rows.iter()
        .map(|row| column(row, 0, table, "post_id", "uuid"))
        .collect()
}

/// [`ContentStore`] over a pooled Postgres connection.
#[derive(Clone)]
pub struct PgStore {
    pool: TracedPool,
}

impl PgStore {
    pub fn new(pool: TracedPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &TracedPool {
        &self.pool
    }
}

impl ContentStore for PgStore {
    fn assigned_post_ids<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, Result<Vec<Uuid>>> {
        boxed(async move {
            let conn = self.pool.get().await?;
            let rows = conn.query(sql::ASSIGNED_POST_IDS, &[&slug]).await?;
            uuid_column(&rows, "post_category")
        })
    }

    fn legacy_post_ids<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, Result<Vec<Uuid>>> {
        boxed(async move {
            let conn = self.pool.get().await?;
            let rows = conn.query(sql::LEGACY_POST_IDS, &[&slug]).await?;
            uuid_column(&rows, "post")
        })
    }

    fn visible_post_order<'a>(&'a self, ids: &'a [Uuid]) -> BoxFuture<'a, Result<Vec<Uuid>>> {
        boxed(async move {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let conn = self.pool.get().await?;
            let rows = conn.query(sql::VISIBLE_POST_ORDER, &[&ids]).await?;
            uuid_column(&rows, "post")
        })
    }

    fn posts_by_ids<'a>(&'a self, ids: &'a [Uuid]) -> BoxFuture<'a, Result<Vec<PostRecord>>> {
        boxed(async move {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let conn = self.pool.get().await?;
            let rows = conn.query(&posts_by_ids_sql(), &[&ids]).await?;
            rows.iter().map(post_record_from_row).collect()
        })
    }

    fn post_by_public_id<'a>(
        &'a self,
        post_id: Uuid,
    ) -> BoxFuture<'a, Result<Option<PostRecord>>> {
        boxed(async move {
            let conn = self.pool.get().await?;
            let row = conn.query_opt(&post_by_public_id_sql(), &[&post_id]).await?;
            row.as_ref().map(post_record_from_row).transpose()
        })
    }

    fn list_posts<'a>(
        &'a self,
        list: PostList,
        limit: u32,
    ) -> BoxFuture<'a, Result<Vec<PostRecord>>> {
        boxed(async move {
            let conn = self.pool.get().await?;
            let limit = limit as i64;
            let rows = conn.query(&list_posts_sql(list), &[&limit]).await?;
            rows.iter().map(post_record_from_row).collect()
        })
    }

    fn increment_post_views<'a>(&'a self, post_id: Uuid) -> BoxFuture<'a, Result<bool>> {
        boxed(async move {
            let conn = self.pool.get().await?;
            let affected = conn.execute(sql::INCREMENT_POST_VIEWS, &[&post_id]).await?;
            Ok(affected > 0)
        })
    }

    fn bump_daily_views<'a>(&'a self, date: NaiveDate) -> BoxFuture<'a, Result<i64>> {
        boxed(async move {
            let conn = self.pool.get().await?;
            let row = conn.query_one(sql::BUMP_DAILY_VIEWS, &[&date]).await?;
            column(&row, 0, "daily_view_stat", "views", "bigint")
        })
    }

    fn daily_views<'a>(&'a self, date: NaiveDate) -> BoxFuture<'a, Result<Option<i64>>> {
        boxed(async move {
            let conn = self.pool.get().await?;
            let row = conn.query_opt(sql::DAILY_VIEWS, &[&date]).await?;
            row.as_ref()
                .map(|row| column(row, 0, "daily_view_stat", "views", "bigint"))
                .transpose()
        })
    }

    fn list_videos<'a>(
        &'a self,
        category: Option<&'a str>,
        limit: u32,
        offset: u64,
    ) -> BoxFuture<'a, Result<Vec<Video>>> {
        boxed(async move {
            let conn = self.pool.get().await?;
            let limit = limit as i64;
            let offset = i64::try_from(offset).unwrap_or(i64::MAX);
            let rows = match category {
                Some(slug) => {
                    conn.query(&list_videos_sql(true), &[&slug, &limit, &offset])
                        .await?
                }
                None => conn.query(&list_videos_sql(false), &[&limit, &offset]).await?,
            };
            rows.iter().map(video_from_row).collect()
        })
    }

    fn increment_video_views<'a>(&'a self, video_id: Uuid) -> BoxFuture<'a, Result<bool>> {
        boxed(async move {
            let conn = self.pool.get().await?;
            let affected = conn.execute(sql::INCREMENT_VIDEO_VIEWS, &[&video_id]).await?;
            Ok(affected > 0)
        })
    }
}
