//! Schema migrations.
//!
//! Migrations are plain SQL, applied in version order. Each one runs in its
//! own transaction together with the row recording it in
//! `__gazette_migrations`, so a failed migration leaves no trace.

use crate::traced::TracedObject;
use crate::{Error, Result};

/// Table recording applied migrations.
pub const MIGRATIONS_TABLE: &str = "__gazette_migrations";

/// A schema migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    /// Sortable version, e.g. `2024_01_01_000001`
    pub version: &'static str,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Whether a known migration has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: &'static str,
    pub name: &'static str,
    pub applied: bool,
}

/// All migrations, oldest first.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "2024_01_01_000001",
        name: "create_admin",
        sql: r#"
CREATE TABLE "admin" (
    "id" BIGSERIAL PRIMARY KEY,
    "admin_id" UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
    "username" TEXT NOT NULL UNIQUE,
    "email" TEXT NOT NULL UNIQUE,
    "password_hash" TEXT NOT NULL,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#,
    },
    Migration {
        version: "2024_01_01_000002",
        name: "create_post",
        sql: r#"
CREATE TABLE "post" (
    "id" BIGSERIAL PRIMARY KEY,
    "post_id" UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
    "title" TEXT NOT NULL,
    "content" TEXT NOT NULL,
    "excerpt" TEXT,
    "category" TEXT,
    "status" TEXT NOT NULL DEFAULT 'draft' CHECK ("status" IN ('draft', 'published')),
    "featured" BOOLEAN NOT NULL DEFAULT false,
    "is_trending" BOOLEAN NOT NULL DEFAULT false,
    "deleted" BOOLEAN NOT NULL DEFAULT false,
    "views" BIGINT NOT NULL DEFAULT 0,
    "author_id" UUID REFERENCES "admin" ("admin_id") ON DELETE SET NULL,
    "author" TEXT NOT NULL DEFAULT 'Admin',
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX "post_category_idx" ON "post" ("category");
CREATE INDEX "post_listing_idx" ON "post" ("status", "deleted", "created_at" DESC);
"#,
    },
    Migration {
        version: "2024_01_01_000003",
        name: "create_daily_view_stat",
        sql: r#"
CREATE TABLE "daily_view_stat" (
    "id" BIGSERIAL PRIMARY KEY,
    "date" DATE NOT NULL UNIQUE,
    "views" BIGINT NOT NULL DEFAULT 0,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#,
    },
    Migration {
        version: "2024_01_01_000004",
        name: "create_video",
        sql: r#"
CREATE TABLE "video" (
    "id" BIGSERIAL PRIMARY KEY,
    "video_id" UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
    "title" TEXT NOT NULL,
    "description" TEXT NOT NULL DEFAULT '',
    "video_url" TEXT NOT NULL,
    "thumbnail_url" TEXT NOT NULL DEFAULT '',
    "category" TEXT,
    "author" TEXT NOT NULL DEFAULT 'Admin',
    "duration" TEXT,
    "is_featured" BOOLEAN NOT NULL DEFAULT false,
    "views" BIGINT NOT NULL DEFAULT 0,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX "video_created_at_idx" ON "video" ("created_at" DESC);
"#,
    },
    Migration {
        version: "2024_06_01_000001",
        name: "create_post_category",
        // No uniqueness: older tooling inserted the same pair more than once.
        sql: r#"
CREATE TABLE "post_category" (
    "id" BIGSERIAL PRIMARY KEY,
    "post_id" UUID NOT NULL REFERENCES "post" ("post_id") ON DELETE CASCADE,
    "category_slug" TEXT NOT NULL,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX "post_category_slug_idx" ON "post_category" ("category_slug");
"#,
    },
];

fn create_migrations_table_sql() -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS "{MIGRATIONS_TABLE}" (
    "version" TEXT PRIMARY KEY,
    "name" TEXT NOT NULL,
    "applied_at" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#
    )
}

fn applied_versions_sql() -> String {
    format!(r#"SELECT "version" FROM "{MIGRATIONS_TABLE}" ORDER BY "version""#)
}

fn record_migration_sql() -> String {
    format!(r#"INSERT INTO "{MIGRATIONS_TABLE}" ("version", "name") VALUES ($1, $2)"#)
}

/// Applies [`MIGRATIONS`] over a pooled connection.
pub struct MigrationRunner<'a> {
    conn: &'a mut TracedObject,
    migrations: &'static [Migration],
}

impl<'a> MigrationRunner<'a> {
    pub fn new(conn: &'a mut TracedObject) -> Self {
        Self::with_migrations(conn, MIGRATIONS)
    }

    pub fn with_migrations(conn: &'a mut TracedObject, migrations: &'static [Migration]) -> Self {
        Self { conn, migrations }
    }

    async fn applied_versions(&mut self) -> Result<Vec<String>> {
        self.conn
            .batch_execute(&create_migrations_table_sql())
            .await?;
        let rows = self.conn.query(&applied_versions_sql(), &[]).await?;
        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(Error::from))
            .collect()
    }

    /// Every known migration and whether it has been applied.
    pub async fn status(&mut self) -> Result<Vec<MigrationStatus>> {
        let applied = self.applied_versions().await?;
        Ok(self
            .migrations
            .iter()
            .map(|m| MigrationStatus {
                version: m.version,
                name: m.name,
                applied: applied.iter().any(|v| v == m.version),
            })
            .collect())
    }

    /// Apply pending migrations in order. Returns the versions applied.
    ///
    /// Stops at the first failure; migrations before it stay applied.
    pub async fn migrate(&mut self) -> Result<Vec<&'static str>> {
        let applied = self.applied_versions().await?;
        let mut ran = Vec::new();

        for migration in self.migrations {
            if applied.iter().any(|v| v == migration.version) {
                continue;
            }

            tracing::info!(version = migration.version, name = migration.name, "applying migration");
            let tx = self.conn.transaction().await?;
            tx.batch_execute(migration.sql)
                .await
                .map_err(|e| Error::Migration {
                    version: migration.version.to_string(),
                    message: e.to_string(),
                })?;
            tx.execute(&record_migration_sql(), &[&migration.version, &migration.name])
                .await?;
            tx.commit().await?;
            ran.push(migration.version);
        }

        if ran.is_empty() {
            tracing::info!("schema is up to date");
        }
        Ok(ran)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_sorted_and_unique() {
        let versions: Vec<&str> = MIGRATIONS.iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(versions, sorted);
    }

    #[test]
    fn test_daily_stat_date_is_unique() {
        let daily = MIGRATIONS
            .iter()
            .find(|m| m.name == "create_daily_view_stat")
            .unwrap();
        assert!(daily.sql.contains(r#""date" DATE NOT NULL UNIQUE"#));
    }

    #[test]
    fn test_junction_allows_duplicates() {
        let junction = MIGRATIONS
            .iter()
            .find(|m| m.name == "create_post_category")
            .unwrap();
        assert!(!junction.sql.contains("UNIQUE"));
    }

    #[test]
    fn test_bookkeeping_statements_name_the_table() {
        assert!(create_migrations_table_sql().contains(MIGRATIONS_TABLE));
        assert!(record_migration_sql().contains("VALUES ($1, $2)"));
    }
}
