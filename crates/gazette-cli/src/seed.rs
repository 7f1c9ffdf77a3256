//! Demo content for `--memory`.

use chrono::{Duration, Utc};
use gazette::{Admin, MemoryStore, Post, Video};

/// A store with a handful of posts spread across both membership sources,
/// a renamed author, and a couple of videos.
pub fn demo_store() -> MemoryStore {
    let store = MemoryStore::new();
    let now = Utc::now();

    let editor = Admin::new("editor", "editor@example.com");
    let editor_id = editor.admin_id;
    store.insert_admin(editor);

    // Written before the junction table existed
    store.insert_post(
        Post::new(
            "Election results announced",
            "<p>The electoral commission has published the final tally.</p>",
        )
        .published()
        .featured()
        .in_category("politics")
        .with_views(120)
        .created_at(now - Duration::days(3)),
    );
    store.insert_post(
        Post::new("Markets close higher", "Stocks rallied on the last day of trading.")
            .published()
            .in_category("economy")
            .with_views(45)
            .created_at(now - Duration::days(2)),
    );

    // Tagged through the junction table, some in several categories
    let derby = store.insert_post(
        Post::new("Derby day recap", "A late goal settled it.")
            .published()
            .trending()
            .written_by(Some(editor_id), "editor")
            .with_views(300)
            .created_at(now - Duration::hours(20)),
    );
    store.assign(derby, "sport");
    store.assign(derby, "sport");

    let festival = store.insert_post(
        Post::new("Festival season opens", "Music, food and dance across the region.")
            .published()
            .in_category("culture")
            .written_by(Some(editor_id), "editor")
            .created_at(now - Duration::hours(5)),
    );
    store.assign(festival, "music");
    store.assign(festival, "travel");

    store.insert_post(Post::new("Unfinished draft", "Not ready yet.").in_category("politics"));

    store.rename_admin(editor_id, "chief-editor");

    store.insert_video(
        Video::new("Festival highlights", "https://videos.example.com/festival.mp4")
            .in_category("music")
            .created_at(now - Duration::hours(4)),
    );
    store.insert_video(
        Video::new("Derby goals", "https://videos.example.com/derby.mp4")
            .in_category("sport")
            .created_at(now - Duration::hours(18)),
    );

    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazette::{CategoryRegistry, Config, Site};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_demo_store_populates_pages() {
        let site = Site::new(Arc::new(demo_store()), CategoryRegistry::builtin(), &Config::default());

        let sport = site.category_page("sport", 1).await.unwrap().found().unwrap();
        assert_eq!(sport.pagination.total_posts, 1);
        assert_eq!(sport.posts[0].author, "chief-editor");

        let politics = site.category_page("politics", 1).await.unwrap().found().unwrap();
        assert_eq!(politics.posts.len(), 1);

        let home = site.home_page().await.unwrap();
        assert_eq!(home.trending.len(), 1);
        assert_eq!(home.popular[0].title, "Derby day recap");
    }
}
