//! Bylines follow admin renames without rewriting posts.

use gazette::{Admin, CategoryRegistry, Config, ContentStore, MemoryStore, Post, Site, VisitorToken, resolve_author};
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn rename_changes_byline_but_not_legacy_field() {
    let store = Arc::new(MemoryStore::new());
    let admin = Admin::new("jdoe", "jdoe@example.com");
    let admin_id = admin.admin_id;
    store.insert_admin(admin);
    let post = store.insert_post(
        Post::new("t", "body")
            .published()
            .written_by(Some(admin_id), "jdoe"),
    );

    let before = store.post_by_public_id(post).await.unwrap().unwrap();
    assert_eq!(resolve_author(&before), "jdoe");

    assert!(store.rename_admin(admin_id, "jane.doe"));

    let after = store.post_by_public_id(post).await.unwrap().unwrap();
    assert_eq!(resolve_author(&after), "jane.doe");
    assert_eq!(after.post.author, "jdoe");
}

#[tokio::test]
async fn dangling_or_missing_author_uses_legacy_name() {
    let store = Arc::new(MemoryStore::new());
    let orphan = store.insert_post(
        Post::new("orphan", "body")
            .published()
            .written_by(Some(Uuid::new_v4()), "Former Staff"),
    );
    let anonymous = store.insert_post(Post::new("anonymous", "body").published());

    let orphan = store.post_by_public_id(orphan).await.unwrap().unwrap();
    assert_eq!(orphan.author_username, None);
    assert_eq!(resolve_author(&orphan), "Former Staff");

    let anonymous = store.post_by_public_id(anonymous).await.unwrap().unwrap();
    assert_eq!(resolve_author(&anonymous), "Admin");
}

#[tokio::test]
async fn every_read_path_resolves_the_same_byline() {
    let store = Arc::new(MemoryStore::new());
    let admin = Admin::new("editor", "editor@example.com");
    let admin_id = admin.admin_id;
    store.insert_admin(admin);
    let post = store.insert_post(
        Post::new("t", "body")
            .published()
            .featured()
            .in_category("politics")
            .written_by(Some(admin_id), "Admin"),
    );
    store.rename_admin(admin_id, "chief-editor");

    let site = Site::new(store.clone(), CategoryRegistry::builtin(), &Config::default());

    let page = site
        .post_page(post, VisitorToken::default())
        .await
        .unwrap()
        .found()
        .unwrap();
    assert_eq!(page.author, "chief-editor");

    let listing = site.category_page("politics", 1).await.unwrap().found().unwrap();
    assert_eq!(listing.posts[0].author, "chief-editor");

    let home = site.home_page().await.unwrap();
    assert_eq!(home.featured[0].author, "chief-editor");
}
