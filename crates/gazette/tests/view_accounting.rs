//! View counting: dedup, concurrency, and best-effort writes.

use chrono::NaiveDate;
use gazette::{ContentStore, MemoryStore, Post, SeenViews, ViewAccounting, VisitorToken};
use std::sync::Arc;
use uuid::Uuid;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()
}

fn accounting() -> (Arc<MemoryStore>, ViewAccounting<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let views = ViewAccounting::new(store.clone(), SeenViews::default());
    (store, views)
}

#[tokio::test]
async fn repeat_view_with_same_token_counts_once() {
    let (store, views) = accounting();
    let post = store.insert_post(Post::new("p", "body").published());

    let token = views.record_view_on(post, VisitorToken::default(), day()).await;
    assert!(token.contains(post));
    let again = views.record_view_on(post, token.clone(), day()).await;

    assert_eq!(again, token);
    assert_eq!(store.post(post).unwrap().views, 1);
    assert_eq!(store.daily_views(day()).await.unwrap(), Some(1));
}

#[tokio::test]
async fn token_survives_the_cookie_round_trip() {
    let (store, views) = accounting();
    let post = store.insert_post(Post::new("p", "body").published());

    let token = views.record_view_on(post, VisitorToken::default(), day()).await;
    let cookie = token.encode();
    let returned = VisitorToken::parse(&cookie, 50);
    views.record_view_on(post, returned, day()).await;

    assert_eq!(store.post(post).unwrap().views, 1);
}

#[tokio::test]
async fn session_dedup_survives_a_cleared_buffer() {
    let (store, views) = accounting();
    let post = store.insert_post(Post::new("p", "body").published());

    views
        .record_view_on(post, VisitorToken::with_session("visitor-1", 50), day())
        .await;
    // Same session, buffer thrown away
    let refreshed = views
        .record_view_on(post, VisitorToken::with_session("visitor-1", 50), day())
        .await;

    assert!(refreshed.contains(post));
    assert_eq!(store.post(post).unwrap().views, 1);

    // A new day counts again
    views
        .record_view_on(post, VisitorToken::with_session("visitor-1", 50), day().succ_opt().unwrap())
        .await;
    assert_eq!(store.post(post).unwrap().views, 2);
}

#[tokio::test]
async fn evicted_posts_count_again() {
    let (store, views) = accounting();
    let posts: Vec<Uuid> = (0..3)
        .map(|i| store.insert_post(Post::new(format!("p{i}"), "body").published()))
        .collect();

    let mut token = VisitorToken::new(2);
    for post in &posts {
        token = views.record_view_on(*post, token, day()).await;
    }
    assert!(!token.contains(posts[0]));

    views.record_view_on(posts[0], token, day()).await;
    assert_eq!(store.post(posts[0]).unwrap().views, 2);
    assert_eq!(store.daily_views(day()).await.unwrap(), Some(4));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_views_are_not_lost() {
    let (store, views) = accounting();
    let views = Arc::new(views);
    let posts: Vec<Uuid> = (0..4)
        .map(|i| store.insert_post(Post::new(format!("p{i}"), "body").published()))
        .collect();

    let mut handles = Vec::new();
    for visitor in 0..50 {
        let views = views.clone();
        let post = posts[visitor % posts.len()];
        handles.push(tokio::spawn(async move {
            views.record_view_on(post, VisitorToken::default(), day()).await
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let total: i64 = posts.iter().map(|p| store.post(*p).unwrap().views).sum();
    assert_eq!(total, 50);
    assert_eq!(store.daily_views(day()).await.unwrap(), Some(50));
}

#[tokio::test]
async fn write_failures_are_swallowed() {
    let (store, views) = accounting();
    let post = store.insert_post(Post::new("p", "body").published());
    store.set_writes_available(false);

    let token = views.record_view_on(post, VisitorToken::default(), day()).await;

    assert!(token.contains(post));
    assert_eq!(store.post(post).unwrap().views, 0);
    store.set_writes_available(true);
    assert_eq!(store.daily_views(day()).await.unwrap(), None);
}

#[tokio::test]
async fn hidden_post_views_do_not_touch_daily_total() {
    let (store, views) = accounting();
    let draft = store.insert_post(Post::new("draft", "body"));

    views.record_view_on(draft, VisitorToken::default(), day()).await;
    views.record_view_on(Uuid::new_v4(), VisitorToken::default(), day()).await;

    assert_eq!(store.post(draft).unwrap().views, 0);
    assert_eq!(store.daily_views(day()).await.unwrap(), None);
}

#[tokio::test]
async fn record_view_uses_today() {
    let (store, views) = accounting();
    let post = store.insert_post(Post::new("p", "body").published());

    views.record_view(post, VisitorToken::default()).await;

    let today = chrono::Utc::now().date_naive();
    let counted = store.daily_views(today).await.unwrap().unwrap_or(0)
        + store
            .daily_views(today.pred_opt().unwrap())
            .await
            .unwrap()
            .unwrap_or(0);
    assert_eq!(counted, 1);
}
