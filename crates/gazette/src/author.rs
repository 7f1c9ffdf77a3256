//! Byline resolution.
//!
//! Posts keep two author fields: `author_id`, a live reference to an admin,
//! and `author`, the name frozen when the post was written. Stores fill in
//! [`PostRecord::author_username`] with a left outer join on every read, so
//! renaming an admin changes every byline without touching post rows.

use crate::model::PostRecord;

/// The byline to show for a post.
///
/// The referenced admin's current username when `author_id` is set and the
/// admin exists; the frozen legacy name otherwise.
pub fn resolve_author(record: &PostRecord) -> &str {
    match (record.post.author_id, record.author_username.as_deref()) {
        (Some(_), Some(username)) => username,
        _ => &record.post.author,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Post;
    use uuid::Uuid;

    #[test]
    fn test_prefers_live_username() {
        let record = PostRecord {
            post: Post::new("t", "c").written_by(Some(Uuid::new_v4()), "Old Name"),
            author_username: Some("new_name".to_string()),
        };
        assert_eq!(resolve_author(&record), "new_name");
    }

    #[test]
    fn test_falls_back_when_admin_missing() {
        let record = PostRecord {
            post: Post::new("t", "c").written_by(Some(Uuid::new_v4()), "Old Name"),
            author_username: None,
        };
        assert_eq!(resolve_author(&record), "Old Name");
    }

    #[test]
    fn test_legacy_only_post() {
        let record = PostRecord {
            post: Post::new("t", "c").written_by(None, "Guest Writer"),
            author_username: None,
        };
        assert_eq!(resolve_author(&record), "Guest Writer");
    }
}
