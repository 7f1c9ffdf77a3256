//! View accounting.
//!
//! A view bumps two counters: the post's own `views` column and the
//! site-wide row for the calendar day. Both are single atomic statements in
//! the store. Counting is best-effort: any write failure is logged and
//! swallowed so the page render never fails because of it.
//!
//! Duplicate views are filtered twice:
//!
//! - the visitor's [`VisitorToken`] carries a bounded buffer of recently
//!   viewed post ids (the token travels in a cookie, so the client controls
//!   it);
//! - when the token names a visitor session, [`SeenViews`] remembers
//!   (session, post, day) on the server, so discarding the buffer does not
//!   re-count a view.

use crate::store::ContentStore;
use chrono::{NaiveDate, Utc};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Default number of recent post ids a visitor token keeps.
pub const DEFAULT_RECENT_CAPACITY: usize = 50;

/// Default number of (session, post, day) entries kept server-side.
pub const DEFAULT_SEEN_CAPACITY: usize = 100_000;

/// Default lifetime of a server-side dedup entry.
pub const DEFAULT_SEEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const MAX_SESSION_LEN: usize = 64;

/// Visitor-carried dedup state.
///
/// Encodes to a cookie-safe string: `session.id,id,id` or just `id,id,id`
/// when there is no session. Parsing is lenient: malformed ids are dropped
/// and the buffer is cut down to capacity, keeping the most recent ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorToken {
    session: Option<String>,
    recent: VecDeque<Uuid>,
    capacity: usize,
}

impl VisitorToken {
    pub fn new(capacity: usize) -> Self {
        Self {
            session: None,
            recent: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// A token tied to a visitor session. Invalid session ids (empty, too
    /// long, or with characters outside `[A-Za-z0-9_-]`) are ignored.
    pub fn with_session(session: &str, capacity: usize) -> Self {
        let mut token = Self::new(capacity);
        token.session = valid_session(session).map(str::to_string);
        token
    }

    pub fn parse(raw: &str, capacity: usize) -> Self {
        let (session, ids) = match raw.split_once('.') {
            Some((session, ids)) => (valid_session(session), ids),
            None => (None, raw),
        };

        let mut token = Self::new(capacity);
        token.session = session.map(str::to_string);
        for id in ids.split(',').filter_map(|s| Uuid::parse_str(s.trim()).ok()) {
            if !token.contains(id) {
                token.remember(id);
            }
        }
        token
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn contains(&self, post_id: Uuid) -> bool {
        self.recent.contains(&post_id)
    }

    /// Recently viewed post ids, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.recent.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a post id, evicting the oldest when full.
    fn remember(&mut self, post_id: Uuid) {
        while self.recent.len() >= self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(post_id);
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl Default for VisitorToken {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_CAPACITY)
    }
}

impl fmt::Display for VisitorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(session) = &self.session {
            write!(f, "{}.", session)?;
        }
        for (i, id) in self.recent.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", id)?;
        }
        Ok(())
    }
}

fn valid_session(session: &str) -> Option<&str> {
    let ok = !session.is_empty()
        && session.len() <= MAX_SESSION_LEN
        && session
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    ok.then_some(session)
}

type SeenKey = (String, Uuid, NaiveDate);

#[derive(Default)]
struct SeenState {
    /// key -> time it was recorded
    entries: HashMap<SeenKey, Instant>,
    /// Insertion order. May hold stale keys whose entry was since replaced;
    /// those are skipped by comparing timestamps.
    order: VecDeque<(SeenKey, Instant)>,
}

/// Server-side record of which (session, post, day) views were counted.
///
/// Bounded in size (oldest entries evicted first) and in time (entries
/// expire after the TTL).
pub struct SeenViews {
    state: Mutex<SeenState>,
    capacity: usize,
    ttl: Duration,
}

impl SeenViews {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            state: Mutex::new(SeenState::default()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Record a view. Returns `true` the first time (session, post, day) is
    /// seen within the TTL, `false` for repeats.
    pub fn first_view(&self, session: &str, post_id: Uuid, day: NaiveDate) -> bool {
        self.first_view_at(session, post_id, day, Instant::now())
    }

    pub fn first_view_at(&self, session: &str, post_id: Uuid, day: NaiveDate, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let state = &mut *state;

        // Expire from the front; `order` is sorted by insertion time.
        while let Some((key, at)) = state.order.front() {
            if now.saturating_duration_since(*at) < self.ttl {
                break;
            }
            if state.entries.get(key) == Some(at) {
                state.entries.remove(key);
            }
            state.order.pop_front();
        }

        let key = (session.to_string(), post_id, day);
        if state.entries.contains_key(&key) {
            return false;
        }

        while state.entries.len() >= self.capacity {
            let Some((old_key, at)) = state.order.pop_front() else {
                break;
            };
            if state.entries.get(&old_key) == Some(&at) {
                state.entries.remove(&old_key);
            }
        }

        state.entries.insert(key.clone(), now);
        state.order.push_back((key, now));
        true
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SeenViews {
    fn default() -> Self {
        Self::new(DEFAULT_SEEN_CAPACITY, DEFAULT_SEEN_TTL)
    }
}

/// Counts post views.
pub struct ViewAccounting<S: ?Sized> {
    store: Arc<S>,
    seen: SeenViews,
}

impl<S: ContentStore + ?Sized> ViewAccounting<S> {
    pub fn new(store: Arc<S>, seen: SeenViews) -> Self {
        Self { store, seen }
    }

    /// Register a view of `post_id` today (UTC) and return the updated
    /// token. Never fails.
    pub async fn record_view(&self, post_id: Uuid, token: VisitorToken) -> VisitorToken {
        self.record_view_on(post_id, token, Utc::now().date_naive())
            .await
    }

    /// Register a view of `post_id` on `day`.
    pub async fn record_view_on(
        &self,
        post_id: Uuid,
        mut token: VisitorToken,
        day: NaiveDate,
    ) -> VisitorToken {
        if token.contains(post_id) {
            tracing::debug!(%post_id, "view already in visitor token");
            return token;
        }

        if let Some(session) = token.session()
            && !self.seen.first_view(session, post_id, day)
        {
            tracing::debug!(%post_id, session, "view already counted for this session today");
            token.remember(post_id);
            return token;
        }

        match self.store.increment_post_views(post_id).await {
            Ok(true) => {
                if let Err(e) = self.store.bump_daily_views(day).await {
                    tracing::warn!(%post_id, %day, error = %e, "failed to update daily view count");
                }
            }
            Ok(false) => {
                tracing::debug!(%post_id, "no visible post to count a view for");
            }
            Err(e) => {
                tracing::warn!(%post_id, error = %e, "failed to increment post views");
            }
        }

        token.remember(post_id);
        token
    }

    pub fn seen(&self) -> &SeenViews {
        &self.seen
    }
}
