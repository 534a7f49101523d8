use chrono::{TimeZone, Utc};
use diesel::connection::SimpleConnection;

use std::sync::Arc;
use std::time::Duration;

use x_client::{CountResult, Granularity, SearchOrder, Tweet, User};

use crate::*;

const HOUR: Duration = Duration::from_secs(3600);

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2026, 2, 21, 12, 0, 0).unwrap())
}

fn store(clock: &ManualClock) -> CacheStore {
    CacheStore::in_memory()
        .unwrap()
        .with_clock(Arc::new(clock.clone()))
}

fn tweet(id: u64, text: &str) -> Tweet {
    Tweet {
        id,
        text: text.to_string(),
        author_id: Some(1),
        username: "alice".to_string(),
        author_name: "Alice".to_string(),
        likes: id,
        url: format!("https://x.com/alice/status/{}", id),
        ..Default::default()
    }
}

fn user(id: u64, username: &str) -> User {
    User {
        id,
        username: username.to_string(),
        name: username.to_uppercase(),
        ..Default::default()
    }
}

#[test]
fn test_put_then_get() {
    let clock = clock();
    let mut store = store(&clock);
    let value = tweet(1, "hello");
    store.put::<Tweets>(&1, &value).unwrap();

    assert_eq!(store.get::<Tweets>(&1, HOUR).unwrap(), Lookup::Found(value));
    assert_eq!(store.get::<Tweets>(&2, HOUR).unwrap(), Lookup::Absent);
}

#[test]
fn test_last_write_wins() {
    let clock = clock();
    let mut store = store(&clock);
    store.put::<Tweets>(&1, &tweet(1, "first")).unwrap();
    store.put::<Tweets>(&1, &tweet(1, "second")).unwrap();

    let found = store.get::<Tweets>(&1, HOUR).unwrap().found().unwrap();
    assert_eq!(found.text, "second");
    assert_eq!(store.stats().unwrap().tables[0], TableStats { table: "tweets", rows: 1 });
}

#[test]
fn test_staleness_boundary() {
    let clock = clock();
    let mut store = store(&clock);
    store.put::<Tweets>(&1, &tweet(1, "hello")).unwrap();

    clock.advance(HOUR - Duration::from_millis(1));
    assert!(store.get::<Tweets>(&1, HOUR).unwrap().is_found());

    clock.advance(Duration::from_millis(1));
    assert_eq!(store.get::<Tweets>(&1, HOUR).unwrap(), Lookup::Absent);
}

#[test]
fn test_ttl_applies_retroactively() {
    let clock = clock();
    let mut store = store(&clock);
    store.put::<Tweets>(&1, &tweet(1, "hello")).unwrap();
    clock.advance(Duration::from_secs(600));

    assert!(store.get::<Tweets>(&1, HOUR).unwrap().is_found());
    assert!(!store.get::<Tweets>(&1, Duration::from_secs(300)).unwrap().is_found());
    assert!(!store.get::<Tweets>(&1, Duration::ZERO).unwrap().is_found());
    // A stale record becomes fresh again under a longer TTL
    assert!(store.get::<Tweets>(&1, HOUR).unwrap().is_found());
}

#[test]
fn test_zero_ttl_never_hits() {
    let clock = clock();
    let mut store = store(&clock);
    let counts = CountResult {
        query: "rust".to_string(),
        granularity: Granularity::Day,
        buckets: Vec::new(),
        total: 0,
    };
    store.put::<Counts>(&CountsKey::new("rust", Granularity::Day), &counts).unwrap();
    assert!(store
        .get::<Counts>(&CountsKey::new("rust", Granularity::Day), HOUR)
        .unwrap()
        .is_found());
    assert_eq!(
        store
            .get::<Counts>(&CountsKey::new("rust", Granularity::Day), Duration::ZERO)
            .unwrap(),
        Lookup::Absent
    );
}

#[test]
fn test_query_key_normalization() {
    let clock = clock();
    let mut store = store(&clock);
    let index = SearchIndex {
        query: " Rust ".to_string(),
        tweet_ids: vec![3, 2, 1],
    };
    store.put::<Searches>(&SearchKey::new(" Rust ", SearchOrder::Recency), &index).unwrap();

    let hit = store.get::<Searches>(&SearchKey::new("rust", SearchOrder::Recency), HOUR).unwrap();
    assert_eq!(hit, Lookup::Found(index));
    let other_order = store.get::<Searches>(&SearchKey::new("rust", SearchOrder::Relevancy), HOUR).unwrap();
    assert_eq!(other_order, Lookup::Absent);
}

#[test]
fn test_malformed_record_is_absent() {
    let clock = clock();
    let mut store = store(&clock);
    store.put::<Tweets>(&1, &tweet(1, "hello")).unwrap();
    store
        .conn
        .as_mut()
        .unwrap()
        .batch_execute("update tweets set data = '{not json' where cache_key = '1'")
        .unwrap();

    assert_eq!(store.get::<Tweets>(&1, HOUR).unwrap(), Lookup::Absent);
    // Rewriting repairs it
    store.put::<Tweets>(&1, &tweet(1, "hello")).unwrap();
    assert!(store.get::<Tweets>(&1, HOUR).unwrap().is_found());
}

#[test]
fn test_disabled_store() {
    let mut store = CacheStore::disabled();
    assert!(!store.is_enabled());
    store.put::<Tweets>(&1, &tweet(1, "hello")).unwrap();
    store.put_user_profile(&user(1, "alice")).unwrap();

    assert_eq!(store.get::<Tweets>(&1, HOUR).unwrap(), Lookup::Absent);
    assert_eq!(store.user_by_username("alice", HOUR).unwrap(), Lookup::Absent);
    assert_eq!(store.cleanup(0).unwrap(), None);
    assert_eq!(store.footprint().unwrap(), 0);
}

#[test]
fn test_user_by_username() {
    let clock = clock();
    let mut store = store(&clock);
    let alice = user(1, "Alice");
    store.put_user_profile(&alice).unwrap();

    assert_eq!(store.user_by_username("alice", HOUR).unwrap(), Lookup::Found(alice.clone()));
    assert_eq!(store.user_by_username("ALICE", HOUR).unwrap(), Lookup::Found(alice.clone()));
    assert_eq!(store.get::<Users>(&1, HOUR).unwrap(), Lookup::Found(alice));

    clock.advance(HOUR);
    assert_eq!(store.user_by_username("alice", HOUR).unwrap(), Lookup::Absent);
}

#[test]
fn test_listing_does_not_steal_username() {
    let clock = clock();
    let mut store = store(&clock);
    store.put_user_profile(&user(1, "alice")).unwrap();
    store.put_user_listing(&[user(2, "alice"), user(3, "bob")]).unwrap();

    assert_eq!(store.user_by_username("alice", HOUR).unwrap().found().unwrap().id, 1);
    assert_eq!(store.user_by_username("bob", HOUR).unwrap().found().unwrap().id, 3);
    // The listed record itself is still cached by id
    assert!(store.get::<Users>(&2, HOUR).unwrap().is_found());
}

#[test]
fn test_listing_drops_renamed_username() {
    let clock = clock();
    let mut store = store(&clock);
    store.put_user_profile(&user(1, "alice")).unwrap();
    store.put_user_listing(&[user(1, "alice2")]).unwrap();

    assert_eq!(store.user_by_username("alice", HOUR).unwrap(), Lookup::Absent);
    let renamed = store.user_by_username("alice2", HOUR).unwrap().found().unwrap();
    assert_eq!((renamed.id, renamed.username.as_str()), (1, "alice2"));

    // The freed name can be claimed by the next listing
    store.put_user_listing(&[user(2, "alice")]).unwrap();
    assert_eq!(store.user_by_username("alice", HOUR).unwrap().found().unwrap().id, 2);
}

#[test]
fn test_username_index_checks_record() {
    let clock = clock();
    let mut store = store(&clock);
    store.put_user_profile(&user(1, "alice")).unwrap();
    // Record rewritten by id, index left behind
    store.put::<Users>(&1, &user(1, "carol")).unwrap();

    assert_eq!(store.user_by_username("alice", HOUR).unwrap(), Lookup::Absent);
}

#[test]
fn test_profile_takes_over_username() {
    let clock = clock();
    let mut store = store(&clock);
    store.put_user_profile(&user(1, "alice")).unwrap();
    // User 1 renamed, user 2 took the old name
    store.put_user_profile(&user(1, "alice_new")).unwrap();
    store.put_user_profile(&user(2, "alice")).unwrap();

    assert_eq!(store.user_by_username("alice", HOUR).unwrap().found().unwrap().id, 2);
    assert_eq!(store.user_by_username("alice_new", HOUR).unwrap().found().unwrap().id, 1);

    // And back again
    store.put_user_profile(&user(1, "alice")).unwrap();
    assert_eq!(store.user_by_username("alice", HOUR).unwrap().found().unwrap().id, 1);
    assert_eq!(store.user_by_username("alice_new", HOUR).unwrap(), Lookup::Absent);
}

#[test]
fn test_cleanup_evicts_oldest_half() {
    let dir = tempfile::tempdir().unwrap();
    let clock = clock();
    let mut store = CacheStore::open(&dir.path().join("nested").join("cache.db"))
        .unwrap()
        .with_clock(Arc::new(clock.clone()));

    for id in 1..=5 {
        store.put::<Tweets>(&id, &tweet(id, "hello")).unwrap();
        store.put_user_profile(&user(id, &format!("user{}", id))).unwrap();
        clock.advance(Duration::from_secs(1));
    }
    assert_eq!(store.cleanup(u64::MAX).unwrap(), None);

    let report = store.cleanup(0).unwrap().unwrap();
    assert!(report.footprint_before > 0);
    let removed: Vec<_> = report.removed.iter().map(|s| (s.table, s.rows)).collect();
    assert_eq!(removed, vec![("tweets", 3), ("users", 3), ("searches", 0), ("counts", 0)]);

    let long = Duration::from_secs(86_400);
    for id in 1..=3 {
        assert_eq!(store.get::<Tweets>(&id, long).unwrap(), Lookup::Absent);
    }
    for id in 4..=5 {
        assert!(store.get::<Tweets>(&id, long).unwrap().is_found());
    }
    assert_eq!(store.user_by_username("user1", long).unwrap(), Lookup::Absent);
    assert_eq!(store.user_by_username("user5", long).unwrap().found().unwrap().id, 5);

    let stats = store.stats().unwrap();
    assert_eq!(stats.tables.iter().map(|s| s.rows).sum::<i64>(), 4);
    assert!(stats.path.unwrap().ends_with("cache.db"));
}

#[test]
fn test_reopen_keeps_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");
    let clock = clock();
    {
        let mut store = CacheStore::open(&path).unwrap().with_clock(Arc::new(clock.clone()));
        store.put::<Tweets>(&7, &tweet(7, "persisted")).unwrap();
    }
    let mut store = CacheStore::open(&path).unwrap().with_clock(Arc::new(clock));
    assert_eq!(store.get::<Tweets>(&7, HOUR).unwrap().found().unwrap().text, "persisted");
}

#[test]
fn test_clear() {
    let clock = clock();
    let mut store = store(&clock);
    store
        .put_all::<Tweets, _>([(&1, &tweet(1, "a")), (&2, &tweet(2, "b"))])
        .unwrap();
    assert!(store.get::<Tweets>(&2, HOUR).unwrap().is_found());

    store.clear().unwrap();
    assert!(store.stats().unwrap().tables.iter().all(|s| s.rows == 0));
    assert_eq!(store.get::<Tweets>(&1, HOUR).unwrap(), Lookup::Absent);
}
