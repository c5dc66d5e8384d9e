//! Live profile snapshots across store handles.

use std::time::Duration;

use chrono::Utc;
use civicpulse_core::{Catalog, Config, Database, ProfileFeed};

#[tokio::test]
async fn subscriber_sees_commits_from_another_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("civicpulse.db");
    let feed = ProfileFeed::new();

    let reader = Database::open_at(&path, &Config::default()).unwrap().with_feed(feed.clone());
    let writer = Database::open_at(&path, &Config::default()).unwrap().with_feed(feed);

    let mut sub = reader.subscribe("u1").unwrap();
    assert!(sub.current().is_none());

    writer.create_profile_if_missing("u1", "", Utc::now()).unwrap();
    let created = tokio::time::timeout(Duration::from_secs(1), sub.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.engagement.points, 0);

    writer.apply_poll_vote("u1", &Catalog::builtin().polls[0], "a", Utc::now()).unwrap();
    let voted = tokio::time::timeout(Duration::from_secs(1), sub.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(voted.engagement.points, 3);
    assert_eq!(sub.current(), Some(voted));
}

#[tokio::test]
async fn cancelled_subscription_stops_receiving() {
    let db = Database::open_memory().unwrap();
    let mut sub = db.subscribe("u1").unwrap();
    sub.cancel();
    assert!(sub.is_cancelled());

    db.create_profile_if_missing("u1", "", Utc::now()).unwrap();
    assert!(sub.next().await.is_none());
    assert!(sub.current().is_none());
}
