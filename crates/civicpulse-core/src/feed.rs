//! Profile change notifications.
//!
//! Observers subscribe per identity and receive the latest committed
//! [`Profile`] snapshot. Intermediate snapshots may be skipped; the newest
//! one always arrives. The scoring engine knows nothing about this.
//!
//! A slot lives only while it has subscribers. Snapshots published for an
//! identity nobody watches are dropped, and slots left empty by cancelled
//! subscriptions are pruned, so the map is bounded by live subscriptions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::profile::Profile;

type Slot = watch::Sender<Option<Profile>>;

/// Shared hub fanning committed snapshots out to subscribers.
#[derive(Debug, Clone, Default)]
pub struct ProfileFeed {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl ProfileFeed {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Subscribe to snapshots for `uid`, starting empty unless another
    /// subscriber already holds a snapshot.
    pub fn subscribe(&self, uid: &str) -> Subscription {
        self.subscribe_from(uid, None)
    }

    /// Subscribe, seeding the slot with `initial` when it holds nothing yet.
    ///
    /// The store passes the profile it just read, so a late subscriber starts
    /// from the committed state instead of waiting for the next write.
    pub fn subscribe_from(&self, uid: &str, initial: Option<Profile>) -> Subscription {
        let mut slots = self.lock();
        slots.retain(|_, slot| slot.receiver_count() > 0);
        let slot = slots
            .entry(uid.to_string())
            .or_insert_with(|| watch::channel(None).0);
        if initial.is_some() {
            slot.send_if_modified(|current| {
                if current.is_none() {
                    *current = initial;
                    true
                } else {
                    false
                }
            });
        }
        Subscription {
            rx: Some(slot.subscribe()),
        }
    }

    /// Publish a committed snapshot. Never blocks.
    pub fn publish(&self, profile: &Profile) {
        let mut slots = self.lock();
        let Some(slot) = slots.get(&profile.uid) else {
            tracing::trace!(uid = %profile.uid, "no subscribers, snapshot dropped");
            return;
        };
        if slot.receiver_count() == 0 {
            slots.remove(&profile.uid);
            return;
        }
        slot.send_replace(Some(profile.clone()));
        tracing::trace!(uid = %profile.uid, receivers = slot.receiver_count(), "published profile snapshot");
    }

    /// Number of live subscriptions for `uid`.
    pub fn subscriber_count(&self, uid: &str) -> usize {
        self.lock().get(uid).map_or(0, |slot| slot.receiver_count())
    }

    /// Identities currently holding a slot.
    pub fn tracked_identities(&self) -> usize {
        self.lock().len()
    }
}

/// Cancellable stream of snapshots for one identity.
///
/// Dropping it cancels it.
#[derive(Debug)]
pub struct Subscription {
    rx: Option<watch::Receiver<Option<Profile>>>,
}

impl Subscription {
    /// Latest snapshot without waiting.
    pub fn current(&self) -> Option<Profile> {
        self.rx.as_ref().and_then(|rx| rx.borrow().clone())
    }

    /// Wait for the next snapshot not yet seen.
    ///
    /// Returns `None` once cancelled or when the feed is gone.
    pub async fn next(&mut self) -> Option<Profile> {
        loop {
            let rx = self.rx.as_mut()?;
            if rx.changed().await.is_err() {
                self.rx = None;
                return None;
            }
            if let Some(profile) = rx.borrow_and_update().clone() {
                return Some(profile);
            }
        }
    }

    pub fn cancel(&mut self) {
        self.rx = None;
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile(points: u32) -> Profile {
        let mut p = Profile::new("u1", "", Utc::now());
        p.engagement.points = points;
        p
    }

    #[tokio::test]
    async fn delivers_published_snapshots() {
        let feed = ProfileFeed::new();
        let mut sub = feed.subscribe("u1");
        assert!(sub.current().is_none());

        feed.publish(&profile(5));
        let got = sub.next().await.unwrap();
        assert_eq!(got.engagement.points, 5);

        feed.publish(&profile(8));
        feed.publish(&profile(11));
        let got = sub.next().await.unwrap();
        assert_eq!(got.engagement.points, 11);
    }

    #[tokio::test]
    async fn seeded_subscriber_starts_from_snapshot() {
        let feed = ProfileFeed::new();
        let mut sub = feed.subscribe_from("u1", Some(profile(3)));
        assert_eq!(sub.current().unwrap().engagement.points, 3);

        // A live slot keeps its newer value over a stale seed.
        feed.publish(&profile(7));
        let other = feed.subscribe_from("u1", Some(profile(3)));
        assert_eq!(other.current().unwrap().engagement.points, 7);
        assert_eq!(sub.next().await.unwrap().engagement.points, 7);
    }

    #[test]
    fn publish_without_subscribers_keeps_nothing() {
        let feed = ProfileFeed::new();
        for uid in ["a", "b", "c"] {
            let mut p = profile(1);
            p.uid = uid.to_string();
            feed.publish(&p);
        }
        assert_eq!(feed.tracked_identities(), 0);
        assert!(feed.subscribe("a").current().is_none());
    }

    #[test]
    fn abandoned_slots_are_pruned() {
        let feed = ProfileFeed::new();
        for i in 0..50 {
            drop(feed.subscribe(&format!("user-{i}")));
        }
        let _live = feed.subscribe("kept");
        assert_eq!(feed.tracked_identities(), 1);

        let gone = feed.subscribe("u1");
        drop(gone);
        feed.publish(&profile(2));
        assert_eq!(feed.subscriber_count("u1"), 0);
        assert_eq!(feed.tracked_identities(), 1);
    }

    #[tokio::test]
    async fn other_identities_are_not_delivered() {
        let feed = ProfileFeed::new();
        let sub = feed.subscribe("someone-else");
        feed.publish(&profile(3));
        assert!(sub.current().is_none());
    }

    #[tokio::test]
    async fn cancel_ends_the_stream() {
        let feed = ProfileFeed::new();
        let mut sub = feed.subscribe("u1");
        assert_eq!(feed.subscriber_count("u1"), 1);
        sub.cancel();
        assert!(sub.is_cancelled());
        assert!(sub.next().await.is_none());
        assert_eq!(feed.subscriber_count("u1"), 0);
    }

    #[tokio::test]
    async fn drop_unsubscribes() {
        let feed = ProfileFeed::new();
        let sub = feed.subscribe("u1");
        drop(sub);
        assert_eq!(feed.subscriber_count("u1"), 0);
        feed.publish(&profile(1));
    }
}
