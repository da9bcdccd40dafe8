use {
    crate::kernel::entities::AuctionId,
    bidding_api_types::ws::PriceUpdate,
    dashmap::DashMap,
    std::sync::Arc,
    tokio::sync::broadcast,
};

/// Registry of per-auction broadcast topics.
///
/// A topic is created when the first viewer subscribes and garbage-collected
/// when the last one leaves. Publishing is synchronous and never waits on a
/// subscriber: a viewer that falls more than `capacity` events behind
/// observes `Lagged` on its own receiver while everyone else keeps
/// receiving. Events published while an auction has no topic are dropped;
/// late subscribers catch up through the connection snapshot instead.
pub struct FanoutRegistry {
    topics:   DashMap<AuctionId, broadcast::Sender<PriceUpdate>>,
    capacity: usize,
}

impl FanoutRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            capacity,
        }
    }

    /// Registers a new listener on the auction's topic, creating the topic if
    /// this is its first subscriber.
    pub fn subscribe(self: &Arc<Self>, auction_id: AuctionId) -> Subscription {
        let receiver = self
            .topics
            .entry(auction_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();
        Subscription {
            auction_id,
            registry: Arc::clone(self),
            receiver: Some(receiver),
        }
    }

    /// Delivers `update` to every current subscriber of the auction and
    /// returns how many received it. Fire-and-forget: the caller's outcome
    /// never depends on delivery.
    pub fn publish(&self, auction_id: AuctionId, update: PriceUpdate) -> usize {
        let delivered = match self.topics.get(&auction_id) {
            Some(topic) => topic.send(update).unwrap_or(0),
            None => 0,
        };
        if delivered == 0 {
            self.release(auction_id);
        }
        delivered
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Drops the auction's topic if it has no subscribers left. Subscribing
    /// again later simply creates a fresh topic.
    fn release(&self, auction_id: AuctionId) {
        self.topics
            .remove_if(&auction_id, |_, topic| topic.receiver_count() == 0);
    }
}

/// Handle to one listener registration. Dropping it (or calling
/// [`Subscription::unsubscribe`], which is an idempotent no-op the second
/// time) deregisters the listener and lets the registry reap empty topics.
pub struct Subscription {
    auction_id: AuctionId,
    registry:   Arc<FanoutRegistry>,
    receiver:   Option<broadcast::Receiver<PriceUpdate>>,
}

impl Subscription {
    /// Waits for the next event on the topic, in publish order.
    pub async fn recv(&mut self) -> Result<PriceUpdate, broadcast::error::RecvError> {
        match self.receiver.as_mut() {
            Some(receiver) => receiver.recv().await,
            None => Err(broadcast::error::RecvError::Closed),
        }
    }

    pub fn unsubscribe(&mut self) {
        if let Some(receiver) = self.receiver.take() {
            drop(receiver);
            self.registry.release(self.auction_id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::time::Duration,
        tokio::time::timeout,
        uuid::Uuid,
    };

    const RECV_TIMEOUT: Duration = Duration::from_millis(50);

    fn update(price: i64) -> PriceUpdate {
        PriceUpdate {
            price,
            dealer_id: Some(7),
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_events_in_publish_order() {
        let registry = Arc::new(FanoutRegistry::new(16));
        let auction_id = Uuid::new_v4();
        let mut first = registry.subscribe(auction_id);
        let mut second = registry.subscribe(auction_id);

        for price in [1100, 1200, 1300] {
            assert_eq!(registry.publish(auction_id, update(price)), 2);
        }
        for subscription in [&mut first, &mut second] {
            for price in [1100, 1200, 1300] {
                assert_eq!(subscription.recv().await, Ok(update(price)));
            }
        }
    }

    #[tokio::test]
    async fn test_no_retroactive_delivery() {
        let registry = Arc::new(FanoutRegistry::new(16));
        let auction_id = Uuid::new_v4();
        assert_eq!(registry.publish(auction_id, update(1100)), 0);

        let mut subscription = registry.subscribe(auction_id);
        assert!(timeout(RECV_TIMEOUT, subscription.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let registry = Arc::new(FanoutRegistry::new(16));
        let watched = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut subscription = registry.subscribe(watched);

        assert_eq!(registry.publish(other, update(999)), 0);
        assert!(timeout(RECV_TIMEOUT, subscription.recv()).await.is_err());

        registry.publish(watched, update(1100));
        assert_eq!(subscription.recv().await, Ok(update(1100)));
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent_and_reaps_topic() {
        let registry = Arc::new(FanoutRegistry::new(16));
        let auction_id = Uuid::new_v4();
        let mut subscription = registry.subscribe(auction_id);
        assert_eq!(registry.topic_count(), 1);

        subscription.unsubscribe();
        subscription.unsubscribe();
        assert_eq!(registry.topic_count(), 0);
        assert!(matches!(
            subscription.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_topic_survives_until_last_subscriber_leaves() {
        let registry = Arc::new(FanoutRegistry::new(16));
        let auction_id = Uuid::new_v4();
        let first = registry.subscribe(auction_id);
        let second = registry.subscribe(auction_id);

        drop(first);
        assert_eq!(registry.topic_count(), 1);
        drop(second);
        assert_eq!(registry.topic_count(), 0);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_only_degrades_itself() {
        let registry = Arc::new(FanoutRegistry::new(2));
        let auction_id = Uuid::new_v4();
        let mut slow = registry.subscribe(auction_id);

        for price in [1100, 1200, 1300, 1400, 1500] {
            registry.publish(auction_id, update(price));
        }

        // The two most recent events survive; the overflow is reported once.
        assert!(matches!(
            slow.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
        assert_eq!(slow.recv().await, Ok(update(1400)));
        assert_eq!(slow.recv().await, Ok(update(1500)));
    }
}
