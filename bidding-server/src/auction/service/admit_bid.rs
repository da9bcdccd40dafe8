use {
    super::Service,
    crate::{
        api::RestError,
        auction::{
            entities,
            repository::CommitOutcome,
        },
        kernel::entities::{
            AuctionId,
            DealerId,
        },
    },
    bidding_api_types::ws::PriceUpdate,
};

pub struct AdmitBidInput {
    pub auction_id:      AuctionId,
    pub dealer_id:       DealerId,
    pub amount:          i64,
    pub idempotency_key: String,
}

impl Service {
    /// Runs one bid submission to a terminal outcome.
    ///
    /// Validation and the commit execute under the auction's admission lock,
    /// so committed prices for one auction form a single serial history.
    /// A key that was applied before resolves to `Duplicate` no matter what
    /// the auction looks like now: replaying a committed submission must stay
    /// a successful no-op. The fanout publish happens only after the commit
    /// is durable, and its delivery never influences the admission result.
    #[tracing::instrument(skip_all, fields(auction_id = %input.auction_id, dealer_id = input.dealer_id))]
    pub async fn admit_bid(
        &self,
        input: AdmitBidInput,
    ) -> Result<entities::AdmissionOutcome, RestError> {
        if input.amount <= 0 {
            return Err(RestError::InvalidBidAmount);
        }
        if input.idempotency_key.is_empty() {
            return Err(RestError::BadParameters(
                "idempotency_key must not be empty".to_string(),
            ));
        }

        let auction_lock = self.repo.get_or_create_auction_lock(input.auction_id).await;
        let _guard = tokio::time::timeout(self.config.lock_timeout, auction_lock.lock())
            .await
            .map_err(|_| {
                tracing::warn!(auction_id = %input.auction_id, "Timed out waiting for admission lock");
                RestError::TemporarilyUnavailable
            })?;

        let auction = self.repo.get_auction(input.auction_id).await?;
        if self
            .repo
            .find_bid_by_idempotency_key(&input.idempotency_key)
            .await?
            .is_some()
        {
            return Ok(entities::AdmissionOutcome::Duplicate);
        }
        if auction.status != entities::AuctionStatus::Live {
            return Err(RestError::AuctionNotLive);
        }
        if input.amount <= auction.current_price {
            return Err(RestError::BidTooLow);
        }
        let minimum = auction.current_price + self.config.min_increment;
        if input.amount < minimum {
            return Err(RestError::IncrementTooSmall { minimum });
        }

        let bid = entities::Bid::new(
            input.auction_id,
            input.dealer_id,
            input.amount,
            input.idempotency_key,
        );
        match self.repo.commit_bid(&bid).await? {
            CommitOutcome::DuplicateKey => Ok(entities::AdmissionOutcome::Duplicate),
            CommitOutcome::Committed => {
                let delivered = self.fanout.publish(
                    bid.auction_id,
                    PriceUpdate {
                        price:     bid.amount,
                        dealer_id: Some(bid.dealer_id),
                    },
                );
                tracing::debug!(
                    auction_id = %bid.auction_id,
                    price = bid.amount,
                    delivered,
                    "Committed bid and published price update"
                );
                Ok(entities::AdmissionOutcome::Accepted { bid })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::auction::{
            entities::{
                AdmissionOutcome,
                AuctionStatus,
            },
            repository::{
                Database,
                MockDatabase,
            },
            service::{
                tests::{
                    live_auction,
                    new_test_service,
                    new_test_service_with_config,
                    InMemoryDatabase,
                },
                Config,
            },
        },
        std::{
            sync::Arc,
            time::Duration,
        },
        tokio::time::timeout,
        uuid::Uuid,
    };

    const RECV_TIMEOUT: Duration = Duration::from_millis(50);

    fn input(auction_id: Uuid, amount: i64, idempotency_key: &str) -> AdmitBidInput {
        AdmitBidInput {
            auction_id,
            dealer_id: 7,
            amount,
            idempotency_key: idempotency_key.to_string(),
        }
    }

    #[tokio::test]
    async fn test_admit_bid_rejects_non_positive_amount() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let auction_id = live_auction(&db, 1000).await;

        for amount in [0, -1] {
            assert!(matches!(
                service.admit_bid(input(auction_id, amount, "k1")).await,
                Err(RestError::InvalidBidAmount)
            ));
        }
        assert!(db.commit_log().await.is_empty());
    }

    #[tokio::test]
    async fn test_admit_bid_rejects_empty_idempotency_key() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let auction_id = live_auction(&db, 1000).await;

        assert!(matches!(
            service.admit_bid(input(auction_id, 1100, "")).await,
            Err(RestError::BadParameters(_))
        ));
    }

    #[tokio::test]
    async fn test_admit_bid_rejects_unknown_auction() {
        let service = new_test_service(Arc::new(InMemoryDatabase::default()));
        assert!(matches!(
            service.admit_bid(input(Uuid::new_v4(), 1100, "k1")).await,
            Err(RestError::AuctionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_admit_bid_rejects_increment_below_minimum() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let auction_id = live_auction(&db, 1000).await;

        assert!(matches!(
            service.admit_bid(input(auction_id, 1050, "k1")).await,
            Err(RestError::IncrementTooSmall { minimum: 1100 })
        ));
        assert_eq!(db.current_price(auction_id).await, 1000);
    }

    #[tokio::test]
    async fn test_admit_bid_rejects_amount_not_exceeding_price() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let auction_id = live_auction(&db, 1000).await;

        for amount in [999, 1000] {
            assert!(matches!(
                service.admit_bid(input(auction_id, amount, "k1")).await,
                Err(RestError::BidTooLow)
            ));
        }
        assert_eq!(db.current_price(auction_id).await, 1000);
    }

    #[tokio::test]
    async fn test_admit_bid_accepts_and_publishes() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let auction_id = live_auction(&db, 1000).await;
        let mut subscription = service.fanout.subscribe(auction_id);

        let outcome = service
            .admit_bid(input(auction_id, 1100, "k2"))
            .await
            .expect("bid should be accepted");
        let AdmissionOutcome::Accepted { bid } = outcome else {
            panic!("expected acceptance, got {:?}", outcome);
        };
        assert_eq!(bid.amount, 1100);
        assert_eq!(db.current_price(auction_id).await, 1100);
        assert_eq!(
            subscription.recv().await,
            Ok(PriceUpdate {
                price:     1100,
                dealer_id: Some(7),
            })
        );
    }

    #[tokio::test]
    async fn test_admit_bid_resubmission_is_duplicate_noop() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let auction_id = live_auction(&db, 1000).await;

        assert!(matches!(
            service.admit_bid(input(auction_id, 1100, "k2")).await,
            Ok(AdmissionOutcome::Accepted { .. })
        ));
        let mut subscription = service.fanout.subscribe(auction_id);

        // Same key again: no second commit, no price change, no fanout event.
        assert!(matches!(
            service.admit_bid(input(auction_id, 1100, "k2")).await,
            Ok(AdmissionOutcome::Duplicate)
        ));
        assert_eq!(db.current_price(auction_id).await, 1100);
        assert_eq!(db.commit_log().await.len(), 1);
        assert!(timeout(RECV_TIMEOUT, subscription.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_admit_bid_duplicate_wins_over_later_state_changes() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let auction_id = live_auction(&db, 1000).await;

        assert!(matches!(
            service.admit_bid(input(auction_id, 1100, "k2")).await,
            Ok(AdmissionOutcome::Accepted { .. })
        ));
        db.update_auction_status(auction_id, AuctionStatus::Closed)
            .await
            .expect("auction exists");

        // Replaying the committed submission stays a successful no-op even
        // though a fresh bid would now be rejected.
        assert!(matches!(
            service.admit_bid(input(auction_id, 1100, "k2")).await,
            Ok(AdmissionOutcome::Duplicate)
        ));
    }

    #[tokio::test]
    async fn test_admit_bid_rejects_auction_not_live() {
        for status in [
            AuctionStatus::Created,
            AuctionStatus::Paused,
            AuctionStatus::Closed,
        ] {
            let db = Arc::new(InMemoryDatabase::default());
            let service = new_test_service(db.clone());
            let auction_id = db.seed_auction(1000, status).await;

            assert!(matches!(
                service.admit_bid(input(auction_id, 2000, "k3")).await,
                Err(RestError::AuctionNotLive)
            ));
            assert_eq!(db.current_price(auction_id).await, 1000);
            assert!(db.commit_log().await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_admit_bid_commit_conflict_resolves_to_duplicate() {
        let mut db = MockDatabase::new();
        let auction_id = Uuid::new_v4();
        db.expect_get_auction().returning(move |_| {
            let mut auction = entities::Auction::new("test lot".to_string(), 1000, None);
            auction.id = auction_id;
            auction.status = AuctionStatus::Live;
            Ok(auction)
        });
        // The key is free at check time but taken by the time the insert
        // lands: the constraint race must stay invisible to the caller.
        db.expect_find_bid_by_idempotency_key().returning(|_| Ok(None));
        db.expect_commit_bid()
            .returning(|_| Ok(crate::auction::repository::CommitOutcome::DuplicateKey));
        let service = new_test_service(Arc::new(db));

        assert!(matches!(
            service.admit_bid(input(auction_id, 1100, "k2")).await,
            Ok(AdmissionOutcome::Duplicate)
        ));
    }

    #[tokio::test]
    async fn test_admit_bid_lock_timeout_is_transient() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service_with_config(
            db.clone(),
            Config {
                min_increment: 100,
                lock_timeout:  Duration::from_millis(20),
            },
        );
        let auction_id = live_auction(&db, 1000).await;

        let lock = service.repo.get_or_create_auction_lock(auction_id).await;
        let _held = lock.lock().await;
        assert!(matches!(
            service.admit_bid(input(auction_id, 1100, "k1")).await,
            Err(RestError::TemporarilyUnavailable)
        ));
        assert!(db.commit_log().await.is_empty());
    }

    #[tokio::test]
    async fn test_admissions_on_other_auctions_proceed_while_one_is_locked() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let blocked = live_auction(&db, 1000).await;
        let open = live_auction(&db, 500).await;

        let lock = service.repo.get_or_create_auction_lock(blocked).await;
        let _held = lock.lock().await;
        assert!(matches!(
            service.admit_bid(input(open, 650, "k1")).await,
            Ok(AdmissionOutcome::Accepted { .. })
        ));
        assert_eq!(db.current_price(open).await, 650);
    }

    #[tokio::test]
    async fn test_concurrent_admissions_serialize_without_lost_updates() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let auction_id = live_auction(&db, 1000).await;

        let mut handles = Vec::new();
        for i in 0..8i64 {
            let service = service.clone();
            let amount = 1100 + i * 100;
            handles.push(tokio::spawn(async move {
                service
                    .admit_bid(AdmitBidInput {
                        auction_id,
                        dealer_id: i,
                        amount,
                        idempotency_key: format!("k{}", i),
                    })
                    .await
            }));
        }

        let mut accepted = Vec::new();
        for handle in handles {
            match handle.await.expect("admission task panicked") {
                Ok(AdmissionOutcome::Accepted { bid }) => accepted.push(bid.amount),
                Ok(AdmissionOutcome::Duplicate) => panic!("keys were distinct"),
                // Losers of the race may find the price has passed them by.
                Err(RestError::BidTooLow) | Err(RestError::IncrementTooSmall { .. }) => {}
                Err(e) => panic!("unexpected admission error: {:?}", e),
            }
        }

        let log = db.commit_log().await;
        assert_eq!(log.len(), accepted.len());
        assert!(!log.is_empty());
        // Every commit observed exactly the price the previous commit left
        // behind: a serial history with no interleaving and no lost updates.
        let mut expected_before = 1000;
        for record in &log {
            assert_eq!(record.price_before, expected_before);
            assert!(record.amount > record.price_before);
            expected_before = record.amount;
        }
        assert_eq!(db.current_price(auction_id).await, expected_before);
    }

    #[tokio::test]
    async fn test_concurrent_identical_resubmissions_commit_once() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let auction_id = live_auction(&db, 1000).await;

        let mut handles = Vec::new();
        for _ in 0..4 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.admit_bid(input(auction_id, 1100, "same-key")).await
            }));
        }

        let mut accepted = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.expect("admission task panicked") {
                Ok(AdmissionOutcome::Accepted { .. }) => accepted += 1,
                Ok(AdmissionOutcome::Duplicate) => duplicates += 1,
                Err(e) => panic!("unexpected admission error: {:?}", e),
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(duplicates, 3);
        assert_eq!(db.commit_log().await.len(), 1);
        assert_eq!(db.current_price(auction_id).await, 1100);
    }

    #[tokio::test]
    async fn test_sequential_admissions_produce_strictly_increasing_prices() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let auction_id = live_auction(&db, 1000).await;

        for (i, amount) in [1100, 1200, 1350, 1500].into_iter().enumerate() {
            assert!(matches!(
                service
                    .admit_bid(input(auction_id, amount, &format!("k{}", i)))
                    .await,
                Ok(AdmissionOutcome::Accepted { .. })
            ));
        }
        let prices: Vec<i64> = db.commit_log().await.iter().map(|r| r.amount).collect();
        assert_eq!(prices, vec![1100, 1200, 1350, 1500]);
        assert!(prices.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test]
    async fn test_admit_bid_delivers_one_event_per_commit_in_order() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let auction_id = live_auction(&db, 500).await;
        let mut subscription = service.fanout.subscribe(auction_id);

        for (i, amount) in [650, 800].into_iter().enumerate() {
            assert!(matches!(
                service
                    .admit_bid(input(auction_id, amount, &format!("k{}", i)))
                    .await,
                Ok(AdmissionOutcome::Accepted { .. })
            ));
        }
        for amount in [650, 800] {
            assert_eq!(
                subscription.recv().await,
                Ok(PriceUpdate {
                    price:     amount,
                    dealer_id: Some(7),
                })
            );
        }
        assert!(timeout(RECV_TIMEOUT, subscription.recv()).await.is_err());
    }
}
