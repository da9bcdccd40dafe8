use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::AuctionId,
    },
};

pub struct TransitionAuctionInput {
    pub auction_id: AuctionId,
    pub requested:  entities::AuctionStatus,
}

impl Service {
    /// Applies an admin lifecycle transition.
    ///
    /// The transition holds the same per-auction lock as bid admission, so a
    /// status flip is never interleaved with an in-flight commit: a bid
    /// either commits before the flip or observes the new status.
    #[tracing::instrument(skip_all, fields(auction_id = %input.auction_id, requested = %input.requested))]
    pub async fn transition_auction(
        &self,
        input: TransitionAuctionInput,
    ) -> Result<entities::Auction, RestError> {
        let auction_lock = self.repo.get_or_create_auction_lock(input.auction_id).await;
        let guard = tokio::time::timeout(self.config.lock_timeout, auction_lock.lock())
            .await
            .map_err(|_| {
                tracing::warn!(auction_id = %input.auction_id, "Timed out waiting for admission lock");
                RestError::TemporarilyUnavailable
            })?;

        let mut auction = self.repo.get_auction(input.auction_id).await?;
        let next = auction
            .status
            .transition(input.requested)
            .map_err(RestError::InvalidTransition)?;
        self.repo.update_auction_status(input.auction_id, next).await?;
        auction.status = next;
        tracing::info!(auction_id = %auction.id, status = %next, "Transitioned auction");

        drop(guard);
        if next == entities::AuctionStatus::Closed {
            self.repo.remove_auction_lock(&input.auction_id).await;
        }
        Ok(auction)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::auction::{
            entities::AuctionStatus,
            repository::Database,
            service::tests::{
                new_test_service,
                InMemoryDatabase,
            },
        },
        std::{
            sync::Arc,
            time::Duration,
        },
        uuid::Uuid,
    };

    async fn transition(
        service: &Service,
        auction_id: Uuid,
        requested: AuctionStatus,
    ) -> Result<entities::Auction, RestError> {
        service
            .transition_auction(TransitionAuctionInput {
                auction_id,
                requested,
            })
            .await
    }

    #[tokio::test]
    async fn test_full_lifecycle_round_trip() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let auction_id = db.seed_auction(1000, AuctionStatus::Created).await;

        for requested in [
            AuctionStatus::Live,
            AuctionStatus::Paused,
            AuctionStatus::Live,
            AuctionStatus::Closed,
        ] {
            let auction = transition(&service, auction_id, requested)
                .await
                .expect("transition should be allowed");
            assert_eq!(auction.status, requested);
        }
    }

    #[tokio::test]
    async fn test_invalid_transition_is_rejected_and_not_persisted() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let auction_id = db.seed_auction(1000, AuctionStatus::Closed).await;

        let err = transition(&service, auction_id, AuctionStatus::Live)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RestError::InvalidTransition(entities::InvalidTransition {
                from:      AuctionStatus::Closed,
                requested: AuctionStatus::Live,
            })
        ));
        let auction = db.get_auction(auction_id).await.expect("auction exists");
        assert_eq!(auction.status, AuctionStatus::Closed);
    }

    #[tokio::test]
    async fn test_transition_unknown_auction() {
        let service = new_test_service(Arc::new(InMemoryDatabase::default()));
        assert!(matches!(
            transition(&service, Uuid::new_v4(), AuctionStatus::Live).await,
            Err(RestError::AuctionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_transition_waits_for_in_flight_admission() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let auction_id = db.seed_auction(1000, AuctionStatus::Live).await;

        // Hold the admission lock as an in-flight bid would.
        let lock = service.repo.get_or_create_auction_lock(auction_id).await;
        let held = lock.lock().await;

        let pause = {
            let service = service.clone();
            tokio::spawn(
                async move { transition(&service, auction_id, AuctionStatus::Paused).await },
            )
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!pause.is_finished());

        drop(held);
        let auction = pause
            .await
            .expect("transition task panicked")
            .expect("pause should succeed once the lock frees up");
        assert_eq!(auction.status, AuctionStatus::Paused);
    }
}
