use {
    super::Service,
    crate::{
        api::RestError,
        kernel::entities::AuctionId,
    },
    time::Duration,
};

pub struct ExtendAuctionInput {
    pub auction_id: AuctionId,
    pub extra:      Duration,
}

impl Service {
    /// Pushes the auction's end time back by `extra`, independent of status.
    /// Auctions without an end time are left untouched.
    #[tracing::instrument(skip_all, fields(auction_id = %input.auction_id))]
    pub async fn extend_auction(&self, input: ExtendAuctionInput) -> Result<(), RestError> {
        if !input.extra.is_positive() {
            return Err(RestError::BadParameters(
                "extension must be a positive duration".to_string(),
            ));
        }
        // Surfaces NotFound before the update, which cannot tell a missing
        // auction from one without an end time.
        self.repo.get_auction(input.auction_id).await?;
        self.repo.extend_auction(input.auction_id, input.extra).await
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::auction::{
            entities,
            repository::Database,
            service::tests::{
                new_test_service,
                InMemoryDatabase,
            },
        },
        std::sync::Arc,
        time::OffsetDateTime,
        uuid::Uuid,
    };

    #[tokio::test]
    async fn test_extend_auction_moves_end_time() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let end_time = OffsetDateTime::now_utc() + Duration::hours(1);
        let mut auction = entities::Auction::new("test lot".to_string(), 1000, Some(end_time));
        auction.status = entities::AuctionStatus::Live;
        db.add_auction(&auction).await.expect("seed auction");

        service
            .extend_auction(ExtendAuctionInput {
                auction_id: auction.id,
                extra:      Duration::minutes(15),
            })
            .await
            .expect("extension should succeed");

        let extended = db.get_auction(auction.id).await.expect("auction exists");
        assert_eq!(extended.end_time, Some(end_time + Duration::minutes(15)));
    }

    #[tokio::test]
    async fn test_extend_auction_without_end_time_is_noop() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let auction_id = db.seed_auction(1000, entities::AuctionStatus::Live).await;

        service
            .extend_auction(ExtendAuctionInput {
                auction_id,
                extra: Duration::minutes(15),
            })
            .await
            .expect("no-op extension should succeed");

        let auction = db.get_auction(auction_id).await.expect("auction exists");
        assert_eq!(auction.end_time, None);
    }

    #[tokio::test]
    async fn test_extend_auction_rejects_non_positive_duration() {
        let db = Arc::new(InMemoryDatabase::default());
        let service = new_test_service(db.clone());
        let auction_id = db.seed_auction(1000, entities::AuctionStatus::Live).await;

        assert!(matches!(
            service
                .extend_auction(ExtendAuctionInput {
                    auction_id,
                    extra: Duration::minutes(-5),
                })
                .await,
            Err(RestError::BadParameters(_))
        ));
    }

    #[tokio::test]
    async fn test_extend_unknown_auction() {
        let service = new_test_service(Arc::new(InMemoryDatabase::default()));
        assert!(matches!(
            service
                .extend_auction(ExtendAuctionInput {
                    auction_id: Uuid::new_v4(),
                    extra:      Duration::minutes(15),
                })
                .await,
            Err(RestError::AuctionNotFound)
        ));
    }
}
