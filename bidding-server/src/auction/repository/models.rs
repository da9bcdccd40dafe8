#[cfg(test)]
use mockall::automock;
use {
    super::entities,
    crate::{
        api::RestError,
        kernel::{
            db::DB,
            entities::{
                AuctionId,
                DealerId,
            },
        },
    },
    axum::async_trait,
    sqlx::FromRow,
    time::{
        Duration,
        PrimitiveDateTime,
        UtcOffset,
    },
    tracing::instrument,
    uuid::Uuid,
};

fn to_primitive(t: time::OffsetDateTime) -> PrimitiveDateTime {
    PrimitiveDateTime::new(t.date(), t.time())
}

#[derive(Clone, FromRow, Debug)]
pub struct Auction {
    pub id:            Uuid,
    pub product_name:  String,
    pub current_price: i64,
    pub status:        entities::AuctionStatus,
    pub end_time:      Option<PrimitiveDateTime>,
    pub creation_time: PrimitiveDateTime,
}

impl Auction {
    pub fn get_auction_entity(&self) -> entities::Auction {
        entities::Auction {
            id:            self.id,
            product_name:  self.product_name.clone(),
            current_price: self.current_price,
            status:        self.status,
            end_time:      self.end_time.map(|t| t.assume_offset(UtcOffset::UTC)),
            creation_time: self.creation_time.assume_offset(UtcOffset::UTC),
        }
    }
}

#[derive(Clone, FromRow, Debug)]
pub struct Bid {
    pub id:              Uuid,
    pub auction_id:      Uuid,
    pub dealer_id:       i64,
    pub amount:          i64,
    pub idempotency_key: String,
    pub creation_time:   PrimitiveDateTime,
}

impl Bid {
    pub fn new(bid: &entities::Bid) -> Self {
        Self {
            id:              bid.id,
            auction_id:      bid.auction_id,
            dealer_id:       bid.dealer_id,
            amount:          bid.amount,
            idempotency_key: bid.idempotency_key.clone(),
            creation_time:   to_primitive(bid.creation_time),
        }
    }

    pub fn get_bid_entity(&self) -> entities::Bid {
        entities::Bid {
            id:              self.id,
            auction_id:      self.auction_id,
            dealer_id:       self.dealer_id,
            amount:          self.amount,
            idempotency_key: self.idempotency_key.clone(),
            creation_time:   self.creation_time.assume_offset(UtcOffset::UTC),
        }
    }
}

/// Result of the transactional bid commit. A unique-constraint hit on the
/// idempotency key rolls the whole transaction back and reports
/// `DuplicateKey` instead of surfacing a storage error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    DuplicateKey,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Send + Sync + 'static {
    async fn add_auction(&self, auction: &entities::Auction) -> Result<(), RestError>;
    async fn get_auction(&self, auction_id: AuctionId) -> Result<entities::Auction, RestError>;
    async fn list_auctions(&self) -> Result<Vec<entities::Auction>, RestError>;
    async fn update_auction_status(
        &self,
        auction_id: AuctionId,
        status: entities::AuctionStatus,
    ) -> Result<(), RestError>;
    async fn extend_auction(&self, auction_id: AuctionId, extra: Duration)
        -> Result<(), RestError>;
    async fn find_bid_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<entities::Bid>, RestError>;
    async fn commit_bid(&self, bid: &entities::Bid) -> Result<CommitOutcome, RestError>;
    async fn count_bids(&self, auction_id: AuctionId) -> Result<i64, RestError>;
    async fn get_highest_bidder(
        &self,
        auction_id: AuctionId,
    ) -> Result<Option<DealerId>, RestError>;
}

#[async_trait]
impl Database for DB {
    #[instrument(
        target = "metrics",
        name = "db_add_auction",
        fields(category = "db_queries", result = "success", name = "add_auction"),
        skip_all
    )]
    async fn add_auction(&self, auction: &entities::Auction) -> Result<(), RestError> {
        sqlx::query(
            "INSERT INTO auction (id, product_name, current_price, status, end_time, creation_time) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(auction.id)
        .bind(&auction.product_name)
        .bind(auction.current_price)
        .bind(auction.status)
        .bind(auction.end_time.map(to_primitive))
        .bind(to_primitive(auction.creation_time))
        .execute(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), auction_id = %auction.id, "DB: Failed to insert auction");
            RestError::TemporarilyUnavailable
        })?;
        Ok(())
    }

    #[instrument(
        target = "metrics",
        name = "db_get_auction",
        fields(category = "db_queries", result = "success", name = "get_auction"),
        skip_all
    )]
    async fn get_auction(&self, auction_id: AuctionId) -> Result<entities::Auction, RestError> {
        let auction: Auction = sqlx::query_as("SELECT * FROM auction WHERE id = $1")
            .bind(auction_id)
            .fetch_one(self)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => RestError::AuctionNotFound,
                _ => {
                    tracing::Span::current().record("result", "error");
                    tracing::error!(
                        error = e.to_string(),
                        auction_id = %auction_id,
                        "DB: Failed to get auction"
                    );
                    RestError::TemporarilyUnavailable
                }
            })?;
        Ok(auction.get_auction_entity())
    }

    #[instrument(
        target = "metrics",
        name = "db_list_auctions",
        fields(category = "db_queries", result = "success", name = "list_auctions"),
        skip_all
    )]
    async fn list_auctions(&self) -> Result<Vec<entities::Auction>, RestError> {
        let auctions: Vec<Auction> =
            sqlx::query_as("SELECT * FROM auction ORDER BY creation_time")
                .fetch_all(self)
                .await
                .map_err(|e| {
                    tracing::Span::current().record("result", "error");
                    tracing::error!(error = e.to_string(), "DB: Failed to list auctions");
                    RestError::TemporarilyUnavailable
                })?;
        Ok(auctions.iter().map(Auction::get_auction_entity).collect())
    }

    #[instrument(
        target = "metrics",
        name = "db_update_auction_status",
        fields(category = "db_queries", result = "success", name = "update_auction_status"),
        skip_all
    )]
    async fn update_auction_status(
        &self,
        auction_id: AuctionId,
        status: entities::AuctionStatus,
    ) -> Result<(), RestError> {
        let result = sqlx::query("UPDATE auction SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(auction_id)
            .execute(self)
            .await
            .map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(
                    error = e.to_string(),
                    auction_id = %auction_id,
                    "DB: Failed to update auction status"
                );
                RestError::TemporarilyUnavailable
            })?;
        if result.rows_affected() == 0 {
            return Err(RestError::AuctionNotFound);
        }
        Ok(())
    }

    #[instrument(
        target = "metrics",
        name = "db_extend_auction",
        fields(category = "db_queries", result = "success", name = "extend_auction"),
        skip_all
    )]
    async fn extend_auction(
        &self,
        auction_id: AuctionId,
        extra: Duration,
    ) -> Result<(), RestError> {
        // Auctions without an end time are deliberately left untouched.
        sqlx::query(
            "UPDATE auction SET end_time = end_time + ($1::double precision * interval '1 second') WHERE id = $2 AND end_time IS NOT NULL",
        )
        .bind(extra.as_seconds_f64())
        .bind(auction_id)
        .execute(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(
                error = e.to_string(),
                auction_id = %auction_id,
                "DB: Failed to extend auction"
            );
            RestError::TemporarilyUnavailable
        })?;
        Ok(())
    }

    #[instrument(
        target = "metrics",
        name = "db_find_bid_by_idempotency_key",
        fields(
            category = "db_queries",
            result = "success",
            name = "find_bid_by_idempotency_key"
        ),
        skip_all
    )]
    async fn find_bid_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<entities::Bid>, RestError> {
        let bid: Option<Bid> = sqlx::query_as("SELECT * FROM bid WHERE idempotency_key = $1")
            .bind(idempotency_key)
            .fetch_optional(self)
            .await
            .map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(error = e.to_string(), "DB: Failed to look up idempotency key");
                RestError::TemporarilyUnavailable
            })?;
        Ok(bid.map(|bid| bid.get_bid_entity()))
    }

    #[instrument(
        target = "metrics",
        name = "db_commit_bid",
        fields(category = "db_queries", result = "success", name = "commit_bid"),
        skip_all
    )]
    async fn commit_bid(&self, bid: &entities::Bid) -> Result<CommitOutcome, RestError> {
        let bid_model = Bid::new(bid);
        let mut tx = self.begin().await.map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), "DB: Failed to begin bid transaction");
            RestError::TemporarilyUnavailable
        })?;

        let inserted = sqlx::query(
            "INSERT INTO bid (id, auction_id, dealer_id, amount, idempotency_key, creation_time) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(bid_model.id)
        .bind(bid_model.auction_id)
        .bind(bid_model.dealer_id)
        .bind(bid_model.amount)
        .bind(&bid_model.idempotency_key)
        .bind(bid_model.creation_time)
        .execute(&mut *tx)
        .await;

        match inserted {
            Err(sqlx::Error::Database(db_error)) if db_error.is_unique_violation() => {
                // The same key was committed between the idempotency check
                // and this insert. Roll back and report the duplicate.
                if let Err(e) = tx.rollback().await {
                    tracing::warn!(error = e.to_string(), "DB: Failed to roll back duplicate bid");
                }
                return Ok(CommitOutcome::DuplicateKey);
            }
            Err(e) => {
                tracing::Span::current().record("result", "error");
                tracing::error!(error = e.to_string(), bid = ?bid_model, "DB: Failed to insert bid");
                return Err(RestError::TemporarilyUnavailable);
            }
            Ok(_) => {}
        }

        sqlx::query("UPDATE auction SET current_price = $1 WHERE id = $2")
            .bind(bid.amount)
            .bind(bid.auction_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(
                    error = e.to_string(),
                    auction_id = %bid.auction_id,
                    "DB: Failed to update auction price"
                );
                RestError::TemporarilyUnavailable
            })?;

        tx.commit().await.map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), "DB: Failed to commit bid transaction");
            RestError::TemporarilyUnavailable
        })?;
        Ok(CommitOutcome::Committed)
    }

    #[instrument(
        target = "metrics",
        name = "db_count_bids",
        fields(category = "db_queries", result = "success", name = "count_bids"),
        skip_all
    )]
    async fn count_bids(&self, auction_id: AuctionId) -> Result<i64, RestError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM bid WHERE auction_id = $1")
            .bind(auction_id)
            .fetch_one(self)
            .await
            .map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(
                    error = e.to_string(),
                    auction_id = %auction_id,
                    "DB: Failed to count bids"
                );
                RestError::TemporarilyUnavailable
            })
    }

    #[instrument(
        target = "metrics",
        name = "db_get_highest_bidder",
        fields(category = "db_queries", result = "success", name = "get_highest_bidder"),
        skip_all
    )]
    async fn get_highest_bidder(
        &self,
        auction_id: AuctionId,
    ) -> Result<Option<DealerId>, RestError> {
        sqlx::query_scalar(
            "SELECT dealer_id FROM bid WHERE auction_id = $1 ORDER BY amount DESC LIMIT 1",
        )
        .bind(auction_id)
        .fetch_optional(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(
                error = e.to_string(),
                auction_id = %auction_id,
                "DB: Failed to get highest bidder"
            );
            RestError::TemporarilyUnavailable
        })
    }
}
