use {
    super::Repository,
    crate::{
        api::RestError,
        kernel::entities::AuctionId,
    },
};

impl Repository {
    pub async fn count_bids(&self, auction_id: AuctionId) -> Result<i64, RestError> {
        self.db.count_bids(auction_id).await
    }
}
