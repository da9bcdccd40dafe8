use {
    super::Repository,
    crate::{
        api::RestError,
        kernel::entities::AuctionId,
    },
    time::Duration,
};

impl Repository {
    pub async fn extend_auction(
        &self,
        auction_id: AuctionId,
        extra: Duration,
    ) -> Result<(), RestError> {
        self.db.extend_auction(auction_id, extra).await
    }
}
