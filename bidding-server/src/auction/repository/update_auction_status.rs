use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::AuctionId,
    },
};

impl Repository {
    pub async fn update_auction_status(
        &self,
        auction_id: AuctionId,
        status: entities::AuctionStatus,
    ) -> Result<(), RestError> {
        self.db.update_auction_status(auction_id, status).await
    }
}
