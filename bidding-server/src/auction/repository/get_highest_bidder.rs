use {
    super::Repository,
    crate::{
        api::RestError,
        kernel::entities::{
            AuctionId,
            DealerId,
        },
    },
};

impl Repository {
    pub async fn get_highest_bidder(
        &self,
        auction_id: AuctionId,
    ) -> Result<Option<DealerId>, RestError> {
        self.db.get_highest_bidder(auction_id).await
    }
}
