use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::AuctionId,
    },
};

impl Repository {
    pub async fn get_auction(&self, auction_id: AuctionId) -> Result<entities::Auction, RestError> {
        self.db.get_auction(auction_id).await
    }
}
