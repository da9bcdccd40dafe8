use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::{
            AuctionId,
            DealerId,
        },
    },
};

pub struct GetAuctionStatsInput {
    pub auction_id: AuctionId,
}

pub struct AuctionStats {
    pub status:         entities::AuctionStatus,
    pub current_price:  i64,
    pub total_bids:     i64,
    pub highest_bidder: Option<DealerId>,
}

impl Service {
    pub async fn get_auction_stats(
        &self,
        input: GetAuctionStatsInput,
    ) -> Result<AuctionStats, RestError> {
        let auction = self.repo.get_auction(input.auction_id).await?;
        let total_bids = self.repo.count_bids(input.auction_id).await?;
        let highest_bidder = self.repo.get_highest_bidder(input.auction_id).await?;
        Ok(AuctionStats {
            status: auction.status,
            current_price: auction.current_price,
            total_bids,
            highest_bidder,
        })
    }
}
