use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
    },
    time::OffsetDateTime,
};

pub struct CreateAuctionInput {
    pub product_name:   String,
    pub starting_price: i64,
    pub end_time:       Option<OffsetDateTime>,
}

impl Service {
    #[tracing::instrument(skip_all)]
    pub async fn create_auction(
        &self,
        input: CreateAuctionInput,
    ) -> Result<entities::Auction, RestError> {
        if input.product_name.is_empty() {
            return Err(RestError::BadParameters(
                "product_name must not be empty".to_string(),
            ));
        }
        if input.starting_price < 0 {
            return Err(RestError::BadParameters(
                "starting_price must not be negative".to_string(),
            ));
        }

        let auction =
            entities::Auction::new(input.product_name, input.starting_price, input.end_time);
        self.repo.add_auction(&auction).await?;
        tracing::info!(auction_id = %auction.id, "Created auction");
        Ok(auction)
    }
}
