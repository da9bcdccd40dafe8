use {
    super::RestError,
    crate::{
        auction::service::get_auction_by_id::GetAuctionByIdInput,
        kernel::entities::AuctionId,
        state::Store,
    },
    axum::{
        extract::{
            Path,
            State,
        },
        Json,
    },
    bidding_api_types::{
        auction::Auction,
        ErrorBodyResponse,
    },
    std::sync::Arc,
};

/// Query a single auction.
#[utoipa::path(get, path = "/v1/auctions/{auction_id}",
    params(("auction_id" = String, Path, description = "Auction id to query for")),
    responses(
    (status = 200, description = "The auction", body = Auction),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
),)]
pub async fn get_auction(
    State(store): State<Arc<Store>>,
    Path(auction_id): Path<AuctionId>,
) -> Result<Json<Auction>, RestError> {
    let auction = store
        .auction_service
        .get_auction_by_id(GetAuctionByIdInput { auction_id })
        .await?;
    Ok(Json(auction.into()))
}

/// List all auctions.
#[utoipa::path(get, path = "/v1/auctions", responses(
    (status = 200, description = "All auctions, oldest first", body = Vec<Auction>),
),)]
pub async fn get_auctions(
    State(store): State<Arc<Store>>,
) -> Result<Json<Vec<Auction>>, RestError> {
    let auctions = store.auction_service.list_auctions().await?;
    Ok(Json(auctions.into_iter().map(Into::into).collect()))
}
