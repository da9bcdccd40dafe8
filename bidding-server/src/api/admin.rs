use {
    super::{
        Auth,
        RestError,
    },
    crate::{
        auction::{
            entities,
            service::{
                create_auction::CreateAuctionInput,
                extend_auction::ExtendAuctionInput,
                get_auction_by_id::GetAuctionByIdInput,
                get_auction_stats::GetAuctionStatsInput,
                transition_auction::TransitionAuctionInput,
            },
        },
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
        auction::{
            Auction,
            AuctionStats,
            CreateAuction,
            ExtendAuction,
        },
        ErrorBodyResponse,
    },
    std::sync::Arc,
    time::Duration,
};

/// Create an auction.
///
/// The auction starts out in the `CREATED` state and admits no bids until an
/// administrator starts it.
#[utoipa::path(post, path = "/v1/auctions", request_body = CreateAuction, responses(
    (status = 200, description = "The created auction", body = Auction),
    (status = 400, response = ErrorBodyResponse),
    (status = 403, description = "Caller is not an admin", body = ErrorBodyResponse),
),)]
pub async fn post_auction(
    auth: Auth,
    State(store): State<Arc<Store>>,
    Json(auction): Json<CreateAuction>,
) -> Result<Json<Auction>, RestError> {
    auth.require_admin()?;
    let auction = store
        .auction_service
        .create_auction(CreateAuctionInput {
            product_name:   auction.product_name,
            starting_price: auction.starting_price,
            end_time:       auction.end_time,
        })
        .await?;
    Ok(Json(auction.into()))
}

async fn transition(
    store: Arc<Store>,
    auction_id: AuctionId,
    requested: entities::AuctionStatus,
) -> Result<Json<Auction>, RestError> {
    let auction = store
        .auction_service
        .transition_auction(TransitionAuctionInput {
            auction_id,
            requested,
        })
        .await?;
    Ok(Json(auction.into()))
}

/// Start an auction, opening it for bids.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/start",
    params(("auction_id" = String, Path, description = "Auction id to start")),
    responses(
    (status = 200, description = "The started auction", body = Auction),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
    (status = 409, description = "The auction cannot be started from its current state", body = ErrorBodyResponse),
),)]
pub async fn start_auction(
    auth: Auth,
    State(store): State<Arc<Store>>,
    Path(auction_id): Path<AuctionId>,
) -> Result<Json<Auction>, RestError> {
    auth.require_admin()?;
    transition(store, auction_id, entities::AuctionStatus::Live).await
}

/// Pause a live auction. Bids are rejected until it is resumed.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/pause",
    params(("auction_id" = String, Path, description = "Auction id to pause")),
    responses(
    (status = 200, description = "The paused auction", body = Auction),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
    (status = 409, description = "The auction cannot be paused from its current state", body = ErrorBodyResponse),
),)]
pub async fn pause_auction(
    auth: Auth,
    State(store): State<Arc<Store>>,
    Path(auction_id): Path<AuctionId>,
) -> Result<Json<Auction>, RestError> {
    auth.require_admin()?;
    transition(store, auction_id, entities::AuctionStatus::Paused).await
}

/// Resume a paused auction.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/resume",
    params(("auction_id" = String, Path, description = "Auction id to resume")),
    responses(
    (status = 200, description = "The resumed auction", body = Auction),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
    (status = 409, description = "The auction cannot be resumed from its current state", body = ErrorBodyResponse),
),)]
pub async fn resume_auction(
    auth: Auth,
    State(store): State<Arc<Store>>,
    Path(auction_id): Path<AuctionId>,
) -> Result<Json<Auction>, RestError> {
    auth.require_admin()?;
    transition(store, auction_id, entities::AuctionStatus::Live).await
}

/// Close an auction for good. No transition leaves the closed state.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/close",
    params(("auction_id" = String, Path, description = "Auction id to close")),
    responses(
    (status = 200, description = "The closed auction", body = Auction),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
    (status = 409, description = "The auction is already closed", body = ErrorBodyResponse),
),)]
pub async fn close_auction(
    auth: Auth,
    State(store): State<Arc<Store>>,
    Path(auction_id): Path<AuctionId>,
) -> Result<Json<Auction>, RestError> {
    auth.require_admin()?;
    transition(store, auction_id, entities::AuctionStatus::Closed).await
}

/// Push the auction's end time back.
///
/// Works in any lifecycle state. An auction without an end time is left
/// untouched.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/extend",
    params(("auction_id" = String, Path, description = "Auction id to extend")),
    request_body = ExtendAuction,
    responses(
    (status = 200, description = "The auction after the extension", body = Auction),
    (status = 400, response = ErrorBodyResponse),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
),)]
pub async fn extend_auction(
    auth: Auth,
    State(store): State<Arc<Store>>,
    Path(auction_id): Path<AuctionId>,
    Json(extension): Json<ExtendAuction>,
) -> Result<Json<Auction>, RestError> {
    auth.require_admin()?;
    store
        .auction_service
        .extend_auction(ExtendAuctionInput {
            auction_id,
            extra: Duration::minutes(extension.extra_minutes),
        })
        .await?;
    let auction = store
        .auction_service
        .get_auction_by_id(GetAuctionByIdInput { auction_id })
        .await?;
    Ok(Json(auction.into()))
}

/// Query live statistics for an auction.
#[utoipa::path(get, path = "/v1/auctions/{auction_id}/stats",
    params(("auction_id" = String, Path, description = "Auction id to query for")),
    responses(
    (status = 200, description = "Current statistics of the auction", body = AuctionStats),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
),)]
pub async fn auction_stats(
    auth: Auth,
    State(store): State<Arc<Store>>,
    Path(auction_id): Path<AuctionId>,
) -> Result<Json<AuctionStats>, RestError> {
    auth.require_admin()?;
    let stats = store
        .auction_service
        .get_auction_stats(GetAuctionStatsInput { auction_id })
        .await?;
    Ok(Json(AuctionStats {
        status:         stats.status.into(),
        current_price:  stats.current_price,
        total_bids:     stats.total_bids,
        highest_bidder: stats.highest_bidder,
    }))
}
