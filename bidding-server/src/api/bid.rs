use {
    super::{
        Auth,
        RestError,
    },
    crate::{
        auction::{
            entities,
            service::admit_bid::AdmitBidInput,
        },
        state::Store,
    },
    axum::{
        extract::State,
        Json,
    },
    bidding_api_types::{
        bid::{
            BidAdmissionStatus,
            BidCreate,
            BidResult,
        },
        ErrorBodyResponse,
    },
    std::sync::Arc,
};

/// Submit a bid on an auction.
///
/// The submission is serialized against all other bids on the same auction,
/// validated against the auction's lifecycle state, its current price and the
/// server's minimum increment, committed, and fanned out to every connected
/// viewer. Retrying with the same idempotency key is always safe: a
/// resubmission reports `duplicate` and changes nothing.
#[utoipa::path(post, path = "/v1/bids", request_body = BidCreate, responses(
    (status = 200, description = "Bid was processed successfully", body = BidResult,
    example = json!({"status": "accepted", "id": "beedbeed-b346-4fa1-8fab-2541a9e1872d", "price": 1100})),
    (status = 400, response = ErrorBodyResponse),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
),)]
pub async fn post_bid(
    auth: Auth,
    State(store): State<Arc<Store>>,
    Json(bid): Json<BidCreate>,
) -> Result<Json<BidResult>, RestError> {
    let outcome = store
        .auction_service
        .admit_bid(AdmitBidInput {
            auction_id:      bid.auction_id,
            dealer_id:       auth.claims.subject,
            amount:          bid.amount,
            idempotency_key: bid.idempotency_key,
        })
        .await?;

    Ok(Json(match outcome {
        entities::AdmissionOutcome::Accepted { bid } => BidResult {
            status: BidAdmissionStatus::Accepted,
            id:     Some(bid.id),
            price:  Some(bid.amount),
        },
        entities::AdmissionOutcome::Duplicate => BidResult {
            status: BidAdmissionStatus::Duplicate,
            id:     None,
            price:  None,
        },
    }))
}
