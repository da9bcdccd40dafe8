use {
    serde::{
        Deserialize,
        Serialize,
    },
    strum::AsRefStr,
    utoipa::{
        ToResponse,
        ToSchema,
    },
    uuid::Uuid,
};

pub mod auction;
pub mod bid;
pub mod ws;

pub type AuctionId = Uuid;
pub type BidId = Uuid;

/// Dealers are owned by the external identity service; the bidding server
/// only ever sees their numeric id inside a verified token.
pub type DealerId = i64;

#[derive(ToResponse, ToSchema, Serialize, Deserialize)]
#[response(description = "An error occurred processing the request")]
pub struct ErrorBodyResponse {
    pub error: String,
}

#[derive(AsRefStr, Clone)]
#[strum(prefix = "/")]
pub enum Route {
    #[strum(serialize = "v1")]
    V1,
    #[strum(serialize = "auctions")]
    Auctions,
    #[strum(serialize = "bids")]
    Bids,
    #[strum(serialize = "")]
    Root,
    #[strum(serialize = "live")]
    Liveness,
    #[strum(serialize = "docs")]
    Docs,
}
