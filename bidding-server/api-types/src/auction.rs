use {
    crate::{
        AuctionId,
        DealerId,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    time::OffsetDateTime,
    utoipa::{
        ToResponse,
        ToSchema,
    },
};

/// Lifecycle state of an auction as it appears on the wire.
#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuctionStatus {
    Created,
    Live,
    Paused,
    Closed,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct CreateAuction {
    /// Descriptor of the product under the hammer.
    #[schema(example = "235/75R15 tyre lot")]
    pub product_name:   String,
    /// Price the bidding opens at, in whole currency units.
    #[schema(example = 1000)]
    pub starting_price: i64,
    /// Advertised end of the auction. Informational only: the auction closes
    /// when an administrator closes it, never by the clock alone.
    #[schema(value_type = Option<String>, example = "2026-08-05T17:00:00Z")]
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time:       Option<OffsetDateTime>,
}

#[derive(Serialize, Deserialize, ToResponse, ToSchema, Clone, Debug)]
pub struct Auction {
    #[schema(example = "obed1457-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub id:            AuctionId,
    #[schema(example = "235/75R15 tyre lot")]
    pub product_name:  String,
    #[schema(example = 1100)]
    pub current_price: i64,
    pub status:        AuctionStatus,
    #[schema(value_type = Option<String>)]
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time:      Option<OffsetDateTime>,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct ExtendAuction {
    /// Minutes to add to the auction's end time. Auctions without an end
    /// time are left untouched.
    #[schema(example = 15)]
    pub extra_minutes: i64,
}

#[derive(Serialize, Deserialize, ToResponse, ToSchema, Clone, Debug)]
pub struct AuctionStats {
    pub status:         AuctionStatus,
    #[schema(example = 1300)]
    pub current_price:  i64,
    #[schema(example = 7)]
    pub total_bids:     i64,
    /// Dealer currently holding the highest committed bid, if any.
    #[schema(value_type = Option<i64>)]
    pub highest_bidder: Option<DealerId>,
}
