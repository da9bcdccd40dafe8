use {
    crate::{
        AuctionId,
        BidId,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    utoipa::{
        ToResponse,
        ToSchema,
    },
};

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct BidCreate {
    /// The auction to bid on.
    #[schema(example = "obed1457-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub auction_id:      AuctionId,
    /// Bid amount in whole currency units. Must beat the current price by at
    /// least the server's minimum increment.
    #[schema(example = 1100)]
    pub amount:          i64,
    /// Caller-supplied key that makes the submission safe to retry. A key is
    /// never applied twice.
    #[schema(example = "dealer-42-lot-7-attempt-1")]
    pub idempotency_key: String,
}

/// How the submission terminated. `Duplicate` means the same idempotency key
/// was committed before: nothing changed and the caller must not retry.
#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BidAdmissionStatus {
    Accepted,
    Duplicate,
}

#[derive(Serialize, Deserialize, ToResponse, ToSchema, Clone, Debug)]
pub struct BidResult {
    pub status: BidAdmissionStatus,
    /// The unique id created to identify the bid. Absent on duplicate
    /// submissions.
    #[schema(example = "beedbeed-58cc-4372-a567-0e02b2c3d479", value_type = Option<String>)]
    pub id:     Option<BidId>,
    /// The auction price after this submission was committed.
    #[schema(example = 1100)]
    pub price:  Option<i64>,
}
