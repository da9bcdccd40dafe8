use {
    crate::kernel::entities::{
        AuctionId,
        BidId,
        DealerId,
    },
    time::OffsetDateTime,
    uuid::Uuid,
};

/// A committed bid. Created by admission only and immutable afterwards.
#[derive(Clone, Debug)]
pub struct Bid {
    pub id:              BidId,
    pub auction_id:      AuctionId,
    pub dealer_id:       DealerId,
    pub amount:          i64,
    /// Globally unique across all bids, never reused.
    pub idempotency_key: String,
    pub creation_time:   OffsetDateTime,
}

impl Bid {
    pub fn new(
        auction_id: AuctionId,
        dealer_id: DealerId,
        amount: i64,
        idempotency_key: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            auction_id,
            dealer_id,
            amount,
            idempotency_key,
            creation_time: OffsetDateTime::now_utc(),
        }
    }
}

/// Terminal outcome of one admission that passed validation. `Duplicate` is a
/// successful no-op, not an error: the submission was applied before.
#[derive(Clone, Debug)]
pub enum AdmissionOutcome {
    Accepted { bid: Bid },
    Duplicate,
}
