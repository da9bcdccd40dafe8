use {
    crate::kernel::entities::AuctionId,
    std::sync::Arc,
    strum::Display,
    time::OffsetDateTime,
    tokio::sync::Mutex,
    uuid::Uuid,
};

/// Serializes admissions and lifecycle transitions for one auction. Handed
/// out by the repository; the holder may suspend while waiting for storage
/// but never across a network round trip to a viewer.
pub type AuctionLock = Arc<Mutex<()>>;

/// Lifecycle state of an auction. All transitions are administrator-driven;
/// `Closed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, sqlx::Type)]
#[sqlx(type_name = "auction_status", rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum AuctionStatus {
    Created,
    Live,
    Paused,
    Closed,
}

/// The requested lifecycle change is not an edge of the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from:      AuctionStatus,
    pub requested: AuctionStatus,
}

impl AuctionStatus {
    /// Applies an admin-requested transition.
    ///
    /// Allowed edges are start (`Created -> Live`), pause/resume
    /// (`Live <-> Paused`) and close from any non-terminal state. Everything
    /// else, including re-entering the current state, is rejected.
    pub fn transition(self, requested: AuctionStatus) -> Result<AuctionStatus, InvalidTransition> {
        use AuctionStatus::*;
        match (self, requested) {
            (Created, Live) | (Live, Paused) | (Paused, Live) => Ok(requested),
            (Created | Live | Paused, Closed) => Ok(Closed),
            (from, requested) => Err(InvalidTransition { from, requested }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Auction {
    pub id:            AuctionId,
    pub product_name:  String,
    /// Highest committed bid so far, or the starting price. Non-decreasing
    /// for the lifetime of the auction.
    pub current_price: i64,
    pub status:        AuctionStatus,
    pub end_time:      Option<OffsetDateTime>,
    pub creation_time: OffsetDateTime,
}

impl Auction {
    pub fn new(
        product_name: String,
        starting_price: i64,
        end_time: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_name,
            current_price: starting_price,
            status: AuctionStatus::Created,
            end_time,
            creation_time: OffsetDateTime::now_utc(),
        }
    }
}

impl From<AuctionStatus> for bidding_api_types::auction::AuctionStatus {
    fn from(status: AuctionStatus) -> Self {
        match status {
            AuctionStatus::Created => Self::Created,
            AuctionStatus::Live => Self::Live,
            AuctionStatus::Paused => Self::Paused,
            AuctionStatus::Closed => Self::Closed,
        }
    }
}

impl From<bidding_api_types::auction::AuctionStatus> for AuctionStatus {
    fn from(status: bidding_api_types::auction::AuctionStatus) -> Self {
        match status {
            bidding_api_types::auction::AuctionStatus::Created => Self::Created,
            bidding_api_types::auction::AuctionStatus::Live => Self::Live,
            bidding_api_types::auction::AuctionStatus::Paused => Self::Paused,
            bidding_api_types::auction::AuctionStatus::Closed => Self::Closed,
        }
    }
}

impl From<Auction> for bidding_api_types::auction::Auction {
    fn from(auction: Auction) -> Self {
        Self {
            id:            auction.id,
            product_name:  auction.product_name,
            current_price: auction.current_price,
            status:        auction.status.into(),
            end_time:      auction.end_time,
        }
    }
}
