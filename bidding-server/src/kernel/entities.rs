use serde::{
    Deserialize,
    Serialize,
};

pub use bidding_api_types::{
    AuctionId,
    BidId,
    DealerId,
};

/// Role carried inside a verified credential token. Dealers may bid; admins
/// additionally drive auction lifecycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Dealer,
}
