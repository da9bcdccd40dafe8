use {
    crate::{
        auction::entities,
        kernel::entities::AuctionId,
    },
    std::{
        collections::HashMap,
        sync::Arc,
    },
    tokio::sync::Mutex,
};

mod add_auction;
mod commit_bid;
mod count_bids;
mod extend_auction;
mod find_bid_by_idempotency_key;
mod get_auction;
mod get_highest_bidder;
mod get_or_create_auction_lock;
mod list_auctions;
mod models;
mod remove_auction_lock;
mod update_auction_status;

pub use models::*;

/// Process-local state next to the durable store. The lock map is the
/// serialization point for admissions: exactly one validate-and-commit
/// sequence per auction holds its lock at a time.
#[derive(Default)]
pub struct InMemoryStore {
    auction_locks: Mutex<HashMap<AuctionId, entities::AuctionLock>>,
}

pub struct Repository {
    pub in_memory_store: InMemoryStore,
    db:                  Arc<dyn Database>,
}

impl Repository {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            in_memory_store: InMemoryStore::default(),
            db,
        }
    }
}
