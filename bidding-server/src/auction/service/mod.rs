use {
    super::repository::{
        Database,
        Repository,
    },
    crate::fanout::FanoutRegistry,
    std::{
        sync::Arc,
        time::Duration,
    },
};

pub mod admit_bid;
pub mod create_auction;
pub mod extend_auction;
pub mod get_auction_by_id;
pub mod get_auction_stats;
pub mod list_auctions;
pub mod transition_auction;

/// Tunables of the admission path.
pub struct Config {
    /// Minimum amount by which a bid must exceed the current price.
    pub min_increment: i64,
    /// How long an admission may wait for the auction's lock before failing
    /// with a retryable error.
    pub lock_timeout:  Duration,
}

pub struct ServiceInner {
    config: Config,
    repo:   Arc<Repository>,
    fanout: Arc<FanoutRegistry>,
}

#[derive(Clone)]
pub struct Service(Arc<ServiceInner>);
impl std::ops::Deref for Service {
    type Target = ServiceInner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Service {
    pub fn new(db: Arc<dyn Database>, config: Config, fanout: Arc<FanoutRegistry>) -> Self {
        Self(Arc::new(ServiceInner {
            config,
            repo: Arc::new(Repository::new(db)),
            fanout,
        }))
    }
}
