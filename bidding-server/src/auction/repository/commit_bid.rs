use {
    super::{
        CommitOutcome,
        Repository,
    },
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    /// Persists the bid and the new auction price in one transaction. Must
    /// only be called while holding the auction's admission lock.
    pub async fn commit_bid(&self, bid: &entities::Bid) -> Result<CommitOutcome, RestError> {
        self.db.commit_bid(bid).await
    }
}
