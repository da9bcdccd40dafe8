use {
    super::Repository,
    crate::kernel::entities::AuctionId,
};

impl Repository {
    /// Reaps the admission lock of a closed auction. Safe because `Closed` is
    /// terminal: a handle obtained before removal can only guard rejections.
    pub async fn remove_auction_lock(&self, auction_id: &AuctionId) {
        self.in_memory_store
            .auction_locks
            .lock()
            .await
            .remove(auction_id);
    }
}
