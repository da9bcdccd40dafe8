use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    pub async fn find_bid_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<entities::Bid>, RestError> {
        self.db.find_bid_by_idempotency_key(idempotency_key).await
    }
}
