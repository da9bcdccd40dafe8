use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Service {
    pub async fn list_auctions(&self) -> Result<Vec<entities::Auction>, RestError> {
        self.repo.list_auctions().await
    }
}
