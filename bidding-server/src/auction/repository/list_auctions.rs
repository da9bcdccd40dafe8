use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    pub async fn list_auctions(&self) -> Result<Vec<entities::Auction>, RestError> {
        self.db.list_auctions().await
    }
}
