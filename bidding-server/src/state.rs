use {
    crate::{
        api::ws::WsState,
        auction::service::Service,
        fanout::FanoutRegistry,
        kernel::auth::TokenVerifier,
    },
    std::sync::Arc,
};

pub struct Store {
    pub auction_service: Service,
    pub fanout:          Arc<FanoutRegistry>,
    pub verifier:        Arc<dyn TokenVerifier>,
    pub ws:              WsState,
}
