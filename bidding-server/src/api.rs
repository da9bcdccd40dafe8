use {
    crate::{
        auction::entities,
        config::RunOptions,
        kernel::{
            auth::Claims,
            entities::Role,
        },
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
        state::Store,
    },
    anyhow::Result,
    axum::{
        async_trait,
        extract::FromRequestParts,
        http::{
            request::Parts,
            StatusCode,
        },
        response::{
            IntoResponse,
            Response,
        },
        routing::{
            get,
            post,
        },
        Json,
        Router,
    },
    axum_extra::{
        headers::{
            authorization::Bearer,
            Authorization,
        },
        TypedHeader,
    },
    bidding_api_types::{
        auction::{
            Auction,
            AuctionStats,
            AuctionStatus,
            CreateAuction,
            ExtendAuction,
        },
        bid::{
            BidAdmissionStatus,
            BidCreate,
            BidResult,
        },
        ws::PriceUpdate,
        ErrorBodyResponse,
        Route,
    },
    clap::crate_version,
    std::sync::{
        atomic::Ordering,
        Arc,
    },
    tower_http::cors::CorsLayer,
    utoipa::OpenApi,
    utoipa_redoc::{
        Redoc,
        Servable,
    },
};

pub(crate) mod admin;
pub(crate) mod auction;
pub(crate) mod bid;
pub(crate) mod ws;

async fn root() -> String {
    format!("Live Bidding Server API {}", crate_version!())
}

pub async fn live() -> Response {
    (StatusCode::OK, "OK").into_response()
}

#[derive(Debug)]
pub enum RestError {
    /// The request contained invalid parameters
    BadParameters(String),
    /// The bid amount is zero or negative
    InvalidBidAmount,
    /// The auction was not found
    AuctionNotFound,
    /// Bids are only admitted while the auction is live
    AuctionNotLive,
    /// The bid does not exceed the auction's current price
    BidTooLow,
    /// The bid beats the current price by less than the minimum increment
    IncrementTooSmall { minimum: i64 },
    /// The requested lifecycle change is not an edge of the state machine
    InvalidTransition(entities::InvalidTransition),
    /// The credentials are missing, invalid or expired
    Unauthorized,
    /// The caller lacks the role required for this operation
    Forbidden,
    /// The requester IP has too many open websocket connections
    TooManyOpenWebsocketConnections,
    /// A transient storage failure; safe to retry with the same key
    TemporarilyUnavailable,
}

impl RestError {
    pub fn to_status_and_message(&self) -> (StatusCode, String) {
        match self {
            RestError::BadParameters(msg) => {
                (StatusCode::BAD_REQUEST, format!("Bad parameters: {}", msg))
            }
            RestError::InvalidBidAmount => {
                (StatusCode::BAD_REQUEST, "Invalid bid amount".to_string())
            }
            RestError::AuctionNotFound => (
                StatusCode::NOT_FOUND,
                "Auction with the specified id was not found".to_string(),
            ),
            RestError::AuctionNotLive => {
                (StatusCode::BAD_REQUEST, "Auction is not live".to_string())
            }
            RestError::BidTooLow => (
                StatusCode::BAD_REQUEST,
                "Bid does not exceed the current price".to_string(),
            ),
            RestError::IncrementTooSmall { minimum } => (
                StatusCode::BAD_REQUEST,
                format!("Bid increment too small, minimum acceptable bid is {}", minimum),
            ),
            RestError::InvalidTransition(transition) => (
                StatusCode::CONFLICT,
                format!(
                    "Invalid transition from {} to {}",
                    transition.from, transition.requested
                ),
            ),
            RestError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Invalid or expired credentials".to_string(),
            ),
            RestError::Forbidden => (StatusCode::FORBIDDEN, "Only admin allowed".to_string()),
            RestError::TooManyOpenWebsocketConnections => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many open websocket connections".to_string(),
            ),
            RestError::TemporarilyUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "This service is temporarily unavailable".to_string(),
            ),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let (status, msg) = self.to_status_and_message();
        (status, Json(ErrorBodyResponse { error: msg })).into_response()
    }
}

/// Verified caller identity, extracted from the Bearer header on every
/// authenticated route.
pub struct Auth {
    pub claims: Claims,
}

impl Auth {
    pub fn require_admin(&self) -> Result<(), RestError> {
        if self.claims.role == Role::Admin {
            Ok(())
        } else {
            Err(RestError::Forbidden)
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<Store>> for Auth {
    type Rejection = RestError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<Store>,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| RestError::Unauthorized)?;
        let claims = state.verifier.verify(bearer.token()).await?;
        Ok(Self { claims })
    }
}

pub async fn start_api(run_options: RunOptions, store: Arc<Store>) -> Result<()> {
    // Make sure functions included in the paths section have distinct names,
    // otherwise some api generators will fail
    #[derive(OpenApi)]
    #[openapi(
    paths(
    bid::post_bid,
    auction::get_auction,
    auction::get_auctions,
    admin::post_auction,
    admin::start_auction,
    admin::pause_auction,
    admin::resume_auction,
    admin::close_auction,
    admin::extend_auction,
    admin::auction_stats,
    ),
    components(
    schemas(
    Auction,
    AuctionStats,
    AuctionStatus,
    BidAdmissionStatus,
    BidCreate,
    BidResult,
    CreateAuction,
    ErrorBodyResponse,
    ExtendAuction,
    PriceUpdate,
    ),
    responses(
    ErrorBodyResponse,
    ),
    ),
    tags(
    (name = "Live Bidding Server", description = "The bidding server admits dealer bids against live auctions, \
    one committed price history per auction, and fans every accepted bid out to all connected viewers in real time.")
    )
    )]
    struct ApiDoc;

    let auction_routes = Router::new()
        .route("/", post(admin::post_auction).get(auction::get_auctions))
        .route("/:auction_id", get(auction::get_auction))
        .route("/:auction_id/start", post(admin::start_auction))
        .route("/:auction_id/pause", post(admin::pause_auction))
        .route("/:auction_id/resume", post(admin::resume_auction))
        .route("/:auction_id/close", post(admin::close_auction))
        .route("/:auction_id/extend", post(admin::extend_auction))
        .route("/:auction_id/stats", get(admin::auction_stats))
        .route("/:auction_id/ws", get(ws::ws_route_handler));
    let bid_routes = Router::new().route("/", post(bid::post_bid));

    let v1_routes = Router::new().nest(
        Route::V1.as_ref(),
        Router::new()
            .nest(Route::Auctions.as_ref(), auction_routes)
            .nest(Route::Bids.as_ref(), bid_routes),
    );

    let app: Router<()> = Router::new()
        .merge(Redoc::with_url(Route::Docs.as_ref(), ApiDoc::openapi()))
        .merge(v1_routes)
        .route(Route::Root.as_ref(), get(root))
        .route(Route::Liveness.as_ref(), get(live))
        .layer(CorsLayer::permissive())
        .with_state(store);

    let listener = tokio::net::TcpListener::bind(&run_options.server.listen_addr).await?;
    tracing::info!(address = %run_options.server.listen_addr, "Starting server...");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            while !SHOULD_EXIT.load(Ordering::Acquire) {
                tokio::time::sleep(EXIT_CHECK_INTERVAL).await;
            }
            tracing::info!("Shutting down RPC server...");
        })
        .await?;
    Ok(())
}
