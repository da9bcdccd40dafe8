use {
    super::RestError,
    crate::{
        auction::service::get_auction_by_id::GetAuctionByIdInput,
        fanout::Subscription,
        kernel::{
            auth::Claims,
            entities::AuctionId,
        },
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
        state::Store,
    },
    anyhow::{
        anyhow,
        Result,
    },
    axum::{
        extract::{
            ws::{
                close_code,
                CloseFrame,
                Message,
                WebSocket,
            },
            Path,
            Query,
            State,
            WebSocketUpgrade,
        },
        http::HeaderMap,
        response::IntoResponse,
    },
    bidding_api_types::ws::PriceUpdate,
    futures::{
        stream::{
            SplitSink,
            SplitStream,
        },
        SinkExt,
        StreamExt,
    },
    serde::Deserialize,
    std::{
        collections::{
            HashMap,
            HashSet,
        },
        net::IpAddr,
        sync::{
            atomic::{
                AtomicUsize,
                Ordering,
            },
            Arc,
        },
        time::Duration,
    },
    tokio::sync::{
        broadcast::error::RecvError,
        RwLock,
    },
};

pub struct WsState {
    pub requester_ip_header_name: String,
    subscriber_counter:           AtomicUsize,
    subscriber_per_ip:            RwLock<HashMap<IpAddr, HashSet<SubscriberId>>>,
}

const MAXIMUM_SUBSCRIBERS_PER_IP: usize = 10;

pub type SubscriberId = usize;

impl WsState {
    pub fn new(requester_ip_header_name: String) -> Self {
        Self {
            requester_ip_header_name,
            subscriber_counter: AtomicUsize::new(0),
            subscriber_per_ip: RwLock::new(HashMap::new()),
        }
    }

    /// If the specified IP address has too many open websocket connections,
    /// this function will return none. Otherwise, it will return the new
    /// subscriber id.
    pub async fn get_new_subscriber_id(&self, ip: Option<IpAddr>) -> Option<SubscriberId> {
        let id = self.subscriber_counter.fetch_add(1, Ordering::SeqCst);
        if let Some(ip) = ip {
            let mut write_guard = self.subscriber_per_ip.write().await;
            let ids = write_guard.entry(ip).or_insert_with(HashSet::new);
            if ids.len() >= MAXIMUM_SUBSCRIBERS_PER_IP {
                return None;
            }
            ids.insert(id);
        }
        Some(id)
    }

    pub async fn remove_subscriber(&self, id: SubscriberId, ip: Option<IpAddr>) {
        if let Some(ip) = ip {
            let mut write_guard = self.subscriber_per_ip.write().await;
            if let Some(ids) = write_guard.get_mut(&ip) {
                ids.remove(&id);
                if ids.is_empty() {
                    write_guard.remove(&ip);
                }
            }
        }
    }
}

#[derive(Deserialize)]
pub struct WsQueryParams {
    token: String,
}

pub async fn ws_route_handler(
    ws: WebSocketUpgrade,
    Path(auction_id): Path<AuctionId>,
    Query(params): Query<WsQueryParams>,
    State(store): State<Arc<Store>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let ws_state = &store.ws;
    let requester_ip = headers
        .get(ws_state.requester_ip_header_name.as_str())
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next()) // Only take the first ip if there are multiple
        .and_then(|value| value.parse().ok());

    if requester_ip.is_none() {
        tracing::warn!("Failed to get requester IP address");
    }

    match ws_state.get_new_subscriber_id(requester_ip).await {
        Some(subscriber_id) => ws.on_upgrade(move |socket| {
            viewer_session(
                socket,
                store,
                auction_id,
                params.token,
                subscriber_id,
                requester_ip,
            )
        }),
        None => RestError::TooManyOpenWebsocketConnections.into_response(),
    }
}

async fn viewer_session(
    stream: WebSocket,
    store: Arc<Store>,
    auction_id: AuctionId,
    token: String,
    subscriber_id: SubscriberId,
    requester_ip: Option<IpAddr>,
) {
    run_viewer(stream, &store, auction_id, token, subscriber_id).await;
    store.ws.remove_subscriber(subscriber_id, requester_ip).await;
}

async fn run_viewer(
    stream: WebSocket,
    store: &Arc<Store>,
    auction_id: AuctionId,
    token: String,
    subscriber_id: SubscriberId,
) {
    let (mut sender, receiver) = stream.split();

    let claims = match store.verifier.verify(&token).await {
        Ok(claims) => claims,
        Err(_) => {
            close_with_policy_violation(&mut sender, "invalid credentials").await;
            return;
        }
    };

    // Subscribing before the snapshot read bounds the race with concurrent
    // admissions to a duplicated price frame; a viewer is never left behind
    // a commit it did not see.
    let subscription = store.fanout.subscribe(auction_id);
    let auction = match store
        .auction_service
        .get_auction_by_id(GetAuctionByIdInput { auction_id })
        .await
    {
        Ok(auction) => auction,
        Err(_) => {
            close_with_policy_violation(&mut sender, "unknown auction").await;
            return;
        }
    };

    let snapshot = PriceUpdate {
        price:     auction.current_price,
        dealer_id: None,
    };
    match serde_json::to_string(&snapshot) {
        Ok(snapshot) => {
            if let Err(e) = sender.send(snapshot.into()).await {
                tracing::debug!(viewer = subscriber_id, error = ?e, "Failed to send snapshot.");
                return;
            }
        }
        Err(e) => {
            tracing::error!(error = ?e, "Failed to serialize snapshot.");
            return;
        }
    }

    let mut viewer = Viewer::new(subscriber_id, claims, subscription, receiver, sender);
    viewer.run().await;
}

async fn close_with_policy_violation(
    sender: &mut SplitSink<WebSocket, Message>,
    reason: &'static str,
) {
    let frame = CloseFrame {
        code:   close_code::POLICY,
        reason: reason.into(),
    };
    if let Err(e) = sender.send(Message::Close(Some(frame))).await {
        tracing::debug!(error = ?e, "Failed to send policy close frame.");
    }
}

/// Viewer is an actor that handles a single websocket connection. It streams
/// the auction's fanout events to the client until the client disconnects,
/// the transport fails, its credentials expire or the server shuts down.
struct Viewer {
    id:                  SubscriberId,
    closed:              bool,
    claims:              Claims,
    subscription:        Subscription,
    receiver:            SplitStream<WebSocket>,
    sender:              SplitSink<WebSocket, Message>,
    ping_interval:       tokio::time::Interval,
    exit_check_interval: tokio::time::Interval,
    responded_to_ping:   bool,
}

const PING_INTERVAL_DURATION: Duration = Duration::from_secs(30);

impl Viewer {
    fn new(
        id: SubscriberId,
        claims: Claims,
        subscription: Subscription,
        receiver: SplitStream<WebSocket>,
        sender: SplitSink<WebSocket, Message>,
    ) -> Self {
        Self {
            id,
            closed: false,
            claims,
            subscription,
            receiver,
            sender,
            ping_interval: tokio::time::interval(PING_INTERVAL_DURATION),
            exit_check_interval: tokio::time::interval(EXIT_CHECK_INTERVAL),
            // We start with true so we don't close the connection immediately
            responded_to_ping: true,
        }
    }

    async fn run(&mut self) {
        while !self.closed {
            if let Err(e) = self.handle_next().await {
                tracing::debug!(viewer = self.id, error = ?e, "Closing viewer session.");
                break;
            }
        }
        self.subscription.unsubscribe();
    }

    async fn handle_next(&mut self) -> Result<()> {
        tokio::select! {
            maybe_update = self.subscription.recv() => {
                match maybe_update {
                    Ok(update) => self.forward_update(update).await,
                    Err(RecvError::Lagged(skipped)) => {
                        // This viewer fell behind the topic buffer; it
                        // resyncs through the snapshot on reconnect.
                        Err(anyhow!("Viewer lagged {} updates behind. Closing connection.", skipped))
                    }
                    Err(RecvError::Closed) => Err(anyhow!("Fanout topic closed")),
                }
            },
            maybe_message_or_err = self.receiver.next() => {
                self.handle_client_message(
                    maybe_message_or_err.ok_or(anyhow!("Client channel is closed"))??
                ).await
            },
            _ = self.ping_interval.tick() => {
                if self.claims.is_expired() {
                    return Err(anyhow!("Credentials expired. Closing connection."));
                }
                if !self.responded_to_ping {
                    return Err(anyhow!("Viewer did not respond to ping. Closing connection."));
                }
                self.responded_to_ping = false;
                self.sender.send(Message::Ping(vec![])).await?;
                Ok(())
            },
            _ = self.exit_check_interval.tick() => {
                if SHOULD_EXIT.load(Ordering::Acquire) {
                    self.sender.close().await?;
                    self.closed = true;
                    return Err(anyhow!("Application is shutting down. Closing connection."));
                }
                Ok(())
            }
        }
    }

    async fn forward_update(&mut self, update: PriceUpdate) -> Result<()> {
        self.sender.send(serde_json::to_string(&update)?.into()).await?;
        Ok(())
    }

    async fn handle_client_message(&mut self, message: Message) -> Result<()> {
        match message {
            Message::Close(_) => {
                // Send the close message to gracefully shut down the
                // connection, otherwise the client might get an abnormal
                // websocket closure error.
                self.sender.close().await?;
                self.closed = true;
                Ok(())
            }
            Message::Ping(_) => {
                // Axum will send Pong automatically
                Ok(())
            }
            Message::Pong(_) => {
                self.responded_to_ping = true;
                Ok(())
            }
            // Viewers are read-only; anything they say is ignored.
            Message::Text(_) | Message::Binary(_) => Ok(()),
        }
    }
}
