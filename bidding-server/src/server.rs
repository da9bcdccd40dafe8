use {
    crate::{
        api,
        api::ws::WsState,
        auction::service::{
            Config as ServiceConfig,
            Service,
        },
        config::RunOptions,
        fanout::FanoutRegistry,
        kernel::auth::HmacTokenVerifier,
        state::Store,
    },
    anyhow::{
        anyhow,
        Result,
    },
    sqlx::postgres::PgPoolOptions,
    std::{
        sync::{
            atomic::{
                AtomicBool,
                Ordering,
            },
            Arc,
        },
        time::Duration,
    },
};

pub async fn start_server(run_options: RunOptions) -> Result<()> {
    tokio::spawn(async move {
        tracing::info!("Registered shutdown signal handler...");
        tokio::signal::ctrl_c().await.unwrap();
        tracing::info!("Shut down signal received, waiting for tasks...");
        SHOULD_EXIT.store(true, Ordering::Release);
    });

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&run_options.server.database_url)
        .await
        .map_err(|err| {
            anyhow!(
                "Failed to connect to database({url}): {:?}",
                err,
                url = run_options.server.database_url
            )
        })?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let fanout = Arc::new(FanoutRegistry::new(
        run_options.server.fanout_channel_capacity,
    ));
    let auction_service = Service::new(
        Arc::new(pool),
        ServiceConfig {
            min_increment: run_options.min_bid_increment,
            lock_timeout:  Duration::from_secs(run_options.admission_lock_timeout_secs),
        },
        fanout.clone(),
    );
    let store = Arc::new(Store {
        auction_service,
        fanout,
        verifier: Arc::new(HmacTokenVerifier::new(run_options.token_secret.clone())),
        ws: WsState::new(run_options.server.requester_ip_header_name.clone()),
    });

    api::start_api(run_options, store).await
}

// A static exit flag to indicate to running threads that we're shutting down.
// This is used to gracefully shutdown the application.
//
// NOTE: A more idiomatic approach would be to use a tokio::sync::broadcast
// channel, and to send a shutdown signal to all running tasks. However, this
// is a bit more complicated to implement and we don't rely on global state
// for anything else.
pub(crate) static SHOULD_EXIT: AtomicBool = AtomicBool::new(false);
pub const EXIT_CHECK_INTERVAL: Duration = Duration::from_secs(1);
