use clap::{
    crate_authors,
    crate_description,
    crate_name,
    crate_version,
    Args,
    Parser,
};

pub mod server;

#[derive(Parser, Debug)]
#[command(name = crate_name!())]
#[command(author = crate_authors!())]
#[command(about = crate_description!())]
#[command(version = crate_version!())]
pub enum Options {
    /// Run the bidding server service.
    Run(RunOptions),
}

#[derive(Args, Clone, Debug)]
pub struct RunOptions {
    /// Server Options
    #[command(flatten)]
    pub server: server::Options,

    /// Secret shared with the identity service, used to verify bearer and
    /// viewer tokens.
    #[arg(long = "token-secret")]
    #[arg(env = "TOKEN_SECRET")]
    pub token_secret: String,

    /// Minimum amount by which a bid must exceed the auction's current price.
    #[arg(long = "min-bid-increment")]
    #[arg(env = "MIN_BID_INCREMENT")]
    #[arg(default_value = "100")]
    pub min_bid_increment: i64,

    /// Seconds an admission may wait for an auction's lock before failing
    /// with a retryable error.
    #[arg(long = "admission-lock-timeout-secs")]
    #[arg(env = "ADMISSION_LOCK_TIMEOUT_SECS")]
    #[arg(default_value = "5")]
    pub admission_lock_timeout_secs: u64,
}
