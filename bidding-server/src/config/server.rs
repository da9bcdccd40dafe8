use {
    clap::Args,
    std::net::SocketAddr,
};

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:9000";

#[derive(Args, Clone, Debug)]
#[command(next_help_heading = "Server Options")]
#[group(id = "Server")]
pub struct Options {
    /// Address and port the server will bind to.
    #[arg(long = "listen-addr")]
    #[arg(default_value = DEFAULT_LISTEN_ADDR)]
    #[arg(env = "LISTEN_ADDR")]
    pub listen_addr: SocketAddr,

    /// database url for persistent storage.
    #[arg(long = "database-url")]
    #[arg(env = "DATABASE_URL")]
    pub database_url: String,

    /// Header carrying the real requester IP, used for the per-IP websocket
    /// connection cap.
    #[arg(long = "requester-ip-header-name")]
    #[arg(default_value = "X-Forwarded-For")]
    #[arg(env = "REQUESTER_IP_HEADER_NAME")]
    pub requester_ip_header_name: String,

    /// Number of events each fanout topic buffers for a slow viewer before
    /// that viewer is considered lagged.
    #[arg(long = "fanout-channel-capacity")]
    #[arg(default_value = "1000")]
    #[arg(env = "FANOUT_CHANNEL_CAPACITY")]
    pub fanout_channel_capacity: usize,
}
