use crate::configuration::Configuration;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Availability and booking service for counseling sessions")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "BOOKING_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    #[arg(short, long, env = "BOOKING_PORT", default_value_t = 3000)]
    pub port: u16,

    /// PostgreSQL connection URL. Bookings are kept in memory when omitted.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Load example counselors into the in-memory backend
    #[arg(long)]
    pub seed_examples: bool,
}

#[derive(Clone, Debug)]
pub struct ConfigurationHandler {
    args: Args,
}

impl ConfigurationHandler {
    /// Reads `.env` (if present), then the command line and environment.
    pub fn parse_arguments() -> Self {
        dotenvy::dotenv().ok();
        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> Self {
        Self { args }
    }
}

impl Configuration for ConfigurationHandler {
    fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.args.host, self.args.port)
    }

    fn database_url(&self) -> Option<String> {
        self.args
            .database_url
            .clone()
            .filter(|database_url| !database_url.trim().is_empty())
    }

    fn seed_examples(&self) -> bool {
        self.args.seed_examples
    }
}
