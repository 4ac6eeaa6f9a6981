use std::time::Duration;

use counseling_booking::{
    configuration::Configuration, configuration_handler::ConfigurationHandler,
    database_interface::DatabaseInterface, http::create_app, local_backend::LocalBackend,
};
use tokio::time::sleep;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let configuration = ConfigurationHandler::parse_arguments();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let address = configuration.bind_address();
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!(%address, "Counseling booking service listening");

    let app = if let Some(database_url) = configuration.database_url() {
        let backend = loop {
            match DatabaseInterface::new(&database_url) {
                Ok(backend) => {
                    info!("Successfully connected to database");
                    break backend;
                }
                Err(err) => {
                    error!(%err, "Failed to establish database connection. Retry in 1 sec. Restart without DATABASE_URL to keep bookings in memory.");
                    sleep(Duration::from_secs(1)).await;
                }
            }
        };
        create_app(backend)
    } else {
        warn!("No database configured, bookings are kept in memory");
        let backend = LocalBackend::default();
        if configuration.seed_examples() {
            if let Err(err) = backend.insert_example_counselors() {
                error!(%err, "Failed to add example counselors");
            }
        }
        create_app(backend)
    };

    axum::serve(listener, app).await
}
