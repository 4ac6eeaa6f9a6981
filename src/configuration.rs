use std::net::SocketAddr;

pub trait Configuration: Clone + Send + Sync + 'static {
    fn bind_address(&self) -> SocketAddr;
    fn database_url(&self) -> Option<String>;
    fn seed_examples(&self) -> bool;
}
