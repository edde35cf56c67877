pub mod client;
pub mod socket_helper;
pub mod transport;
pub mod transport_trait;
pub mod types;
