pub mod schedule;
pub mod sender;
pub mod sensors;
pub mod sim;
pub mod store;
pub mod transport;
