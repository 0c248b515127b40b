pub mod mail;
pub mod store;
pub mod trips;
