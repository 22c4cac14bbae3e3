pub mod discord;
pub mod gateway;
