pub mod cache;
pub mod evstats_client;
