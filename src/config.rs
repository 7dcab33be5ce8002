pub mod endpoints;
pub mod makers;
