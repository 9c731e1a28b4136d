pub mod config;
pub mod errors;
pub mod storytag_config;
pub mod tagging;
pub mod tracker;
