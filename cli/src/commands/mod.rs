pub mod cleanup;
pub mod listing;
