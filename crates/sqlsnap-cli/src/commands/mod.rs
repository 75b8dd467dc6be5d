pub mod data;
pub mod snapshot;
