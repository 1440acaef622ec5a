pub mod download;
pub mod markets;
pub mod setup;
pub mod ui;
