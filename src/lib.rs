pub mod app;
pub mod core;
pub mod detect;
pub mod extract;
pub mod notifications;
pub mod store;
pub mod watcher;

include!(concat!(env!("OUT_DIR"), "/version.rs"));
