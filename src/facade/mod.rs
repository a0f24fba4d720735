mod config;
mod session;
mod store;

pub use config::StoreConfig;
pub use session::DocumentSession;
pub use store::DocumentStore;
