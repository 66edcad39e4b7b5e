mod config;
mod error;
mod store;

pub use config::HttpBackendConfig;
pub use error::{HttpBackendError, HttpResult};
pub use store::HttpTaggingBackend;
