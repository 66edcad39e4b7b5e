/// Remote tagging backend abstraction and its HTTP implementation.
pub mod backend;
/// Errors shared by backend implementations.
pub mod error;
/// Wire models exchanged with the scoring backend.
pub mod models;
