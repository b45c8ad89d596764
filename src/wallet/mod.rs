// src/wallet/mod.rs

pub mod address;
pub mod approval;
pub mod client;
pub mod connection_manager;
pub mod coordinator;
pub mod models;
pub mod namespaces;
pub mod nonce_manager;
pub mod services;
pub mod session_store;
pub mod subscription;

// Re-export commonly used types
pub use connection_manager::{ConnectionManager, ConnectionState};
pub use coordinator::{FlowStatus, TransactionCoordinator};
pub use models::{Account, ChainId, FlowError, FlowPhase, Session, SessionError, TransactionStatus};
pub use session_store::{SessionSnapshot, SessionStore};
