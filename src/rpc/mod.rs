// src/rpc/mod.rs

pub mod node;
pub mod protocol;

pub use node::{ChainReader, NodeClient, RpcError};
