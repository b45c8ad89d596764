// src/wallet/services/mod.rs

pub mod balance;
pub mod event;
pub mod fees;
pub mod schemas;
pub mod signer;
pub mod transactions;
