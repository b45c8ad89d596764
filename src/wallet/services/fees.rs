use serde::{Deserialize, Serialize};

use crate::wallet::services::transactions::DexCommand;

/// Fees in base units of the chain fee token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeePolicy {
    pub base_fee: u64,
    pub pool_creation_fee: u64,
    pub position_creation_fee: u64,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            base_fee: 1_000_000,
            pool_creation_fee: 0,
            position_creation_fee: 0,
        }
    }
}

impl FeePolicy {
    /// Base fee plus whatever extra the command charges.
    pub fn fee(&self, command: DexCommand) -> u64 {
        let extra = match command {
            DexCommand::CreatePool => self.pool_creation_fee,
            DexCommand::CreatePosition => self.position_creation_fee,
            DexCommand::AddLiquidity
            | DexCommand::RemoveLiquidity
            | DexCommand::SwapExactIn
            | DexCommand::VoteOnProposal => 0,
        };
        self.base_fee.saturating_add(extra)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_commands_add_their_extra_fee() {
        let policy = FeePolicy {
            base_fee: 100,
            pool_creation_fee: 5_000,
            position_creation_fee: 700,
        };
        assert_eq!(policy.fee(DexCommand::CreatePool), 5_100);
        assert_eq!(policy.fee(DexCommand::CreatePosition), 800);
        assert_eq!(policy.fee(DexCommand::SwapExactIn), 100);
    }
}
