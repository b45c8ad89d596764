//! Lisk codec parameter schemas for DEX commands, passed to the signer so the
//! wallet can decode and display what it signs.

use lazy_static::lazy_static;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::wallet::services::transactions::DexCommand;

lazy_static! {
    static ref SCHEMAS: HashMap<DexCommand, Value> = {
        let mut schemas = HashMap::new();
        schemas.insert(
            DexCommand::CreatePool,
            json!({
                "$id": "/dex/createPool",
                "type": "object",
                "required": ["tokenID0", "tokenID1", "feeTier", "tickInitialPrice", "initialPosition", "maxTimestampValid"],
                "properties": {
                    "tokenID0": { "dataType": "bytes", "length": 8, "fieldNumber": 1 },
                    "tokenID1": { "dataType": "bytes", "length": 8, "fieldNumber": 2 },
                    "feeTier": { "dataType": "uint32", "fieldNumber": 3 },
                    "tickInitialPrice": { "dataType": "sint32", "fieldNumber": 4 },
                    "initialPosition": {
                        "type": "object",
                        "fieldNumber": 5,
                        "required": ["tickLower", "tickUpper", "amount0Desired", "amount1Desired"],
                        "properties": {
                            "tickLower": { "dataType": "sint32", "fieldNumber": 1 },
                            "tickUpper": { "dataType": "sint32", "fieldNumber": 2 },
                            "amount0Desired": { "dataType": "uint64", "fieldNumber": 3 },
                            "amount1Desired": { "dataType": "uint64", "fieldNumber": 4 }
                        }
                    },
                    "maxTimestampValid": { "dataType": "uint64", "fieldNumber": 6 }
                }
            }),
        );
        schemas.insert(
            DexCommand::CreatePosition,
            json!({
                "$id": "/dex/createPosition",
                "type": "object",
                "required": ["poolID", "tickLower", "tickUpper", "amount0Desired", "amount1Desired", "amount0Min", "amount1Min", "maxTimestampValid"],
                "properties": {
                    "poolID": { "dataType": "bytes", "fieldNumber": 1 },
                    "tickLower": { "dataType": "sint32", "fieldNumber": 2 },
                    "tickUpper": { "dataType": "sint32", "fieldNumber": 3 },
                    "amount0Desired": { "dataType": "uint64", "fieldNumber": 4 },
                    "amount1Desired": { "dataType": "uint64", "fieldNumber": 5 },
                    "amount0Min": { "dataType": "uint64", "fieldNumber": 6 },
                    "amount1Min": { "dataType": "uint64", "fieldNumber": 7 },
                    "maxTimestampValid": { "dataType": "uint64", "fieldNumber": 8 }
                }
            }),
        );
        schemas.insert(
            DexCommand::AddLiquidity,
            json!({
                "$id": "/dex/addLiquidity",
                "type": "object",
                "required": ["positionID", "amount0Desired", "amount1Desired", "amount0Min", "amount1Min", "maxTimestampValid"],
                "properties": {
                    "positionID": { "dataType": "bytes", "fieldNumber": 1 },
                    "amount0Desired": { "dataType": "uint64", "fieldNumber": 2 },
                    "amount1Desired": { "dataType": "uint64", "fieldNumber": 3 },
                    "amount0Min": { "dataType": "uint64", "fieldNumber": 4 },
                    "amount1Min": { "dataType": "uint64", "fieldNumber": 5 },
                    "maxTimestampValid": { "dataType": "uint64", "fieldNumber": 6 }
                }
            }),
        );
        schemas.insert(
            DexCommand::RemoveLiquidity,
            json!({
                "$id": "/dex/removeLiquidity",
                "type": "object",
                "required": ["positionID", "liquidityToRemove", "amount0Min", "amount1Min", "maxTimestampValid"],
                "properties": {
                    "positionID": { "dataType": "bytes", "fieldNumber": 1 },
                    "liquidityToRemove": { "dataType": "sint64", "fieldNumber": 2 },
                    "amount0Min": { "dataType": "uint64", "fieldNumber": 3 },
                    "amount1Min": { "dataType": "uint64", "fieldNumber": 4 },
                    "maxTimestampValid": { "dataType": "uint64", "fieldNumber": 5 }
                }
            }),
        );
        schemas.insert(
            DexCommand::SwapExactIn,
            json!({
                "$id": "/dex/swapExactIn",
                "type": "object",
                "required": ["tokenIdIn", "amountTokenIn", "tokenIdOut", "minAmountTokenOut", "swapRoute", "maxTimestampValid"],
                "properties": {
                    "tokenIdIn": { "dataType": "bytes", "length": 8, "fieldNumber": 1 },
                    "amountTokenIn": { "dataType": "uint64", "fieldNumber": 2 },
                    "tokenIdOut": { "dataType": "bytes", "length": 8, "fieldNumber": 3 },
                    "minAmountTokenOut": { "dataType": "uint64", "fieldNumber": 4 },
                    "swapRoute": {
                        "type": "array",
                        "fieldNumber": 5,
                        "items": { "dataType": "bytes" }
                    },
                    "maxTimestampValid": { "dataType": "uint64", "fieldNumber": 6 }
                }
            }),
        );
        schemas.insert(
            DexCommand::VoteOnProposal,
            json!({
                "$id": "/dexGovernance/voteOnProposal",
                "type": "object",
                "required": ["proposalIndex", "decision"],
                "properties": {
                    "proposalIndex": { "dataType": "uint32", "fieldNumber": 1 },
                    "decision": { "dataType": "uint32", "fieldNumber": 2 }
                }
            }),
        );
        schemas
    };
}

/// Returns the parameter schema for `command`.
pub fn schema_for(command: DexCommand) -> Option<&'static Value> {
    SCHEMAS.get(&command)
}
