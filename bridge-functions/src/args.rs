//! Positional invocation arguments.
//!
//! The host passes a list of byte strings. Slots 0 to 2 are reserved: slot 0
//! carries the routine digest, slot 1 the routine id, slot 2 is unused. Each
//! routine reads its own arguments from slot 3 on.

use chain_clients_evm::abi::{address_from_bytes, bytes32_from_slice};
use chain_clients_evm::{H160, U256};

use crate::config::ChainSelector;
use crate::error::FunctionError;

pub const DIGEST_SLOT: usize = 0;
pub const ROUTINE_SLOT: usize = 1;
pub const FIRST_ROUTINE_SLOT: usize = 3;

/// Returns the argument at `index` or a NotFound error.
pub fn slot(args: &[Vec<u8>], index: usize) -> Result<&[u8], FunctionError> {
    args.get(index)
        .map(Vec::as_slice)
        .ok_or_else(|| FunctionError::NotFound(format!("Missing argument at slot {}", index)))
}

/// Big-endian unsigned integer of at most 32 bytes.
pub fn uint_from_be(bytes: &[u8], what: &str) -> Result<U256, FunctionError> {
    if bytes.len() > 32 {
        return Err(FunctionError::InvalidArgument(format!(
            "{} must be at most 32 bytes, got {}",
            what,
            bytes.len()
        )));
    }
    Ok(U256::from_big_endian(bytes))
}

fn u64_from_be(bytes: &[u8], what: &str) -> Result<u64, FunctionError> {
    let value = uint_from_be(bytes, what)?;
    if value > U256::from(u64::MAX) {
        return Err(FunctionError::InvalidArgument(format!("{} does not fit in 64 bits", what)));
    }
    Ok(value.low_u64())
}

fn bytes32(bytes: &[u8], what: &str) -> Result<[u8; 32], FunctionError> {
    bytes32_from_slice(bytes).map_err(|_| {
        FunctionError::InvalidArgument(format!("{} must be 32 bytes, got {}", what, bytes.len()))
    })
}

// ============================================================================
// VERIFY TRANSFER
// ============================================================================

/// `[.., srcContract, srcChainSelector, messageId, commitment]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyTransferArgs {
    pub source_contract: H160,
    pub source_chain: ChainSelector,
    pub message_id: [u8; 32],
    pub commitment: [u8; 32],
}

impl VerifyTransferArgs {
    pub fn decode(args: &[Vec<u8>]) -> Result<Self, FunctionError> {
        let base = FIRST_ROUTINE_SLOT;
        let contract = slot(args, base)?;
        Ok(Self {
            source_contract: address_from_bytes(contract).map_err(|e| {
                FunctionError::InvalidArgument(format!("Invalid source contract: {}", e))
            })?,
            source_chain: ChainSelector::from_be_bytes(slot(args, base + 1)?)?,
            message_id: bytes32(slot(args, base + 2)?, "Message id")?,
            commitment: bytes32(slot(args, base + 3)?, "Commitment")?,
        })
    }
}

// ============================================================================
// REDISTRIBUTE LIQUIDITY
// ============================================================================

/// How liquidity moves when the pool set changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionType {
    /// A pool joins; existing pools fund it (0x00)
    Join,
    /// A pool leaves and hands its liquidity back (0x01)
    LiquidateAndExit,
}

impl DistributionType {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FunctionError> {
        match u64_from_be(bytes, "Distribution type")? {
            0 => Ok(DistributionType::Join),
            1 => Ok(DistributionType::LiquidateAndExit),
            other => Err(FunctionError::Unsupported(format!(
                "Invalid distribution type {}",
                other
            ))),
        }
    }
}

/// `[.., joiningChainSelector, requestId, distributionType, hostChainId]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedistributeArgs {
    pub joining_chain: ChainSelector,
    pub request_id: [u8; 32],
    pub distribution_type: DistributionType,
    pub host_chain_id: u64,
}

impl RedistributeArgs {
    pub fn decode(args: &[Vec<u8>]) -> Result<Self, FunctionError> {
        let base = FIRST_ROUTINE_SLOT;
        Ok(Self {
            joining_chain: ChainSelector::from_be_bytes(slot(args, base)?)?,
            request_id: bytes32(slot(args, base + 1)?, "Request id")?,
            distribution_type: DistributionType::from_bytes(slot(args, base + 2)?)?,
            host_chain_id: u64_from_be(slot(args, base + 3)?, "Host chain id")?,
        })
    }
}

// ============================================================================
// COLLECT WITHDRAWAL LIQUIDITY
// ============================================================================

/// `[.., liquidityAmount, withdrawalId]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectWithdrawalArgs {
    /// Amount requested from each child pool
    pub amount: U256,
    pub withdrawal_id: [u8; 32],
}

impl CollectWithdrawalArgs {
    pub fn decode(args: &[Vec<u8>]) -> Result<Self, FunctionError> {
        let base = FIRST_ROUTINE_SLOT;
        Ok(Self {
            amount: uint_from_be(slot(args, base)?, "Liquidity amount")?,
            withdrawal_id: bytes32(slot(args, base + 1)?, "Withdrawal id")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserved() -> Vec<Vec<u8>> {
        vec![vec![0u8; 32], vec![1], vec![]]
    }

    #[test]
    fn test_decode_verify_transfer() {
        let mut args = reserved();
        args.push(vec![0xaa; 20]);
        args.push(vec![0x8f, 0x90, 0xb8, 0x87, 0x6d, 0xee, 0x65, 0x38]);
        args.push(vec![0x01; 32]);
        args.push(vec![0x02; 32]);

        let decoded = VerifyTransferArgs::decode(&args).unwrap();

        assert_eq!(decoded.source_contract, H160::from_slice(&[0xaa; 20]));
        assert_eq!(decoded.source_chain, ChainSelector(10344971235874465080));
        assert_eq!(decoded.message_id, [0x01; 32]);
        assert_eq!(decoded.commitment, [0x02; 32]);
    }

    #[test]
    fn test_missing_slot_is_not_found() {
        let mut args = reserved();
        args.push(vec![0xaa; 20]);

        let err = VerifyTransferArgs::decode(&args).unwrap_err();
        assert!(matches!(err, FunctionError::NotFound(_)));
        assert_eq!(err.to_string(), "Missing argument at slot 4");
    }

    #[test]
    fn test_decode_redistribute() {
        let mut args = reserved();
        args.push(vec![0x01]);
        args.push(vec![0x09; 32]);
        args.push(vec![0x00]);
        args.push(vec![0x01, 0x4a, 0x34]);

        let decoded = RedistributeArgs::decode(&args).unwrap();
        assert_eq!(decoded.joining_chain, ChainSelector(1));
        assert_eq!(decoded.distribution_type, DistributionType::Join);
        assert_eq!(decoded.host_chain_id, 84532);
    }

    #[test]
    fn test_distribution_type_values() {
        assert_eq!(DistributionType::from_bytes(&[1]).unwrap(), DistributionType::LiquidateAndExit);
        assert!(matches!(
            DistributionType::from_bytes(&[2]),
            Err(FunctionError::Unsupported(_))
        ));
    }

    #[test]
    fn test_decode_collect_withdrawal() {
        let mut args = reserved();
        args.push(vec![0x03, 0xe8]);
        args.push(vec![0x05; 32]);

        let decoded = CollectWithdrawalArgs::decode(&args).unwrap();
        assert_eq!(decoded.amount, U256::from(1000));
        assert!(CollectWithdrawalArgs::decode(&args[..4]).is_err());
    }

    #[test]
    fn test_short_message_id_rejected() {
        let mut args = reserved();
        args.push(vec![0xaa; 20]);
        args.push(vec![0x01]);
        args.push(vec![0x01; 31]);
        args.push(vec![0x02; 32]);

        assert!(matches!(
            VerifyTransferArgs::decode(&args),
            Err(FunctionError::InvalidArgument(_))
        ));
    }
}
