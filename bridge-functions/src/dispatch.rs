//! Routine Dispatcher
//!
//! Selects a routine from slot 1 of the invocation arguments and checks the
//! routine digest in slot 0 before running it. The digest pins the caller to
//! the deployed build: `sha256("<routine name>@<crate version>")`.

use chain_clients_common::hex_eq_ignore_case;
use tracing::{error, info};

use crate::args::{slot, uint_from_be, DIGEST_SLOT, ROUTINE_SLOT};
use crate::config::Config;
use crate::crypto::sha256;
use crate::error::FunctionError;
use crate::routines::{self, FunctionContext};
use crate::secrets::Secrets;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routine {
    VerifyTransfer,
    TotalBalance,
    RedistributeLiquidity,
    CollectWithdrawalLiquidity,
}

impl Routine {
    pub const ALL: [Routine; 4] = [
        Routine::VerifyTransfer,
        Routine::TotalBalance,
        Routine::RedistributeLiquidity,
        Routine::CollectWithdrawalLiquidity,
    ];

    pub fn id(self) -> u8 {
        match self {
            Routine::VerifyTransfer => 1,
            Routine::TotalBalance => 2,
            Routine::RedistributeLiquidity => 3,
            Routine::CollectWithdrawalLiquidity => 4,
        }
    }

    pub fn from_id(id: u64) -> Result<Self, FunctionError> {
        Self::ALL
            .into_iter()
            .find(|r| u64::from(r.id()) == id)
            .ok_or_else(|| FunctionError::Unsupported(format!("Unknown routine {}", id)))
    }

    pub fn name(self) -> &'static str {
        match self {
            Routine::VerifyTransfer => "verify-transfer",
            Routine::TotalBalance => "total-balance",
            Routine::RedistributeLiquidity => "redistribute-liquidity",
            Routine::CollectWithdrawalLiquidity => "collect-withdrawal-liquidity",
        }
    }

    pub fn digest(self) -> [u8; 32] {
        sha256(format!("{}@{}", self.name(), env!("CARGO_PKG_VERSION")).as_bytes())
    }

    /// Full argument list for this routine: digest, id, an empty reserved
    /// slot, then the routine's own arguments.
    pub fn invocation_args(self, routine_args: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
        let mut args = vec![self.digest().to_vec(), vec![self.id()], Vec::new()];
        args.extend(routine_args);
        args
    }
}

/// Compares the digest in slot 0 with the routine's, ignoring hex case.
pub fn check_digest(routine: Routine, given: &[u8]) -> Result<(), FunctionError> {
    let computed = format!("0x{}", hex::encode(routine.digest()));
    let given = format!("0x{}", hex::encode(given));
    if !hex_eq_ignore_case(&computed, &given) {
        return Err(FunctionError::Integrity(format!("{} != {}", computed, given)));
    }
    Ok(())
}

/// Resolves, checks and runs the routine named by `args`.
///
/// # Arguments
///
/// * `config` - Network configuration
/// * `secrets` - Endpoint keys and the pool messenger key
/// * `args` - Positional arguments as passed by the host
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - Encoded routine result
/// * `Err(FunctionError)` - Dispatch or routine failure
pub async fn execute(
    config: &Config,
    secrets: &Secrets,
    args: &[Vec<u8>],
) -> Result<Vec<u8>, FunctionError> {
    let id = uint_from_be(slot(args, ROUTINE_SLOT)?, "Routine id")?;
    if id.bits() > 64 {
        return Err(FunctionError::Unsupported(format!("Unknown routine {}", id)));
    }
    let routine = Routine::from_id(id.low_u64())?;
    check_digest(routine, slot(args, DIGEST_SLOT)?)?;

    info!("Running routine {}", routine.name());
    let ctx = FunctionContext::new(config, secrets);
    match routine {
        Routine::VerifyTransfer => routines::verify_transfer(ctx, args).await,
        Routine::TotalBalance => routines::total_balance(ctx, args).await,
        Routine::RedistributeLiquidity => routines::redistribute_liquidity(ctx, args).await,
        Routine::CollectWithdrawalLiquidity => {
            routines::collect_withdrawal_liquidity(ctx, args).await
        }
    }
}

/// Host-facing entry: the result bytes or a truncated error message.
pub async fn run(config: &Config, secrets: &Secrets, args: &[Vec<u8>]) -> Result<Vec<u8>, String> {
    execute(config, secrets, args).await.map_err(|e| {
        error!("Routine failed: {}", e);
        e.host_message()
    })
}
