//! Transaction Submitter
//!
//! Signs one contract call as a legacy EIP-155 transaction and broadcasts it.
//! A concurrent run of the same routine may already have landed an equivalent
//! transaction; the node then rejects ours with a nonce/fee/"already known"
//! error, which counts as success.

use chain_clients_evm::{LegacyTransaction, RpcCall, H160, U256};
use tracing::{info, warn};

use crate::crypto::EvmSigner;
use crate::error::FunctionError;

/// Outcome of a submission that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Broadcast accepted; carries the transaction hash
    Accepted(String),
    /// An equivalent transaction was already in the pool or mined
    AlreadySubmitted,
}

/// Signs and sends `data` to contract `to` through `client`.
///
/// # Arguments
///
/// * `client` - Endpoint of the destination chain
/// * `signer` - Pool messenger key
/// * `to` - Contract address
/// * `data` - ABI-encoded calldata
///
/// # Returns
///
/// * `Ok(Submission)` - Accepted, or already submitted by a concurrent run
/// * `Err(FunctionError)` - Any other failure
pub async fn submit<C: RpcCall>(
    client: &C,
    signer: &EvmSigner,
    to: H160,
    data: Vec<u8>,
) -> Result<Submission, FunctionError> {
    let from = format!("{:?}", signer.address());

    let nonce = client.get_transaction_count(&from).await?;
    let gas_price = client.gas_price().await?;
    let chain_id = client.chain_id().await?;
    let gas_limit = client
        .estimate_gas(serde_json::json!({
            "from": from,
            "to": format!("{:?}", to),
            "data": format!("0x{}", hex::encode(&data)),
        }))
        .await?;

    let tx = LegacyTransaction {
        nonce,
        gas_price,
        gas_limit,
        to,
        value: U256::zero(),
        data,
        chain_id,
    };
    let signature = signer.sign_prehash(&tx.signing_hash())?;
    let raw = tx.encode_signed(&signature);

    match client.send_raw_transaction(&raw).await {
        Ok(hash) => {
            info!(
                "Submitted tx {} to {:?} (nonce {}, chain {})",
                hash, to, nonce, chain_id
            );
            Ok(Submission::Accepted(hash))
        }
        Err(e) if e.is_already_submitted() => {
            warn!("Treating rejection from {} as already submitted: {}", client.url(), e);
            Ok(Submission::AlreadySubmitted)
        }
        Err(e) => Err(e.into()),
    }
}
