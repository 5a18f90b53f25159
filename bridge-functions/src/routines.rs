//! Routine entry points.
//!
//! Each routine takes the raw positional arguments and returns the encoded
//! result bytes for the host.

use chain_clients_evm::abi::{self, Token};
use futures::future::try_join_all;
use tracing::{info, warn};

use crate::aggregator::{self, read_pool_states};
use crate::args::{CollectWithdrawalArgs, DistributionType, RedistributeArgs, VerifyTransferArgs};
use crate::config::{ChainDescriptor, Config};
use crate::connector::ChainConnector;
use crate::crypto::EvmSigner;
use crate::error::FunctionError;
use crate::output;
use crate::rebalancer::plan_rebalance;
use crate::secrets::Secrets;
use crate::submitter::{self, Submission};
use crate::verifier;

const DISTRIBUTE_LIQUIDITY: &str = "distributeLiquidity(uint64,uint256,bytes32)";
const CCIP_SEND_TO_POOL: &str = "ccipSendToPool(uint64,uint256,bytes32)";

/// Everything a routine may use during one invocation.
#[derive(Debug, Clone, Copy)]
pub struct FunctionContext<'a> {
    pub config: &'a Config,
    pub secrets: &'a Secrets,
}

impl<'a> FunctionContext<'a> {
    pub fn new(config: &'a Config, secrets: &'a Secrets) -> Self {
        Self { config, secrets }
    }

    pub fn connector(&self) -> ChainConnector<'a> {
        ChainConnector::new(&self.config.settings, self.secrets)
    }
}

/// Verifies a source-chain transfer and returns `receiver ‖ amount ‖ payload`.
pub async fn verify_transfer(
    ctx: FunctionContext<'_>,
    args: &[Vec<u8>],
) -> Result<Vec<u8>, FunctionError> {
    let args = VerifyTransferArgs::decode(args)?;
    let chain = ctx.config.find_chain(args.source_chain)?;
    let event = verifier::verify_transfer(ctx.connector(), chain, &args).await?;
    Ok(output::encode_verified_transfer(&event))
}

/// Child pool liquidity plus received hub deposits: `total ‖ completed indexes`.
pub async fn total_balance(
    ctx: FunctionContext<'_>,
    _args: &[Vec<u8>],
) -> Result<Vec<u8>, FunctionError> {
    let network = ctx.config.default_network()?;
    let balance = aggregator::aggregate(ctx.connector(), network).await?;
    Ok(output::encode_total_balance(balance.total, &balance.completed_deposits))
}

/// Moves liquidity from the existing pools into a joining pool.
pub async fn redistribute_liquidity(
    ctx: FunctionContext<'_>,
    args: &[Vec<u8>],
) -> Result<Vec<u8>, FunctionError> {
    let args = RedistributeArgs::decode(args)?;
    let network = ctx.config.network_for_host_chain(args.host_chain_id)?;

    if args.distribution_type == DistributionType::LiquidateAndExit {
        return Err(FunctionError::Unsupported(
            "Liquidate-and-exit distribution is not supported".to_string(),
        ));
    }

    let signer = ctx.secrets.signer()?;
    let connector = ctx.connector();
    let existing: Vec<&ChainDescriptor> = network
        .pool_chains()
        .filter(|c| c.selector != args.joining_chain)
        .collect();

    let states = read_pool_states(connector, existing.iter().copied()).await?;
    let balances: Vec<_> = states
        .iter()
        .map(|s| (s.selector, s.effective_balance()))
        .collect();
    let plan = plan_rebalance(&balances, args.joining_chain);

    info!(
        "Redistributing to {}: target {} per pool, {} contributing pools",
        args.joining_chain,
        plan.target_per_pool,
        plan.contributions().count()
    );

    let submissions = plan.contributions().filter_map(|(selector, amount)| {
        network.chain(selector).map(|chain| {
            let data = abi::encode_call(
                DISTRIBUTE_LIQUIDITY,
                &[
                    Token::Word(abi::word_u64(args.joining_chain.as_u64())),
                    Token::Word(abi::word_u256(amount)),
                    Token::Word(args.request_id),
                ],
            );
            submit_to_pool(connector, chain, &signer, data)
        })
    });
    try_join_all(submissions).await?;

    Ok(output::success())
}

/// Asks every child pool to send `amount` to the hub for a withdrawal.
pub async fn collect_withdrawal_liquidity(
    ctx: FunctionContext<'_>,
    args: &[Vec<u8>],
) -> Result<Vec<u8>, FunctionError> {
    let args = CollectWithdrawalArgs::decode(args)?;
    let network = ctx.config.default_network()?;
    let signer = ctx.secrets.signer()?;
    let connector = ctx.connector();

    let data = abi::encode_call(
        CCIP_SEND_TO_POOL,
        &[
            Token::Word(abi::word_u64(network.hub_chain_selector.as_u64())),
            Token::Word(abi::word_u256(args.amount)),
            Token::Word(args.withdrawal_id),
        ],
    );

    let submissions = network
        .child_chains()
        .map(|chain| submit_to_pool(connector, chain, &signer, data.clone()));
    let results = try_join_all(submissions).await?;

    info!(
        "Withdrawal 0x{}: requested {} from {} pools",
        hex::encode(args.withdrawal_id),
        args.amount,
        results.len()
    );
    Ok(output::success())
}

/// Submits `data` to the pool on `chain`. A race rejection from any step of
/// the submission counts as already submitted.
async fn submit_to_pool(
    connector: ChainConnector<'_>,
    chain: &ChainDescriptor,
    signer: &EvmSigner,
    data: Vec<u8>,
) -> Result<Submission, FunctionError> {
    match try_submit_to_pool(connector, chain, signer, data).await {
        Ok(Submission::AlreadySubmitted) => {
            info!("{}: transaction already submitted by another run", chain.name);
            Ok(Submission::AlreadySubmitted)
        }
        Err(e) if e.is_already_submitted() => {
            warn!("{}: treating {} as already submitted", chain.name, e);
            Ok(Submission::AlreadySubmitted)
        }
        other => other,
    }
}

async fn try_submit_to_pool(
    connector: ChainConnector<'_>,
    chain: &ChainDescriptor,
    signer: &EvmSigner,
    data: Vec<u8>,
) -> Result<Submission, FunctionError> {
    let pool = abi::parse_address(chain.pool_addr()?)?;
    let client = connector.connect(chain)?;
    submitter::submit(&client, signer, pool, data).await
}
