//! Balance Aggregator
//!
//! Sums `balanceOf(pool) + s_loansInUse()` over the child pools and, on the hub,
//! finds which deposits on the way have already been received by a child pool.
//! Every read runs concurrently; one failed read fails the whole aggregation.

use chain_clients_common::hex_eq_ignore_case;
use chain_clients_evm::abi::{self, AbiReader, Token};
use chain_clients_evm::{BlockTag, LogFilter, RpcCall, U256};
use futures::future::{try_join, try_join_all};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{ChainDescriptor, ChainSelector, NetworkConfig};
use crate::connector::ChainConnector;
use crate::error::FunctionError;

const BALANCE_OF: &str = "balanceOf(address)";
const LOANS_IN_USE: &str = "s_loansInUse()";
const DEPOSITS_ON_THE_WAY: &str = "getDepositsOnTheWay()";
const CCIP_RECEIVED_EVENT: &str = "CCIPReceived(bytes32,uint64,address,address,uint256)";

/// Fixed length of the hub's deposits-on-the-way array.
pub const DEPOSITS_ON_THE_WAY_LEN: usize = 150;

/// Balances of one pool at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    pub selector: ChainSelector,
    pub token_balance: U256,
    pub loans_in_use: U256,
}

impl PoolState {
    pub fn effective_balance(&self) -> U256 {
        self.token_balance.saturating_add(self.loans_in_use)
    }
}

/// Sum of effective balances.
pub fn total_effective_balance(states: &[PoolState]) -> U256 {
    states
        .iter()
        .fold(U256::zero(), |acc, s| acc.saturating_add(s.effective_balance()))
}

/// Pending hub-to-child transfer, keyed by its slot in the hub array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositOnTheWay {
    pub index: u8,
    pub chain_selector: ChainSelector,
    pub ccip_message_id: [u8; 32],
    pub amount: U256,
}

/// Result of a total balance aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateBalance {
    pub total: U256,
    /// Hub array slots whose deposit has been received
    pub completed_deposits: Vec<u8>,
}

// ============================================================================
// POOL READS
// ============================================================================

/// Reads token balance and loans in use of one pool concurrently.
pub async fn read_pool_state(
    connector: ChainConnector<'_>,
    chain: &ChainDescriptor,
) -> Result<PoolState, FunctionError> {
    let pool_addr = chain.pool_addr()?;
    let token_addr = chain.token_addr()?;
    let pool = abi::parse_address(pool_addr)?;
    let client = connector.connect(chain)?;

    let balance_call = abi::encode_call(BALANCE_OF, &[Token::Word(abi::word_address(&pool))]);
    let loans_call = abi::encode_call(LOANS_IN_USE, &[]);

    let (balance, loans) = try_join(
        client.eth_call(token_addr, &balance_call),
        client.eth_call(pool_addr, &loans_call),
    )
    .await?;

    let state = PoolState {
        selector: chain.selector,
        token_balance: AbiReader::new(&balance).u256_at(0)?,
        loans_in_use: AbiReader::new(&loans).u256_at(0)?,
    };
    debug!(
        "{}: balance {} loans {}",
        chain.name, state.token_balance, state.loans_in_use
    );
    Ok(state)
}

/// Reads every given pool concurrently, failing fast.
pub async fn read_pool_states<'c>(
    connector: ChainConnector<'_>,
    chains: impl IntoIterator<Item = &'c ChainDescriptor>,
) -> Result<Vec<PoolState>, FunctionError> {
    try_join_all(chains.into_iter().map(|chain| read_pool_state(connector, chain))).await
}

// ============================================================================
// DEPOSITS ON THE WAY
// ============================================================================

/// Decodes `tuple(uint64, bytes32, uint256)[150]`, keeping entries with a non-zero message id.
pub fn decode_deposits_on_the_way(data: &[u8]) -> Result<Vec<DepositOnTheWay>, FunctionError> {
    let reader = AbiReader::new(data);
    let mut deposits = Vec::new();

    for index in 0..DEPOSITS_ON_THE_WAY_LEN {
        let base = index * 3;
        let ccip_message_id = reader.bytes32_at(base + 1)?;
        if ccip_message_id == [0u8; 32] {
            continue;
        }
        deposits.push(DepositOnTheWay {
            index: index as u8,
            chain_selector: ChainSelector(reader.u64_at(base)?),
            ccip_message_id,
            amount: reader.u256_at(base + 2)?,
        });
    }

    Ok(deposits)
}

async fn read_deposits_on_the_way(
    connector: ChainConnector<'_>,
    hub: &ChainDescriptor,
) -> Result<Vec<DepositOnTheWay>, FunctionError> {
    let client = connector.connect(hub)?;
    let data = client
        .eth_call(hub.pool_addr()?, &abi::encode_call(DEPOSITS_ON_THE_WAY, &[]))
        .await?;
    decode_deposits_on_the_way(&data)
}

/// True if the child pool has logged receipt of `deposit`.
async fn deposit_received(
    connector: ChainConnector<'_>,
    chain: &ChainDescriptor,
    deposit: &DepositOnTheWay,
) -> Result<Option<u8>, FunctionError> {
    let client = connector.connect(chain)?;
    let message_id = format!("0x{}", hex::encode(deposit.ccip_message_id));
    let topics = vec![abi::event_topic(CCIP_RECEIVED_EVENT), message_id.clone()];
    let filter = LogFilter::new(chain.pool_addr()?, topics)
        .from_block(BlockTag::Number(0))
        .to_block(BlockTag::Latest);

    let logs = client.get_logs(&filter).await?;
    let received = logs
        .iter()
        .any(|log| log.topics.get(1).map_or(false, |t| hex_eq_ignore_case(t, &message_id)));
    Ok(received.then_some(deposit.index))
}

/// Looks up receipt logs in bounded rounds.
///
/// Each round issues at most `receipt_batch_size` new lookups per child chain,
/// concurrently; rounds are separated by `receipt_round_delay_ms`. Deposits
/// for chains outside the network are ignored, as are deposits left over
/// after the last round.
pub async fn completed_deposits(
    connector: ChainConnector<'_>,
    network: &NetworkConfig,
    deposits: &[DepositOnTheWay],
) -> Result<Vec<u8>, FunctionError> {
    let settings = connector.settings();
    let mut queues: Vec<(&ChainDescriptor, Vec<&DepositOnTheWay>)> = Vec::new();
    let mut by_chain: HashMap<ChainSelector, usize> = HashMap::new();

    for deposit in deposits {
        let Some(chain) = network.chain(deposit.chain_selector) else {
            debug!(
                "Skipping deposit {} for unknown chain {}",
                deposit.index, deposit.chain_selector
            );
            continue;
        };
        let slot = *by_chain.entry(chain.selector).or_insert_with(|| {
            queues.push((chain, Vec::new()));
            queues.len() - 1
        });
        queues[slot].1.push(deposit);
    }

    let mut completed = Vec::new();
    let mut offset = 0usize;

    for round in 0..settings.receipt_rounds {
        let lookups: Vec<_> = queues
            .iter()
            .flat_map(|(chain, queue)| {
                queue
                    .iter()
                    .skip(offset)
                    .take(settings.receipt_batch_size)
                    .map(move |deposit| deposit_received(connector, chain, deposit))
            })
            .collect();

        if lookups.is_empty() {
            break;
        }

        debug!("Receipt round {}: {} lookups", round + 1, lookups.len());
        completed.extend(try_join_all(lookups).await?.into_iter().flatten());
        offset += settings.receipt_batch_size;

        if round + 1 < settings.receipt_rounds {
            tokio::time::sleep(Duration::from_millis(settings.receipt_round_delay_ms)).await;
        }
    }

    Ok(completed)
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Total child pool liquidity plus the hub deposits already received.
pub async fn aggregate(
    connector: ChainConnector<'_>,
    network: &NetworkConfig,
) -> Result<AggregateBalance, FunctionError> {
    let hub = network.hub()?;
    let (states, deposits) = try_join(
        read_pool_states(connector, network.child_chains()),
        read_deposits_on_the_way(connector, hub),
    )
    .await?;

    let total = total_effective_balance(&states);
    let completed_deposits = if deposits.is_empty() {
        Vec::new()
    } else {
        completed_deposits(connector, network, &deposits).await?
    };

    info!(
        "Network {}: total {} over {} child pools, {} of {} pending deposits received",
        network.name,
        total,
        states.len(),
        completed_deposits.len(),
        deposits.len()
    );

    Ok(AggregateBalance {
        total,
        completed_deposits,
    })
}
