//! Rebalancer
//!
//! When a pool joins, every existing pool moves toward
//! `target = sum(balances) / (pool_count + 1)`. Pools above the target fund the
//! new pool with their surplus. Integer division truncates and the remainder
//! stays where it is, so at most `pool_count` units go undistributed.

use chain_clients_evm::U256;

use crate::config::ChainSelector;

/// Movement for one existing pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Surplus above the target, sent to the joining pool
    Send(U256),
    /// Shortfall below the target
    Receive(U256),
}

impl Transfer {
    fn between(balance: U256, target: U256) -> Self {
        if balance >= target {
            Transfer::Send(balance - target)
        } else {
            Transfer::Receive(target - balance)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebalancePlan {
    pub joining_chain: ChainSelector,
    pub target_per_pool: U256,
    /// One entry per existing pool, in input order
    pub transfers: Vec<(ChainSelector, Transfer)>,
}

impl RebalancePlan {
    /// Pools with a positive surplus and the amount each sends.
    pub fn contributions(&self) -> impl Iterator<Item = (ChainSelector, U256)> + '_ {
        self.transfers.iter().filter_map(|(selector, transfer)| match transfer {
            Transfer::Send(amount) if !amount.is_zero() => Some((*selector, *amount)),
            _ => None,
        })
    }

    /// Sum of sends minus sum of receives. Never negative, since the target
    /// is at most the mean of the existing pools.
    pub fn net_transfer(&self) -> U256 {
        let (sent, received) = self.transfers.iter().fold(
            (U256::zero(), U256::zero()),
            |(sent, received), (_, transfer)| match transfer {
                Transfer::Send(amount) => (sent + *amount, received),
                Transfer::Receive(amount) => (sent, received + *amount),
            },
        );
        sent.saturating_sub(received)
    }
}

/// Plans the rebalance for `joining_chain` entering the pool set.
///
/// # Arguments
///
/// * `balances` - Effective balance per existing pool; an entry for the joining chain is ignored
/// * `joining_chain` - Selector of the new pool
pub fn plan_rebalance(
    balances: &[(ChainSelector, U256)],
    joining_chain: ChainSelector,
) -> RebalancePlan {
    let existing: Vec<(ChainSelector, U256)> = balances
        .iter()
        .copied()
        .filter(|(selector, _)| *selector != joining_chain)
        .collect();

    let pool_count = existing.len() as u64;
    let total = existing
        .iter()
        .fold(U256::zero(), |acc, (_, balance)| acc.saturating_add(*balance));
    let target_per_pool = total / U256::from(pool_count + 1);

    let transfers = existing
        .into_iter()
        .map(|(selector, balance)| (selector, Transfer::between(balance, target_per_pool)))
        .collect();

    RebalancePlan {
        joining_chain,
        target_per_pool,
        transfers,
    }
}
