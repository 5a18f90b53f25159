//! Event Verifier
//!
//! Confirms that a `ConceroBridgeSent` event exists on the source chain and
//! survives the configured confirmation depth.
//!
//! ```text
//! Searching -> Found -> Confirming -> Reconfirming -> Verified
//!     |                     |              |             |
//!     +---------------------+--------------+-------------+--> Failed
//! ```
//!
//! The search rotates over the chain's endpoints from a random start, since a
//! single endpoint may lag the head. Confirmation and reconfirmation stay on the
//! endpoint that found the log.

use chain_clients_common::hex_eq_ignore_case;
use chain_clients_evm::abi::event_topic;
use chain_clients_evm::{BlockTag, EvmClient, EvmLog, LogFilter, RpcCall, H160};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::args::VerifyTransferArgs;
use crate::commitment::{BridgeSentEvent, BRIDGE_SENT_EVENT};
use crate::config::ChainDescriptor;
use crate::connector::ChainConnector;
use crate::error::FunctionError;

/// Verification progress, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    Searching,
    Found,
    Confirming,
    Reconfirming,
    Verified,
    Failed,
}

impl fmt::Display for VerificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VerificationState::Searching => "searching",
            VerificationState::Found => "found",
            VerificationState::Confirming => "confirming",
            VerificationState::Reconfirming => "reconfirming",
            VerificationState::Verified => "verified",
            VerificationState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Log located by the search phase, with the endpoint that returned it.
struct FoundLog {
    client: EvmClient,
    log: EvmLog,
    block_number: u64,
    latest_block: u64,
}

pub struct EventVerifier<'a> {
    connector: ChainConnector<'a>,
    chain: &'a ChainDescriptor,
    source_contract: String,
    topics: Vec<String>,
}

impl<'a> EventVerifier<'a> {
    pub fn new(
        connector: ChainConnector<'a>,
        chain: &'a ChainDescriptor,
        source_contract: H160,
        message_id: &[u8; 32],
    ) -> Self {
        Self {
            connector,
            chain,
            source_contract: format!("{:?}", source_contract),
            topics: vec![
                event_topic(BRIDGE_SENT_EVENT),
                format!("0x{}", hex::encode(message_id)),
            ],
        }
    }

    fn filter(&self, from_block: u64, to_block: u64) -> LogFilter {
        LogFilter::new(&self.source_contract, self.topics.clone())
            .from_block(BlockTag::Number(from_block))
            .to_block(BlockTag::Number(to_block))
    }

    fn transition(&self, state: VerificationState) {
        debug!("Verification of {} on {}: {}", self.topics[1], self.chain.name, state);
    }

    /// Runs the full state machine and returns the decoded, committed event.
    ///
    /// # Arguments
    ///
    /// * `commitment` - Hash the caller expects for the event's canonical fields
    ///
    /// # Returns
    ///
    /// * `Ok(BridgeSentEvent)` - Event found, confirmed, still present and matching
    /// * `Err(FunctionError)` - NotFound, Integrity or Transient failure
    pub async fn verify(&self, commitment: &[u8; 32]) -> Result<BridgeSentEvent, FunctionError> {
        let result = self.run(commitment).await;
        match &result {
            Ok(_) => self.transition(VerificationState::Verified),
            Err(e) => {
                self.transition(VerificationState::Failed);
                warn!("Verification of {} failed: {}", self.topics[1], e);
            }
        }
        result
    }

    async fn run(&self, commitment: &[u8; 32]) -> Result<BridgeSentEvent, FunctionError> {
        self.transition(VerificationState::Searching);
        let found = self.search().await?;

        self.transition(VerificationState::Found);
        info!(
            "Found transfer event in tx {} at block {} on {}",
            found.log.transaction_hash, found.block_number, self.chain.name
        );

        self.transition(VerificationState::Confirming);
        let head = self.await_confirmations(&found).await?;

        self.transition(VerificationState::Reconfirming);
        let log = self.reconfirm(&found, head).await?;

        let event = BridgeSentEvent::from_log(&log)?;
        event.check_commitment(commitment)?;
        Ok(event)
    }

    /// Searching: bounded attempts over rotating endpoints.
    async fn search(&self) -> Result<FoundLog, FunctionError> {
        let settings = self.connector.settings();
        let pool = self.connector.endpoints(self.chain)?;
        let mut last_endpoint = "";

        for (attempt, template) in pool
            .rotation()
            .take(settings.log_search_attempts as usize)
            .enumerate()
        {
            last_endpoint = template;
            match self.search_once(template).await {
                Ok(Some(found)) => return Ok(found),
                Ok(None) => debug!("Attempt {}: no logs yet at {}", attempt + 1, template),
                Err(e) => warn!(
                    "Attempt {}: log search at {} failed: {}",
                    attempt + 1,
                    template,
                    e
                ),
            }

            if attempt + 1 < settings.log_search_attempts as usize {
                tokio::time::sleep(Duration::from_millis(settings.log_search_retry_delay_ms)).await;
            }
        }

        Err(FunctionError::NotFound(format!("No logs found {}", last_endpoint)))
    }

    async fn search_once(&self, template: &str) -> Result<Option<FoundLog>, FunctionError> {
        let client = self.connector.connect_to(self.chain, template)?;
        let latest_block = client.get_block_number().await?;
        let window = self.connector.settings().log_search_window_blocks;
        let from_block = latest_block.saturating_sub(window);

        let logs = client.get_logs(&self.filter(from_block, latest_block)).await?;
        let Some(log) = logs.into_iter().next() else {
            return Ok(None);
        };

        let block_number = log.block_number_u64().ok_or_else(|| {
            FunctionError::Integrity(format!(
                "Log {} has invalid block number {:?}",
                log.transaction_hash, log.block_number
            ))
        })?;

        Ok(Some(FoundLog {
            client,
            log,
            block_number,
            latest_block,
        }))
    }

    /// Confirming: polls the head until the log is `confirmations` deep.
    async fn await_confirmations(&self, found: &FoundLog) -> Result<u64, FunctionError> {
        let settings = self.connector.settings();
        let mut head = found.latest_block;
        let mut polls = 0u32;

        while head.saturating_sub(found.block_number) < self.chain.confirmations {
            if polls >= settings.max_confirmation_polls {
                return Err(FunctionError::Transient(format!(
                    "Block {} not {} blocks deep after {} polls (head {})",
                    found.block_number, self.chain.confirmations, polls, head
                )));
            }
            tokio::time::sleep(Duration::from_millis(settings.confirmation_poll_interval_ms)).await;
            head = found.client.get_block_number().await?;
            polls += 1;
            debug!("Head {} (log at {})", head, found.block_number);
        }

        Ok(head)
    }

    /// Reconfirming: the original transaction must still emit the log at `head`.
    async fn reconfirm(&self, found: &FoundLog, head: u64) -> Result<EvmLog, FunctionError> {
        let logs = found
            .client
            .get_logs(&self.filter(found.block_number, head))
            .await?;

        logs.into_iter()
            .find(|l| hex_eq_ignore_case(&l.transaction_hash, &found.log.transaction_hash))
            .ok_or_else(|| FunctionError::Integrity("Log no longer exists.".to_string()))
    }
}

/// Verifies the transfer described by `args` and returns the decoded event.
pub async fn verify_transfer(
    connector: ChainConnector<'_>,
    chain: &ChainDescriptor,
    args: &VerifyTransferArgs,
) -> Result<BridgeSentEvent, FunctionError> {
    EventVerifier::new(connector, chain, args.source_contract, &args.message_id)
        .verify(&args.commitment)
        .await
}
