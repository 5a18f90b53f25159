//! Builds chain clients from descriptors.
//!
//! Endpoint URL templates are resolved against the secrets at selection time.
//! Only templates appear in logs and error messages, never resolved URLs.

use chain_clients_evm::{EndpointPool, EvmClient};
use std::time::Duration;
use tracing::debug;

use crate::config::{ChainDescriptor, FunctionsSettings};
use crate::error::FunctionError;
use crate::secrets::Secrets;

#[derive(Debug, Clone, Copy)]
pub struct ChainConnector<'a> {
    settings: &'a FunctionsSettings,
    secrets: &'a Secrets,
}

impl<'a> ChainConnector<'a> {
    pub fn new(settings: &'a FunctionsSettings, secrets: &'a Secrets) -> Self {
        Self { settings, secrets }
    }

    pub fn settings(&self) -> &'a FunctionsSettings {
        self.settings
    }

    pub fn endpoints(&self, chain: &ChainDescriptor) -> Result<EndpointPool, FunctionError> {
        Ok(EndpointPool::new(chain.rpc_urls.clone())?)
    }

    /// Client for one specific endpoint template of `chain`.
    pub fn connect_to(
        &self,
        chain: &ChainDescriptor,
        template: &str,
    ) -> Result<EvmClient, FunctionError> {
        let url = self.secrets.interpolate(template)?;
        debug!("Connecting to {} via {}", chain.name, template);
        let client = EvmClient::new(&url, chain.chain_id)?
            .with_label(template)
            .with_gas_limit_override(self.settings.gas_limit_override)
            .with_timeout(Duration::from_millis(self.settings.rpc_timeout_ms));
        Ok(client)
    }

    /// Client for a uniformly random endpoint of `chain`.
    pub fn connect(&self, chain: &ChainDescriptor) -> Result<EvmClient, FunctionError> {
        let pool = self.endpoints(chain)?;
        self.connect_to(chain, pool.select())
    }
}
