//! Randomized endpoint selection.
//!
//! Every selection is an independent uniform draw. No health state is kept,
//! so an endpoint that just failed can be drawn again.

use anyhow::{ensure, Result};
use rand::Rng;

/// The JSON-RPC endpoints configured for one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPool {
    urls: Vec<String>,
}

impl EndpointPool {
    /// Creates a pool. Fails if `urls` is empty.
    pub fn new(urls: Vec<String>) -> Result<Self> {
        ensure!(!urls.is_empty(), "Endpoint pool needs at least one URL");
        Ok(Self { urls })
    }

    /// Picks an endpoint uniformly at random.
    pub fn select(&self) -> &str {
        self.select_with(&mut rand::thread_rng())
    }

    /// Picks an endpoint using the given random source.
    pub fn select_with<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        let index = rng.gen_range(0..self.urls.len());
        &self.urls[index]
    }

    /// Endless round-robin over the endpoints, starting at a random one.
    pub fn rotation(&self) -> impl Iterator<Item = &str> {
        self.rotation_with(&mut rand::thread_rng())
    }

    pub fn rotation_with<R: Rng + ?Sized>(&self, rng: &mut R) -> impl Iterator<Item = &str> {
        let start = rng.gen_range(0..self.urls.len());
        self.urls.iter().map(String::as_str).cycle().skip(start)
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
