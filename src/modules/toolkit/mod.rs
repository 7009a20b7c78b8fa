//! Toolkit commands for selector, codec and unit work

pub mod call;
pub mod checksum;
pub mod convert;
pub mod decode;
pub mod encode;
pub mod selector;

use std::fmt;
use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::domain::abi::{AbiEncoder, SelectorCache, SignatureRegistry};

/// Result of a toolkit operation
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub title: String,
    pub content: Vec<(String, String)>, // (label, value) pairs
}

impl ToolResult {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: Vec::new(),
        }
    }

    pub fn add(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.content.push((label.into(), value.into()));
        self
    }

    /// Value of the first entry labelled `label`
    pub fn get(&self, label: &str) -> Option<&str> {
        self.content
            .iter()
            .find(|(k, _)| k == label)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for ToolResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        let width = self.content.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (label, value) in &self.content {
            writeln!(f, "  {:width$}  {}", label, value, width = width)?;
        }
        Ok(())
    }
}

/// Shared state for toolkit commands
#[derive(Debug)]
pub struct ToolContext {
    pub selectors: Arc<SelectorCache>,
    pub registry: SignatureRegistry,
    pub initial_capacity: usize,
    pub checksum_addresses: bool,
    pub block_tag: String,
}

impl ToolContext {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let selectors = Arc::new(SelectorCache::new());
        let registry = SignatureRegistry::with_common(&selectors)
            .context("failed to build signature registry")?;
        Ok(Self {
            selectors,
            registry,
            initial_capacity: config.initial_capacity(),
            checksum_addresses: config.abi.checksum_addresses,
            block_tag: config.default_block_tag.clone(),
        })
    }

    /// Encoder sized from config, with the selector of `signature` written
    pub fn encoder(&self, signature: &str) -> anyhow::Result<AbiEncoder> {
        let selector = self
            .selectors
            .selector(signature)
            .with_context(|| format!("invalid method {:?}", signature))?;
        Ok(AbiEncoder::for_selector_with_capacity(selector, self.initial_capacity))
    }
}
