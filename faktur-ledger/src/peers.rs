//! Registry of peer node addresses
//!
//! Membership only: no health tracking, no discovery. Addresses are stored
//! normalised as `host:port`.

use crate::{Error, Result};
use reqwest::Url;
use std::collections::HashSet;

/// Parse a peer address into `host:port`
///
/// Accepts a bare `host:port` or a URL with a scheme (`http://host:port/`).
pub fn parse_peer_address(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidPeerAddress("empty address".to_string()));
    }

    if trimmed.contains("://") {
        let url = Url::parse(trimmed)
            .map_err(|e| Error::InvalidPeerAddress(format!("{}: {}", trimmed, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidPeerAddress(format!("{}: missing host", trimmed)))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| Error::InvalidPeerAddress(format!("{}: missing port", trimmed)))?;
        return Ok(format!("{}:{}", host, port));
    }

    let authority = trimmed.trim_end_matches('/');
    let (host, port) = authority
        .rsplit_once(':')
        .ok_or_else(|| Error::InvalidPeerAddress(format!("{}: expected host:port", trimmed)))?;

    let bracketed = host.starts_with('[') && host.ends_with(']');
    if host.is_empty()
        || host.contains(|c: char| c == '/' || c.is_whitespace())
        || (host.contains(':') && !bracketed)
    {
        return Err(Error::InvalidPeerAddress(format!("{}: bad host", trimmed)));
    }

    let port: u16 = port
        .parse()
        .map_err(|_| Error::InvalidPeerAddress(format!("{}: bad port", trimmed)))?;
    if port == 0 {
        return Err(Error::InvalidPeerAddress(format!("{}: port 0", trimmed)));
    }

    Ok(format!("{}:{}", host, port))
}

/// Deduplicated set of peer addresses
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    peers: HashSet<String>,
}

impl NodeRegistry {
    /// Create empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one address; returns the normalised form
    pub fn register(&mut self, input: &str) -> Result<String> {
        let address = parse_peer_address(input)?;
        self.peers.insert(address.clone());
        Ok(address)
    }

    /// Register a comma-separated list
    ///
    /// All entries are parsed before any is inserted, so a malformed entry
    /// leaves the registry unchanged.
    pub fn register_many(&mut self, input: &str) -> Result<Vec<String>> {
        let addresses = input
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(parse_peer_address)
            .collect::<Result<Vec<_>>>()?;

        if addresses.is_empty() {
            return Err(Error::InvalidPeerAddress("no addresses given".to_string()));
        }

        self.peers.extend(addresses.iter().cloned());
        Ok(addresses)
    }

    /// Registered addresses, sorted
    pub fn list(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.peers.iter().cloned().collect();
        peers.sort();
        peers
    }

    /// Number of peers
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether no peers are registered
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Membership check
    pub fn contains(&self, address: &str) -> bool {
        self.peers.contains(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_and_url_forms() {
        assert_eq!(parse_peer_address("127.0.0.1:5002").unwrap(), "127.0.0.1:5002");
        assert_eq!(parse_peer_address(" localhost:5003 ").unwrap(), "localhost:5003");
        assert_eq!(
            parse_peer_address("http://192.168.0.5:5000/").unwrap(),
            "192.168.0.5:5000"
        );
        assert_eq!(parse_peer_address("http://node.local").unwrap(), "node.local:80");
        assert_eq!(parse_peer_address("[::1]:5001").unwrap(), "[::1]:5001");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["", "localhost", ":5000", "host:port", "host:0", "host:70000", "a b:1", "::1:5000"] {
            let err = parse_peer_address(input).unwrap_err();
            assert!(matches!(err, Error::InvalidPeerAddress(_)), "{}", input);
        }
    }

    #[test]
    fn test_registry_deduplicates() {
        let mut registry = NodeRegistry::new();
        registry.register("127.0.0.1:5002").unwrap();
        registry.register("http://127.0.0.1:5002").unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("127.0.0.1:5002"));
    }

    #[test]
    fn test_register_many_is_all_or_nothing() {
        let mut registry = NodeRegistry::new();
        assert!(registry.register_many("127.0.0.1:5002, bogus").is_err());
        assert!(registry.is_empty());

        let added = registry
            .register_many("127.0.0.1:5002,127.0.0.1:5003, 127.0.0.1:5004")
            .unwrap();
        assert_eq!(added.len(), 3);
        assert_eq!(
            registry.list(),
            vec!["127.0.0.1:5002", "127.0.0.1:5003", "127.0.0.1:5004"]
        );
    }
}
