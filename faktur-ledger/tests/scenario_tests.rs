//! End-to-end node scenarios
//!
//! Nodes talk to each other through an in-memory peer client that serves
//! another ledger's chain directly.

use async_trait::async_trait;
use faktur_ledger::{
    client::PeerClient,
    crypto::{sha256_hex, sign_invoice, KeyPair},
    pow::{mine, pow_input},
    types::ChainResponse,
    validation::valid_chain,
    Config, Error, Invoice, Ledger, SignableInvoice, SignedInvoice,
};
use lazy_static::lazy_static;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

const DIFFICULTY: usize = 1;

lazy_static! {
    static ref SELLER: KeyPair = KeyPair::generate(1024).unwrap();
    static ref IMPOSTOR: KeyPair = KeyPair::generate(1024).unwrap();
}

fn seller() -> &'static KeyPair {
    &SELLER
}

fn impostor() -> &'static KeyPair {
    &IMPOSTOR
}

fn invoice_signed_by(signer: &KeyPair, buyer: &str, sale_price: Decimal) -> Invoice {
    let signable = SignableInvoice::new(seller().public_key_hex().unwrap(), buyer, sale_price);
    let signature = sign_invoice(&signable, signer).unwrap();

    Invoice::Signed(SignedInvoice {
        vat: signable.vat(),
        seller_key: signable.seller_key,
        buyer_key: signable.buyer_key,
        sale_price,
        signature,
    })
}

/// Serves chains of in-process ledgers keyed by address
#[derive(Default)]
struct InMemoryNetwork {
    nodes: HashMap<String, Arc<Ledger>>,
}

#[async_trait]
impl PeerClient for InMemoryNetwork {
    async fn fetch_chain(&self, peer: &str) -> faktur_ledger::Result<ChainResponse> {
        let node = self.nodes.get(peer).ok_or_else(|| Error::PeerUnreachable {
            peer: peer.to_string(),
            reason: "connection refused".to_string(),
        })?;
        Ok(ChainResponse::new(node.chain().await?))
    }
}

/// Serves a fixed chain regardless of address
struct StaticChain(ChainResponse);

#[async_trait]
impl PeerClient for StaticChain {
    async fn fetch_chain(&self, _peer: &str) -> faktur_ledger::Result<ChainResponse> {
        Ok(self.0.clone())
    }
}

fn config() -> Config {
    let mut config = Config::default();
    config.mining.difficulty = DIFFICULTY;
    config
}

async fn node(client: Arc<dyn PeerClient>) -> Arc<Ledger> {
    Arc::new(Ledger::with_client(config(), client).await.unwrap())
}

#[tokio::test]
async fn scenario_a_genesis_only_chain_is_valid() {
    let ledger = node(Arc::new(InMemoryNetwork::default())).await;
    let chain = ledger.chain().await.unwrap();

    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].index, 1);
    assert_eq!(chain[0].prev_hash, "00");
    assert_eq!(chain[0].nonce, 0);
    assert!(chain[0].invoices.is_empty());
    assert!(valid_chain(&chain, DIFFICULTY));
}

#[tokio::test]
async fn scenario_b_reward_invoice_bypasses_signature() {
    let ledger = node(Arc::new(InMemoryNetwork::default())).await;
    let length = ledger.chain().await.unwrap().len() as u64;

    let index = ledger.submit(Invoice::reward("someone")).await.unwrap();
    assert_eq!(index, length + 1);
    assert_eq!(ledger.pending().await.unwrap(), vec![Invoice::reward("someone")]);
}

#[tokio::test]
async fn scenario_c_forged_signature_rejected() {
    let ledger = node(Arc::new(InMemoryNetwork::default())).await;
    ledger
        .submit(invoice_signed_by(seller(), "buyer-1", Decimal::new(1000, 0)))
        .await
        .unwrap();
    let before = ledger.pending().await.unwrap();

    let forged = invoice_signed_by(impostor(), "buyer-2", Decimal::new(1000, 0));
    let err = ledger.submit(forged).await.unwrap_err();

    assert!(matches!(err, Error::SignatureRejected(_)));
    assert_eq!(ledger.pending().await.unwrap(), before);
}

#[test]
fn scenario_d_mining_empty_pool_meets_difficulty() {
    let nonce = mine(&pow_input(&[]), "00", 1);
    let digest = sha256_hex(format!("00{}", nonce).as_bytes());
    assert!(digest.starts_with('0'));
}

#[tokio::test]
async fn scenario_e_shorter_node_adopts_longer_chain() {
    let node_b = node(Arc::new(InMemoryNetwork::default())).await;
    node_b
        .submit(invoice_signed_by(seller(), "buyer", Decimal::new(250, 0)))
        .await
        .unwrap();
    node_b.mine().await.unwrap();
    node_b.mine().await.unwrap();

    let mut network = InMemoryNetwork::default();
    network.nodes.insert("node-b:5002".to_string(), node_b.clone());
    let node_a = node(Arc::new(network)).await;
    node_a.mine().await.unwrap();
    node_a.register_peers("node-b:5002").await.unwrap();

    let outcome = node_a.reconcile().await.unwrap();
    assert!(outcome.adopted);
    assert_eq!(node_a.chain().await.unwrap(), node_b.chain().await.unwrap());
}

#[tokio::test]
async fn scenario_f_tampered_longer_chain_ignored() {
    let source = node(Arc::new(InMemoryNetwork::default())).await;
    source
        .submit(invoice_signed_by(seller(), "buyer", Decimal::new(250, 0)))
        .await
        .unwrap();
    source.mine().await.unwrap();
    source.mine().await.unwrap();

    let mut tampered = source.chain().await.unwrap();
    if let Invoice::Signed(ref mut signed) = tampered[1].invoices[0] {
        signed.buyer_key = "someone-else".to_string();
    }

    let node_a = node(Arc::new(StaticChain(ChainResponse::new(tampered)))).await;
    node_a.register_peers("node-b:5002").await.unwrap();
    let before = node_a.chain().await.unwrap();

    let outcome = node_a.reconcile().await.unwrap();
    assert!(!outcome.adopted);
    assert_eq!(node_a.chain().await.unwrap(), before);
}

#[tokio::test]
async fn pending_invoices_survive_replacement() {
    let node_b = node(Arc::new(InMemoryNetwork::default())).await;
    node_b.mine().await.unwrap();

    let mut network = InMemoryNetwork::default();
    network.nodes.insert("node-b:5002".to_string(), node_b.clone());
    let node_a = node(Arc::new(network)).await;
    node_a.register_peers("node-b:5002, node-c:5003").await.unwrap();
    node_a
        .submit(invoice_signed_by(seller(), "buyer", Decimal::new(10, 0)))
        .await
        .unwrap();

    assert!(node_a.reconcile().await.unwrap().adopted);
    assert_eq!(node_a.pending().await.unwrap().len(), 1);

    // The next block builds on the adopted chain.
    let block = node_a.mine().await.unwrap();
    assert_eq!(block.index, 3);
    assert!(valid_chain(&node_a.chain().await.unwrap(), DIFFICULTY));
}
