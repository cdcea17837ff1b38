//! HTTP surfaces for the node and the wallet
//!
//! Handlers only translate between JSON and the [`Ledger`] / [`wallet`]
//! APIs; errors become JSON bodies through [`ResponseError`].

use crate::consensus::ReconcileOutcome;
use crate::types::{ChainResponse, InvoiceSubmission};
use crate::wallet::{self, SaleRequest};
use crate::{Config, Error, Ledger};
use actix_web::{error::ResponseError, http::StatusCode, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Body of `POST /nodes/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterNodesRequest {
    /// Comma-separated `host:port` list
    pub nodes: String,
}

impl ResponseError for Error {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        HttpResponse::build(status_code).json(json!({
            "error": {
                "code": status_code.as_u16(),
                "message": self.to_string(),
                "type": self.error_type()
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidPeerAddress(_) => StatusCode::BAD_REQUEST,
            Error::SignatureRejected(_) => StatusCode::NOT_ACCEPTABLE,
            Error::VatMismatch { .. } => StatusCode::NOT_ACCEPTABLE,
            Error::ChainInvalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::PeerUnreachable { .. } => StatusCode::BAD_GATEWAY,
            Error::StaleTip => StatusCode::CONFLICT,
            Error::Crypto(_) => StatusCode::BAD_REQUEST,
            Error::Serialization(_) => StatusCode::BAD_REQUEST,
            Error::Concurrency(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Error {
    fn error_type(&self) -> &str {
        match self {
            Error::InvalidPeerAddress(_) => "invalid_peer_address",
            Error::SignatureRejected(_) => "signature_rejected",
            Error::VatMismatch { .. } => "vat_mismatch",
            Error::ChainInvalid(_) => "chain_invalid",
            Error::PeerUnreachable { .. } => "peer_unreachable",
            Error::StaleTip => "stale_tip",
            Error::Crypto(_) => "crypto_error",
            Error::Serialization(_) => "serialization_error",
            Error::Concurrency(_) => "concurrency_error",
            Error::Config(_) => "config_error",
            Error::Io(_) => "io_error",
            Error::Other(_) => "internal_error",
        }
    }
}

/// Health check endpoint
pub async fn health_check(ledger: web::Data<Arc<Ledger>>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": ledger.config().service_name,
        "version": ledger.config().service_version,
        "node_id": ledger.node_id()
    }))
}

/// Prometheus metrics endpoint
pub async fn metrics(ledger: web::Data<Arc<Ledger>>) -> Result<HttpResponse, Error> {
    let body = ledger
        .metrics()
        .render()
        .map_err(|e| Error::Other(format!("Failed to render metrics: {}", e)))?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

/// Register peers
pub async fn register_nodes(
    ledger: web::Data<Arc<Ledger>>,
    request: web::Json<RegisterNodesRequest>,
) -> Result<HttpResponse, Error> {
    ledger.register_peers(&request.nodes).await?;
    let peers = ledger.peers().await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Nodes have been added",
        "total_nodes": peers
    })))
}

/// List peers
pub async fn list_nodes(ledger: web::Data<Arc<Ledger>>) -> Result<HttpResponse, Error> {
    let peers = ledger.peers().await?;
    Ok(HttpResponse::Ok().json(json!({ "nodes": peers })))
}

/// Submit a signed invoice
pub async fn new_invoice(
    ledger: web::Data<Arc<Ledger>>,
    request: web::Json<InvoiceSubmission>,
) -> Result<HttpResponse, Error> {
    let block_index = ledger.submit_signed(request.into_inner()).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": format!("Invoice will be added to block {}", block_index),
        "block_index": block_index
    })))
}

/// Pending invoices
pub async fn pending_invoices(ledger: web::Data<Arc<Ledger>>) -> Result<HttpResponse, Error> {
    let invoices = ledger.pending().await?;
    Ok(HttpResponse::Ok().json(json!({ "invoices": invoices })))
}

/// Mine a block
pub async fn mine(ledger: web::Data<Arc<Ledger>>) -> Result<HttpResponse, Error> {
    let block = ledger.mine().await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "New block forged",
        "index": block.index,
        "invoices": block.invoices,
        "nonce": block.nonce,
        "prev_hash": block.prev_hash
    })))
}

/// Full chain
pub async fn full_chain(ledger: web::Data<Arc<Ledger>>) -> Result<HttpResponse, Error> {
    let chain = ledger.chain().await?;
    Ok(HttpResponse::Ok().json(ChainResponse::new(chain)))
}

/// Reconcile with peers
pub async fn consensus(ledger: web::Data<Arc<Ledger>>) -> Result<HttpResponse, Error> {
    let ReconcileOutcome { adopted, chain } = ledger.reconcile().await?;
    let message = if adopted {
        "Chain was replaced"
    } else {
        "Chain is authoritative"
    };

    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "replaced": adopted,
        "chain": chain
    })))
}

/// Generate a key pair
pub async fn new_keys(config: web::Data<Config>) -> Result<HttpResponse, Error> {
    let bits = config.mining.key_bits;
    let keys = web::block(move || wallet::generate_keypair(bits))
        .await
        .map_err(|e| Error::Concurrency(format!("Key generation task failed: {}", e)))??;

    Ok(HttpResponse::Ok().json(keys))
}

/// Sign a sale
pub async fn sign_invoice(request: web::Json<SaleRequest>) -> Result<HttpResponse, Error> {
    let request = request.into_inner();
    let prepared = web::block(move || wallet::prepare_invoice(request))
        .await
        .map_err(|e| Error::Concurrency(format!("Signing task failed: {}", e)))??;

    Ok(HttpResponse::Ok().json(prepared))
}

/// Configure node routes
pub fn configure_node_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(metrics))
        .route("/nodes/register", web::post().to(register_nodes))
        .route("/nodes", web::get().to(list_nodes))
        .route("/invoices/new", web::post().to(new_invoice))
        .route("/invoices/pending", web::get().to(pending_invoices))
        .route("/mine", web::post().to(mine))
        .route("/chain", web::get().to(full_chain))
        .route("/consensus", web::post().to(consensus));
}

/// Configure wallet routes
pub fn configure_wallet_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/keys/new", web::get().to(new_keys))
        .route("/invoices/sign", web::post().to(sign_invoice));
}
