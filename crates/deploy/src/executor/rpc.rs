//! Live executor over JSON-RPC.

use std::time::Duration;

use alloy_core::primitives::{Address, Bytes};
use alloy_network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy_provider::{DynProvider, Provider, ProviderBuilder, WsConnect};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::{RpcError, TransportErrorKind, TransportResult};
use backon::{ExponentialBuilder, Retryable};
use url::Url;

use super::{TxExecutor, TxOutcome};
use crate::{
    error::{DeployError, DeployResult},
    plan::StepName,
};

/// Number of attempts made to reach the endpoint before giving up.
const CONNECT_ATTEMPTS: usize = 5;

fn connect_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(500))
        .with_max_times(CONNECT_ATTEMPTS)
}

/// Sends signed transactions through a JSON-RPC endpoint over HTTP or WebSocket.
///
/// Transactions are never retried once sent: a dropped connection or a
/// reverted transaction is fatal for the run.
#[derive(Clone)]
pub struct RpcExecutor {
    provider: DynProvider,
    signer: Address,
    chain_id: u64,
}

impl RpcExecutor {
    /// Connect to `url` and sign with `signer`.
    ///
    /// `ws`/`wss` endpoints get a WebSocket transport, `http`/`https` ones an
    /// HTTP client. The connection and a chain id query are retried with a
    /// short exponential backoff before anything is sent.
    pub async fn connect(url: Url, signer: PrivateKeySigner) -> DeployResult<Self> {
        Self::connect_with(url, signer, connect_backoff()).await
    }

    async fn connect_with(
        url: Url,
        signer: PrivateKeySigner,
        backoff: ExponentialBuilder,
    ) -> DeployResult<Self> {
        let websocket = match url.scheme() {
            "http" | "https" => false,
            "ws" | "wss" => true,
            scheme => {
                return Err(DeployError::config(format!(
                    "unsupported RPC scheme {scheme}, expected http, https, ws or wss"
                )));
            }
        };
        let address = signer.address();
        let wallet = EthereumWallet::from(signer);

        let (provider, chain_id) = (|| async {
            let provider = build_provider(&url, wallet.clone(), websocket).await?;
            let chain_id = provider.get_chain_id().await?;
            Ok::<_, RpcError<TransportErrorKind>>((provider, chain_id))
        })
        .retry(backoff)
        .notify(|err, after| {
            tracing::warn!(%url, error = %err, ?after, "RPC endpoint not reachable, retrying");
        })
        .await
        .map_err(|e| DeployError::transport(format!("cannot reach {url}: {e}")))?;

        tracing::info!(%url, chain_id, signer = %address, websocket, "Connected to RPC endpoint");

        Ok(Self {
            provider,
            signer: address,
            chain_id,
        })
    }

    async fn send(&self, step: &StepName, tx: TransactionRequest) -> DeployResult<TxOutcome> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| send_error(step, e))?;

        let tx_hash = *pending.tx_hash();
        tracing::debug!(%step, %tx_hash, "Transaction sent, waiting for receipt");

        let receipt = pending.get_receipt().await.map_err(|e| {
            DeployError::transport(format!("no receipt for {step} ({tx_hash}): {e}"))
        })?;

        if !receipt.status() {
            return Err(DeployError::reverted(
                step,
                format!("transaction {tx_hash} included with failed status"),
            ));
        }

        Ok(TxOutcome {
            tx_hash: receipt.transaction_hash,
            contract_address: receipt.contract_address,
            gas_used: receipt.gas_used,
            block_number: receipt.block_number,
        })
    }
}

async fn build_provider(
    url: &Url,
    wallet: EthereumWallet,
    websocket: bool,
) -> TransportResult<DynProvider> {
    let builder = ProviderBuilder::new().wallet(wallet);
    if websocket {
        let provider = builder.connect_ws(WsConnect::new(url.as_str())).await?;
        Ok(DynProvider::new(provider))
    } else {
        Ok(DynProvider::new(builder.connect_http(url.clone())))
    }
}

/// Nodes reject transactions failing gas estimation with an error response
/// mentioning the revert; everything else is a transport failure.
fn send_error(step: &StepName, err: RpcError<TransportErrorKind>) -> DeployError {
    match err.as_error_resp() {
        Some(payload) if payload.message.to_lowercase().contains("revert") => {
            DeployError::reverted(step, &payload.message)
        }
        _ => DeployError::transport(format!("cannot send transaction for {step}: {err}")),
    }
}

impl TxExecutor for RpcExecutor {
    fn signer(&self) -> Address {
        self.signer
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn create(&self, step: &StepName, code: Bytes) -> DeployResult<TxOutcome> {
        let tx = TransactionRequest::default()
            .with_from(self.signer)
            .with_deploy_code(code);
        self.send(step, tx).await
    }

    async fn call(&self, step: &StepName, to: Address, calldata: Bytes) -> DeployResult<TxOutcome> {
        let tx = TransactionRequest::default()
            .with_from(self.signer)
            .with_to(to)
            .with_input(calldata);
        self.send(step, tx).await
    }
}
