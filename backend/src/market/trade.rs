//! Buy and sell actions with per-item state.
//!
//! Each marketplace item has its own [`TradeState`], so a pending trade on
//! one coin never blocks another. The state map is locked only between
//! awaits.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{ChainReader, MarketItem};
use crate::api::logs::{log_error, log_info, log_success, log_warning};
use crate::config::BASE_CHAIN_ID;
use crate::error::{IssuanceError, MarketError, MarketResult};
use crate::issuance::{CoinIssuer, TradeDirection, TradeReceipt, TradeRequest, TIMEOUT_MARKER};

pub const BUY_SLIPPAGE: f64 = 0.05;
pub const SELL_SLIPPAGE: f64 = 0.15;
pub const ETH_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TradeState {
    #[default]
    Idle,
    /// In flight, or broadcast but not yet confirmed
    Pending { tx_hash: Option<String> },
    Succeeded { tx_hash: String },
    Failed { message: String },
}

pub struct TradeDesk<I: CoinIssuer + ?Sized, R: ChainReader + ?Sized> {
    issuer: Arc<I>,
    reader: Arc<R>,
    chain_id: u64,
    states: Mutex<HashMap<String, TradeState>>,
}

impl<I: CoinIssuer + ?Sized, R: ChainReader + ?Sized> TradeDesk<I, R> {
    pub fn new(issuer: Arc<I>, reader: Arc<R>) -> Self {
        Self {
            issuer,
            reader,
            chain_id: BASE_CHAIN_ID,
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn state(&self, item_id: &str) -> TradeState {
        self.states
            .lock()
            .ok()
            .and_then(|states| states.get(&key(item_id)).cloned())
            .unwrap_or_default()
    }

    /// Buy `eth_amount` ETH worth of the item's coin.
    pub async fn buy(&self, item: &MarketItem, eth_amount: &str, trader: &str) -> MarketResult<TradeReceipt> {
        let amount = match parse_amount(eth_amount, ETH_DECIMALS) {
            Ok(amount) => amount,
            Err(e) => return Err(self.reject(&item.id, e)),
        };

        log_info(format!("Buying {} ETH of ${}", eth_amount.trim(), item.symbol));
        self.execute(item, TradeDirection::Buy, amount, BUY_SLIPPAGE, trader).await
    }

    /// Sell `token_amount` of the item's coin held by `owner`.
    pub async fn sell(&self, item: &MarketItem, token_amount: &str, owner: &str) -> MarketResult<TradeReceipt> {
        let checked = self.check_balance(item, token_amount, owner).await;
        let amount = match checked {
            Ok(amount) => amount,
            Err(e) => return Err(self.reject(&item.id, e)),
        };

        log_info(format!("Selling {} ${}", token_amount.trim(), item.symbol));
        self.execute(item, TradeDirection::Sell, amount, SELL_SLIPPAGE, owner).await
    }

    async fn check_balance(&self, item: &MarketItem, token_amount: &str, owner: &str) -> MarketResult<u128> {
        let decimals = self.reader.decimals(&item.contract_address).await?;
        let balance = self.reader.balance_of(&item.contract_address, owner).await?;
        let amount = parse_amount(token_amount, decimals)?;

        if amount > balance {
            return Err(MarketError::InsufficientBalance {
                available: format_units(balance, decimals),
                requested: format_units(amount, decimals),
            });
        }
        Ok(amount)
    }

    async fn execute(
        &self,
        item: &MarketItem,
        direction: TradeDirection,
        amount: u128,
        slippage: f64,
        trader: &str,
    ) -> MarketResult<TradeReceipt> {
        self.begin(&item.id)?;

        let request = TradeRequest {
            direction,
            coin_address: item.contract_address.clone(),
            amount_in: amount.to_string(),
            slippage,
            trader: trader.to_string(),
            chain_id: self.chain_id,
        };

        match self.issuer.trade_coin(request).await {
            Ok(receipt) => {
                log_success(format!("Trade confirmed: {}", receipt.tx_hash));
                self.set(&item.id, TradeState::Succeeded { tx_hash: receipt.tx_hash.clone() });
                Ok(receipt)
            }
            Err(err) => {
                self.set(&item.id, failed_state(&err));
                Err(err.into())
            }
        }
    }

    /// Mark the item pending unless a trade on it is already in flight.
    fn begin(&self, item_id: &str) -> MarketResult<()> {
        let mut states = self
            .states
            .lock()
            .map_err(|_| MarketError::TradePending(item_id.to_string()))?;
        let entry = states.entry(key(item_id)).or_default();
        if matches!(entry, TradeState::Pending { tx_hash: None }) {
            return Err(MarketError::TradePending(item_id.to_string()));
        }
        *entry = TradeState::Pending { tx_hash: None };
        Ok(())
    }

    /// Record a validation failure, leaving an in-flight trade untouched.
    fn reject(&self, item_id: &str, err: MarketError) -> MarketError {
        log_error(format!("Trade rejected: {}", err));
        if let Ok(mut states) = self.states.lock() {
            let entry = states.entry(key(item_id)).or_default();
            if !matches!(entry, TradeState::Pending { tx_hash: None }) {
                *entry = TradeState::Failed { message: err.to_string() };
            }
        }
        err
    }

    fn set(&self, item_id: &str, state: TradeState) {
        if let Ok(mut states) = self.states.lock() {
            states.insert(key(item_id), state);
        }
    }
}

fn key(item_id: &str) -> String {
    item_id.to_ascii_lowercase()
}

fn failed_state(err: &IssuanceError) -> TradeState {
    if err.message.contains(TIMEOUT_MARKER) {
        log_warning(format!("Trade pending: {}", err.message));
        TradeState::Pending { tx_hash: err.tx_hash.clone() }
    } else {
        log_error(format!("Trade failed: {}", err.message));
        TradeState::Failed { message: err.message.clone() }
    }
}

/// Parse a positive decimal amount into base units.
pub fn parse_amount(amount: &str, decimals: u8) -> MarketResult<u128> {
    let invalid = || MarketError::InvalidAmount(amount.trim().to_string());
    let value = parse_units(amount, decimals).ok_or_else(invalid)?;
    if value == 0 {
        return Err(invalid());
    }
    Ok(value)
}

/// `"1.5"` with 18 decimals is `1_500_000_000_000_000_000`.
pub fn parse_units(amount: &str, decimals: u8) -> Option<u128> {
    let amount = amount.trim();
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    if fraction.len() > usize::from(decimals) {
        return None;
    }

    let scale = 10u128.checked_pow(u32::from(decimals))?;
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let padded = format!("{:0<width$}", fraction, width = usize::from(decimals));
    let fraction: u128 = if padded.is_empty() { 0 } else { padded.parse().ok()? };

    whole.checked_mul(scale)?.checked_add(fraction)
}

/// Inverse of [`parse_units`], without trailing zeros.
pub fn format_units(value: u128, decimals: u8) -> String {
    let Some(scale) = 10u128.checked_pow(u32::from(decimals)) else {
        return value.to_string();
    };
    let whole = value / scale;
    let fraction = value % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{:0>width$}", fraction, width = usize::from(decimals));
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}
