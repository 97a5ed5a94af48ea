//! Shared test fixtures: an in-memory ledger behind the `ChainGateway`
//! port, artifact files on disk, and test clocks.
//!
//! The ledger applies a transaction's effects only when it is confirmed,
//! after an optional confirmation delay, and rejects calls the deployed
//! contracts would reject (wrong market state, wrong sender, duplicate
//! group). Every estimation, submission and confirmation is recorded in
//! an event log for ordering assertions.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, Bytes, TxHash, U256, keccak256};
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use energy_market_client::ClientError;
use energy_market_client::config::AppConfig;
use energy_market_client::config::loader::parse_config;
use energy_market_client::contracts::bindings::{
    GROUPS_MANAGER_FUNCTIONS, IGroupsManager, IMarketsManager, INgt, MARKETS_MANAGER_FUNCTIONS,
    NGT_FUNCTIONS, RequiredFunction,
};
use energy_market_client::ports::chain_gateway::{ChainGateway, ContractCall, FeeBound, TxReceipt};
use energy_market_client::ports::clock::Clock;

pub const OWNER: usize = 0;
pub const DSO: usize = 1;
pub const PLAYER: usize = 2;
pub const REFEREE: usize = 3;

/// Contract-side state codes used by the fake markets manager.
pub const STATE_OPENED: u8 = 0;
pub const STATE_RUNNING: u8 = 1;
pub const STATE_SETTLED: u8 = 2;
pub const STATE_CLOSED: u8 = 3;

#[derive(Debug, Clone)]
pub struct FakeMarket {
    pub player: Address,
    pub start_time: U256,
    pub end_time: U256,
    pub market_type: u8,
    pub state: u8,
    pub power_peak: Option<U256>,
}

#[derive(Debug, Clone, Default)]
struct LedgerState {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    groups: HashMap<Address, Address>,
    markets: HashMap<U256, FakeMarket>,
    pending: HashMap<TxHash, (ContractCall, Address)>,
    events: Vec<String>,
    calc_idx_types: Vec<u8>,
    failing: HashSet<&'static str>,
    failing_views: HashSet<&'static str>,
    submissions: usize,
    block: u64,
}

/// In-memory ledger implementing `ChainGateway`.
pub struct FakeLedger {
    pub accounts: Vec<Address>,
    pub ngt: Address,
    pub groups_manager: Address,
    confirmation_delay: Duration,
    never_confirm: bool,
    state: Mutex<LedgerState>,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self {
            accounts: (0..4u8).map(|i| Address::with_last_byte(0x10 + i)).collect(),
            ngt: Address::with_last_byte(0x01),
            groups_manager: Address::with_last_byte(0x02),
            confirmation_delay: Duration::ZERO,
            never_confirm: false,
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Every confirmation takes this long.
    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = delay;
        self
    }

    /// Transactions are accepted but never mined.
    pub fn never_confirming(mut self) -> Self {
        self.never_confirm = true;
        self
    }

    /// Pre-register a group for `dso`.
    pub fn with_group(self, dso: Address) -> Self {
        {
            let mut state = self.lock();
            let manager = Self::manager_address(state.groups.len());
            state.groups.insert(dso, manager);
        }
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Revert every transaction calling `signature`.
    pub fn fail_on(&self, signature: &'static str) {
        self.lock().failing.insert(signature);
    }

    /// Fail every view call to `signature`.
    pub fn fail_view(&self, signature: &'static str) {
        self.lock().failing_views.insert(signature);
    }

    pub fn account(&self, index: usize) -> Address {
        self.accounts[index]
    }

    pub fn events(&self) -> Vec<String> {
        self.lock().events.clone()
    }

    /// Events of one kind (`estimate`, `submit`, `confirmed`, `revert`).
    pub fn events_of(&self, kind: &str) -> Vec<String> {
        let prefix = format!("{kind}:");
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    pub fn submissions(&self) -> usize {
        self.lock().submissions
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.lock().balances.get(&account).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.lock()
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn group_of(&self, dso: Address) -> Option<Address> {
        self.lock().groups.get(&dso).copied()
    }

    pub fn market(&self, idx: U256) -> Option<FakeMarket> {
        self.lock().markets.get(&idx).cloned()
    }

    pub fn markets(&self) -> Vec<(U256, FakeMarket)> {
        self.lock()
            .markets
            .iter()
            .map(|(idx, m)| (*idx, m.clone()))
            .collect()
    }

    /// Market type arguments seen by `calcIdx`, in call order.
    pub fn calc_idx_types(&self) -> Vec<u8> {
        self.lock().calc_idx_types.clone()
    }

    /// Type-invariant idx derivation.
    pub fn idx_of(player: Address, start_time: U256) -> U256 {
        U256::from_be_bytes(keccak256((player, start_time).abi_encode()).0)
    }

    fn manager_address(n: usize) -> Address {
        Address::with_last_byte(0xA0 + n as u8)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap()
    }
}

fn decode<C: SolCall>(input: &[u8]) -> Option<C> {
    if input.len() >= 4 && input[..4] == C::SELECTOR {
        C::abi_decode(input, true).ok()
    } else {
        None
    }
}

fn market_duration(market_type: u8) -> u64 {
    match market_type {
        0 => 30 * 86_400,
        1 => 86_400,
        _ => 3_600,
    }
}

/// Apply a transaction's effects, as the deployed contracts would.
fn apply(state: &mut LedgerState, call: &ContractCall, sender: Address) -> Result<(), String> {
    let input = call.input.as_ref();

    if let Some(c) = decode::<INgt::mintCall>(input) {
        *state.balances.entry(c.beneficiary).or_default() += c.amount;
    } else if let Some(c) = decode::<INgt::increaseAllowanceCall>(input) {
        *state.allowances.entry((sender, c.spender)).or_default() += c.addedValue;
    } else if let Some(c) = decode::<IGroupsManager::addGroupCall>(input) {
        if state.groups.contains_key(&c.dso) {
            return Err("group exists".into());
        }
        let manager = FakeLedger::manager_address(state.groups.len());
        state.groups.insert(c.dso, manager);
    } else if let Some(c) = decode::<IMarketsManager::openCall>(input) {
        if !state.groups.values().any(|m| *m == call.to) {
            return Err("not a markets manager".into());
        }
        let idx = FakeLedger::idx_of(c.player, c.startTime);
        if state.markets.contains_key(&idx) {
            return Err("market exists".into());
        }
        state.markets.insert(
            idx,
            FakeMarket {
                player: c.player,
                start_time: c.startTime,
                end_time: c.startTime + U256::from(market_duration(c.marketType)),
                market_type: c.marketType,
                state: STATE_OPENED,
                power_peak: None,
            },
        );
    } else if let Some(c) = decode::<IMarketsManager::confirmOpeningCall>(input) {
        let market = state.markets.get_mut(&c.idx).ok_or("unknown market")?;
        if market.state != STATE_OPENED || market.player != sender {
            return Err("cannot confirm opening".into());
        }
        market.state = STATE_RUNNING;
    } else if let Some(c) = decode::<IMarketsManager::settleCall>(input) {
        let market = state.markets.get_mut(&c.idx).ok_or("unknown market")?;
        if market.state != STATE_RUNNING {
            return Err("cannot settle".into());
        }
        market.state = STATE_SETTLED;
        market.power_peak = Some(c.powerPeak);
    } else if let Some(c) = decode::<IMarketsManager::confirmSettlementCall>(input) {
        let market = state.markets.get_mut(&c.idx).ok_or("unknown market")?;
        if market.state != STATE_SETTLED || market.player != sender {
            return Err("cannot confirm settlement".into());
        }
        market.state = STATE_CLOSED;
    } else {
        return Err(format!("unknown transaction {}", call.method));
    }
    Ok(())
}

fn view(state: &mut LedgerState, call: &ContractCall) -> Result<Bytes, String> {
    let input = call.input.as_ref();

    let encoded = if let Some(c) = decode::<INgt::balanceOfCall>(input) {
        state.balances.get(&c.account).copied().unwrap_or_default().abi_encode()
    } else if let Some(c) = decode::<INgt::allowanceCall>(input) {
        state
            .allowances
            .get(&(c.owner, c.spender))
            .copied()
            .unwrap_or_default()
            .abi_encode()
    } else if let Some(c) = decode::<IGroupsManager::getFlagCall>(input) {
        state.groups.contains_key(&c.dso).abi_encode()
    } else if let Some(c) = decode::<IGroupsManager::getAddressCall>(input) {
        state.groups.get(&c.dso).copied().unwrap_or_default().abi_encode()
    } else if let Some(c) = decode::<IMarketsManager::calcIdxCall>(input) {
        state.calc_idx_types.push(c.marketType);
        FakeLedger::idx_of(c.player, c.startTime).abi_encode()
    } else if let Some(c) = decode::<IMarketsManager::getFlagCall>(input) {
        state.markets.contains_key(&c.idx).abi_encode()
    } else {
        let idx = decode::<IMarketsManager::getStateCall>(input)
            .map(|c| c.idx)
            .or_else(|| decode::<IMarketsManager::getStartTimeCall>(input).map(|c| c.idx))
            .or_else(|| decode::<IMarketsManager::getEndTimeCall>(input).map(|c| c.idx))
            .or_else(|| decode::<IMarketsManager::getPlayerCall>(input).map(|c| c.idx))
            .ok_or_else(|| format!("unknown view {}", call.method))?;
        let market = state.markets.get(&idx).ok_or("unknown market")?;
        match &input[..4] {
            s if s == IMarketsManager::getStateCall::SELECTOR => U256::from(market.state).abi_encode(),
            s if s == IMarketsManager::getStartTimeCall::SELECTOR => market.start_time.abi_encode(),
            s if s == IMarketsManager::getEndTimeCall::SELECTOR => market.end_time.abi_encode(),
            _ => market.player.abi_encode(),
        }
    };
    Ok(encoded.into())
}

#[async_trait]
impl ChainGateway for FakeLedger {
    async fn accounts(&self) -> Result<Vec<Address>, ClientError> {
        Ok(self.accounts.clone())
    }

    async fn has_code(&self, address: Address) -> Result<bool, ClientError> {
        let state = self.lock();
        Ok(address == self.ngt
            || address == self.groups_manager
            || state.groups.values().any(|m| *m == address))
    }

    async fn estimate_fee(&self, call: &ContractCall, sender: Address) -> Result<FeeBound, ClientError> {
        let mut state = self.lock();
        state.events.push(format!("estimate:{}", call.method));

        let reverted = if state.failing.contains(call.method) {
            Some("execution reverted".to_string())
        } else {
            let mut scratch = state.clone();
            apply(&mut scratch, call, sender).err()
        };

        if let Some(reason) = reverted {
            state.events.push(format!("revert:{}", call.method));
            return Err(ClientError::TransactionReverted {
                tx_hash: None,
                reason,
            });
        }
        Ok(FeeBound {
            gas_limit: 100_000,
            gas_price: 1_000_000_000,
        })
    }

    async fn submit_transaction(
        &self,
        call: &ContractCall,
        sender: Address,
        _fee: FeeBound,
    ) -> Result<TxHash, ClientError> {
        let mut state = self.lock();
        state.submissions += 1;
        let tx_hash = TxHash::left_padding_from(&(state.submissions as u64).to_be_bytes());
        state.pending.insert(tx_hash, (call.clone(), sender));
        state.events.push(format!("submit:{}", call.method));
        Ok(tx_hash)
    }

    async fn await_confirmation(&self, tx_hash: TxHash, timeout: Duration) -> Result<TxReceipt, ClientError> {
        if self.never_confirm || self.confirmation_delay > timeout {
            tokio::time::sleep(timeout).await;
            return Err(ClientError::TransactionTimeout { tx_hash, timeout });
        }
        tokio::time::sleep(self.confirmation_delay).await;

        let mut state = self.lock();
        let (call, sender) = state
            .pending
            .remove(&tx_hash)
            .ok_or_else(|| ClientError::Rpc(format!("unknown transaction {tx_hash}")))?;

        if let Err(reason) = apply(&mut state, &call, sender) {
            state.events.push(format!("revert:{}", call.method));
            return Err(ClientError::TransactionReverted {
                tx_hash: Some(tx_hash),
                reason,
            });
        }

        state.block += 1;
        state.events.push(format!("confirmed:{}", call.method));
        Ok(TxReceipt {
            tx_hash,
            block_number: state.block,
        })
    }

    async fn call_view(&self, call: &ContractCall) -> Result<Bytes, ClientError> {
        let mut state = self.lock();
        if state.failing_views.contains(call.method) {
            return Err(ClientError::ViewCallFailure {
                call: call.method.to_string(),
                reason: "node unavailable".into(),
            });
        }
        view(&mut state, call).map_err(|reason| ClientError::ViewCallFailure {
            call: call.method.to_string(),
            reason,
        })
    }
}

// ---- Clocks ----

/// Always the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Starts at `base` and follows tokio's (possibly paused) clock.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    base: DateTime<Utc>,
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn starting_at(base: DateTime<Utc>) -> Self {
        Self {
            base,
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = tokio::time::Instant::now() - self.origin;
        self.base + chrono::Duration::from_std(elapsed).unwrap()
    }
}

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

// ---- Artifacts and configuration ----

/// Artifact JSON exposing exactly `functions`.
pub fn artifact_json(name: &str, functions: &[RequiredFunction]) -> String {
    let abi: Vec<serde_json::Value> = functions
        .iter()
        .map(|(signature, _)| {
            let (fn_name, rest) = signature.split_once('(').unwrap();
            let params = rest.trim_end_matches(')');
            let inputs: Vec<serde_json::Value> = params
                .split(',')
                .filter(|t| !t.is_empty())
                .map(|t| serde_json::json!({ "name": "", "type": t }))
                .collect();
            serde_json::json!({
                "type": "function",
                "name": fn_name,
                "inputs": inputs,
                "outputs": [],
                "stateMutability": "nonpayable",
            })
        })
        .collect();
    serde_json::json!({ "contractName": name, "abi": abi }).to_string()
}

/// A fresh contract project directory with all three artifacts.
pub fn project_dir() -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    let root = std::env::temp_dir().join(format!(
        "energy-market-client-test-{}-{n}",
        std::process::id()
    ));
    let contracts = root.join("build").join("contracts");
    std::fs::create_dir_all(&contracts).unwrap();

    for (file, name, functions) in [
        ("NGT.json", "NGT", NGT_FUNCTIONS),
        ("GroupsManager.json", "GroupsManager", GROUPS_MANAGER_FUNCTIONS),
        ("MarketsManager.json", "MarketsManager", MARKETS_MANAGER_FUNCTIONS),
    ] {
        std::fs::write(contracts.join(file), artifact_json(name, functions)).unwrap();
    }
    root
}

/// Configuration text pointing at `ledger`'s contracts.
pub fn config_toml(ledger: &FakeLedger, project_dir: &std::path::Path) -> String {
    format!(
        r#"
[client]
name = "test-client"

[provider]
kind = "http"
url = "http://127.0.0.1:8545"

[wallets]
owner = {OWNER}
dso = {DSO}
player = {PLAYER}
referee = {REFEREE}

[contracts]
project_dir = '{project}'

[contracts.ngt]
address = "{ngt}"
file_name = "NGT.json"

[contracts.groups_manager]
address = "{groups}"
file_name = "GroupsManager.json"

[contracts.markets_manager]
file_name = "MarketsManager.json"

[market]
market_type = 2
max_lower = 10
max_upper = 20
revenue_factor = 2
penalty_factor = 3
dso_staking = 50
player_staking = 50
perc_referee = 10

[tokens.minting]
dso = 1000
player = 500
referee = 200

[tokens.allowance]
dso_to_market = 1000
player_to_market = 500

[simulation]
min_power = 5
max_power = 25
"#,
        project = project_dir.display(),
        ngt = ledger.ngt.to_checksum(None),
        groups = ledger.groups_manager.to_checksum(None),
    )
}

pub fn test_config(ledger: &FakeLedger) -> AppConfig {
    parse_config(&config_toml(ledger, &project_dir())).unwrap()
}

// ---- Log capture ----

/// Collects formatted log lines emitted on the current thread.
#[derive(Debug, Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogCapture {
    /// Install as the thread's default subscriber until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}
