//! Market domain types.
//!
//! Market type codes, start-time derivation, the opening parameters
//! bundle and the local phase tracker that keeps the lifecycle moving
//! strictly forward. Pure logic only: nothing here talks to the chain.

use chrono::{DateTime, Datelike, Days, Months, NaiveTime, Timelike, Utc};
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Market granularity as encoded on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketType {
    /// Calendar-month market (code 0).
    Monthly,
    /// Calendar-day market (code 1).
    Daily,
    /// One-hour market (code 2).
    Hourly,
}

impl MarketType {
    /// The on-chain integer code.
    pub fn code(self) -> u8 {
        match self {
            Self::Monthly => 0,
            Self::Daily => 1,
            Self::Hourly => 2,
        }
    }

    /// First instant of the next market period after `now`.
    ///
    /// - Monthly: 00:00:00 UTC on day 1 of the month following `now`'s month.
    /// - Daily: 00:00:00 UTC of the next calendar day.
    /// - Hourly: top of the next hour.
    pub fn next_start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive();
        match self {
            Self::Monthly => {
                let first_of_month = today - Days::new(u64::from(today.day0()));
                (first_of_month + Months::new(1))
                    .and_time(NaiveTime::MIN)
                    .and_utc()
            }
            Self::Daily => (today + Days::new(1)).and_time(NaiveTime::MIN).and_utc(),
            Self::Hourly => {
                let shifted = now + chrono::Duration::hours(1);
                (shifted.date_naive().and_time(NaiveTime::MIN)
                    + chrono::Duration::hours(i64::from(shifted.hour())))
                .and_utc()
            }
        }
    }
}

impl TryFrom<u8> for MarketType {
    type Error = ClientError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Monthly),
            1 => Ok(Self::Daily),
            2 => Ok(Self::Hourly),
            other => Err(ClientError::UnsupportedMarketType(other)),
        }
    }
}

impl std::fmt::Display for MarketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Daily => write!(f, "daily"),
            Self::Hourly => write!(f, "hourly"),
        }
    }
}

/// Start of a market, as both an instant and the epoch seconds sent on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketStart {
    pub at: DateTime<Utc>,
    pub epoch: u64,
}

impl MarketStart {
    /// Derive the start of the next market of the given type.
    pub fn derive(now: DateTime<Utc>, market_type: MarketType) -> Self {
        let at = market_type.next_start(now);
        Self {
            at,
            epoch: u64::try_from(at.timestamp()).unwrap_or_default(),
        }
    }
}

/// Parameters a DSO opens a market with. Fixed once the market is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketParameters {
    /// Raw type code; only 0, 1 and 2 are accepted when opening.
    pub market_type: u8,
    /// Maximum lower power bound.
    pub max_lower: u64,
    /// Maximum upper power bound.
    pub max_upper: u64,
    pub revenue_factor: u64,
    pub penalty_factor: u64,
    /// Tokens staked by the DSO at opening.
    pub dso_staking: u64,
    /// Tokens staked by the player when confirming.
    pub player_staking: u64,
    /// Referee share, in percent.
    pub perc_referee: u64,
}

/// Where a market stands in its forward-only lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MarketPhase {
    Opened,
    OpeningConfirmed,
    Settled,
    SettlementConfirmed,
}

impl MarketPhase {
    /// The only phase reachable from this one.
    pub fn successor(self) -> Option<Self> {
        match self {
            Self::Opened => Some(Self::OpeningConfirmed),
            Self::OpeningConfirmed => Some(Self::Settled),
            Self::Settled => Some(Self::SettlementConfirmed),
            Self::SettlementConfirmed => None,
        }
    }
}

impl std::fmt::Display for MarketPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Opened => write!(f, "opened"),
            Self::OpeningConfirmed => write!(f, "confirmed-open"),
            Self::Settled => write!(f, "settled"),
            Self::SettlementConfirmed => write!(f, "confirmed-settled"),
        }
    }
}

/// A market this client opened, with its locally tracked phase.
///
/// Created only from a confirmed opening. The phase advances one step
/// at a time and only after the corresponding transaction is mined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedMarket {
    pub idx: U256,
    pub player: Address,
    pub start: MarketStart,
    pub market_type: MarketType,
    phase: MarketPhase,
    power_peak: Option<u64>,
}

impl TrackedMarket {
    pub fn opened(idx: U256, player: Address, start: MarketStart, market_type: MarketType) -> Self {
        Self {
            idx,
            player,
            start,
            market_type,
            phase: MarketPhase::Opened,
            power_peak: None,
        }
    }

    pub fn phase(&self) -> MarketPhase {
        self.phase
    }

    /// Power peak settled into this market, once settlement is mined.
    pub fn power_peak(&self) -> Option<u64> {
        self.power_peak
    }

    /// Refuse a step unless the market sits exactly one phase before `target`.
    pub fn ensure_next(&self, target: MarketPhase, attempted: &'static str) -> Result<(), ClientError> {
        if self.phase.successor() == Some(target) {
            Ok(())
        } else {
            Err(ClientError::OutOfSequence {
                idx: self.idx,
                phase: self.phase,
                attempted,
            })
        }
    }

    /// Record a mined step. Callers check `ensure_next` first.
    pub(crate) fn advance(&mut self, target: MarketPhase) {
        debug_assert_eq!(self.phase.successor(), Some(target));
        self.phase = target;
    }

    pub(crate) fn record_power_peak(&mut self, power_peak: u64) {
        self.power_peak = Some(power_peak);
    }
}
