//! Game configuration, validation, and error types.
//!
//! [`GameConfig`] groups every tunable of a running level. The defaults are
//! the values the puzzle was balanced with; [`validate()`](GameConfig::validate)
//! is called by [`Game::load`](crate::Game::load) before anything is built.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use traymatch_plan::{PlanError, PlannerConfig};

// ── ExchangeConfig ─────────────────────────────────────────────────

/// Tuning for pairwise exchanges.
#[derive(Clone, Debug, PartialEq)]
pub struct ExchangeConfig {
    /// Cap on the wrong-color items considered per side. Default: 20.
    pub max_bag_size: usize,
    /// Gap between consecutive trades of one exchange set. Default: 100 ms.
    pub trade_interval: Duration,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            max_bag_size: 20,
            trade_interval: Duration::from_millis(100),
        }
    }
}

// ── TimingConfig ───────────────────────────────────────────────────

/// Suspension-point durations.
#[derive(Clone, Debug, PartialEq)]
pub struct TimingConfig {
    /// Longest wait for one cascade layer to drain. Default: 2 s.
    ///
    /// Must exceed the longest possible exchange,
    /// `(max_bag_size - 1) × trade_interval`, so only a stalled exchange
    /// ever hits it.
    pub drain_timeout: Duration,
    /// Delay between a container completing and leaving the board. Default: 200 ms.
    pub finish_settle: Duration,
    /// Minimum gap between consecutive finish events. Default: 300 ms.
    pub finish_spacing: Duration,
    /// Time spent in `Starting` before play begins. Default: 1 s.
    pub start_delay: Duration,
    /// Finishes closer together than this extend the combo. Default: 2 s.
    pub combo_window: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            drain_timeout: Duration::from_secs(2),
            finish_settle: Duration::from_millis(200),
            finish_spacing: Duration::from_millis(300),
            start_delay: Duration::from_secs(1),
            combo_window: Duration::from_secs(2),
        }
    }
}

// ── GameConfig ─────────────────────────────────────────────────────

/// Every tunable of a level.
#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    /// Allocation planner tuning.
    pub planner: PlannerConfig,
    /// Exchange tuning.
    pub exchange: ExchangeConfig,
    /// Suspension-point durations.
    pub timing: TimingConfig,
    /// Ray length of the unreachability heuristic, in cells. Default: 5.
    pub reach_distance: u32,
    /// Upper bound on cascade sessions run by one settle. Default: 256.
    pub max_sessions_per_settle: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            planner: PlannerConfig::default(),
            exchange: ExchangeConfig::default(),
            timing: TimingConfig::default(),
            reach_distance: 5,
            max_sessions_per_settle: 256,
        }
    }
}

impl GameConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.planner.validate().map_err(ConfigError::Planner)?;
        if self.exchange.max_bag_size == 0 {
            return Err(ConfigError::ZeroBagSize);
        }
        if self.timing.drain_timeout.is_zero() {
            return Err(ConfigError::ZeroDrainTimeout);
        }
        let longest_exchange = self.longest_exchange();
        if longest_exchange >= self.timing.drain_timeout {
            return Err(ConfigError::DrainTooShort {
                longest_exchange,
                drain_timeout: self.timing.drain_timeout,
            });
        }
        if self.max_sessions_per_settle == 0 {
            return Err(ConfigError::ZeroSessionBound);
        }
        Ok(())
    }

    /// Time a full exchange set takes to land all its trades.
    pub fn longest_exchange(&self) -> Duration {
        let gaps = self.exchange.max_bag_size.saturating_sub(1);
        let gaps = u32::try_from(gaps).unwrap_or(u32::MAX);
        self.exchange.trade_interval.saturating_mul(gaps)
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected by [`GameConfig::validate()`].
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// The planner section is invalid.
    Planner(PlanError),
    /// `exchange.max_bag_size` is zero, so no exchange could ever trade.
    ZeroBagSize,
    /// `timing.drain_timeout` is zero, so every layer would stall.
    ZeroDrainTimeout,
    /// A full exchange set outlasts the drain timeout, so ordinary
    /// exchanges would be treated as stalled.
    DrainTooShort {
        /// `(max_bag_size - 1) × trade_interval`.
        longest_exchange: Duration,
        /// The configured drain timeout.
        drain_timeout: Duration,
    },
    /// `max_sessions_per_settle` is zero, so no cascade could run.
    ZeroSessionBound,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planner(e) => write!(f, "planner: {e}"),
            Self::ZeroBagSize => write!(f, "exchange.max_bag_size must be at least 1"),
            Self::ZeroDrainTimeout => write!(f, "timing.drain_timeout must be non-zero"),
            Self::DrainTooShort {
                longest_exchange,
                drain_timeout,
            } => write!(
                f,
                "timing.drain_timeout ({drain_timeout:?}) must exceed the longest exchange \
                 ({longest_exchange:?})"
            ),
            Self::ZeroSessionBound => write!(f, "max_sessions_per_settle must be at least 1"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Planner(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = GameConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.exchange.max_bag_size, 20);
        assert_eq!(cfg.timing.drain_timeout, Duration::from_secs(2));
        assert_eq!(cfg.timing.finish_spacing, Duration::from_millis(300));
        assert_eq!(cfg.reach_distance, 5);
    }

    #[test]
    fn zero_bag_size_rejected() {
        let mut cfg = GameConfig::default();
        cfg.exchange.max_bag_size = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroBagSize));
    }

    #[test]
    fn zero_drain_timeout_rejected() {
        let mut cfg = GameConfig::default();
        cfg.timing.drain_timeout = Duration::ZERO;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroDrainTimeout));
    }

    #[test]
    fn drain_must_outlast_a_full_exchange() {
        let mut cfg = GameConfig::default();
        assert_eq!(cfg.longest_exchange(), Duration::from_millis(1900));
        cfg.timing.drain_timeout = Duration::from_millis(1900);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DrainTooShort {
                longest_exchange: Duration::from_millis(1900),
                drain_timeout: Duration::from_millis(1900),
            })
        );
        cfg.exchange.max_bag_size = 10;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn planner_errors_chain_as_source() {
        let mut cfg = GameConfig::default();
        cfg.planner.palette_cap = 0;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Planner(PlanError::InvalidConfig { .. })));
        assert!(err.source().is_some());
    }
}
