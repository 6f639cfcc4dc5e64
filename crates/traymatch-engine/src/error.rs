//! Level loading errors.

use std::error::Error;
use std::fmt;

use traymatch_plan::PlanError;

use crate::config::ConfigError;
use crate::level::LevelError;

/// Why [`Game::load`](crate::Game::load) refused to build a level.
///
/// A level that fails to load never starts: no partial board or plan is
/// handed out.
#[derive(Debug, PartialEq)]
pub enum LoadError {
    /// The configuration is invalid.
    Config(ConfigError),
    /// The level description is invalid.
    Level(LevelError),
    /// No valid item allocation was found within the retry budget.
    ///
    /// Whether to regenerate the layout or give up is the caller's call.
    Plan(PlanError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Level(e) => write!(f, "level: {e}"),
            Self::Plan(e) => write!(f, "allocation: {e}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Level(e) => Some(e),
            Self::Plan(e) => Some(e),
        }
    }
}

impl From<ConfigError> for LoadError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<LevelError> for LoadError {
    fn from(e: LevelError) -> Self {
        Self::Level(e)
    }
}

impl From<PlanError> for LoadError {
    fn from(e: PlanError) -> Self {
        Self::Plan(e)
    }
}
