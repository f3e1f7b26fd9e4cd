//! Core type aliases, domain primitives, and constants for the auction engine.
//!
//! This crate provides the foundational types and configuration parameters
//! used throughout the workspace.

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Bid amounts and squad budgets, in league credits.
pub type Credits = i32;

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Generic ID wrapper providing compile-time type safety over uuid::Uuid.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
}

impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner()
    }
}
impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

// ============================================================================
// LEAGUE KEYS
// ============================================================================
use serde::Deserialize;
use serde::Serialize;

/// Normalized league alias: trimmed, lower-cased.
/// All per-league tables (auction state, presence, cooldowns, broadcast
/// groups) are keyed by this, so "MyLeague " and "myleague" collide on
/// purpose.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct LeagueKey(String);

impl LeagueKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for LeagueKey {
    fn from(alias: String) -> Self {
        Self(alias.trim().to_lowercase())
    }
}
impl From<&str> for LeagueKey {
    fn from(alias: &str) -> Self {
        Self::from(alias.to_string())
    }
}

impl Display for LeagueKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

// ============================================================================
// PLAYER ROLES
// ============================================================================
/// Catalog role of a player lot. Wire codes follow the catalog import
/// format: P, D, C, A.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "P")]
    Goalkeeper,
    #[serde(rename = "D")]
    Defender,
    #[serde(rename = "C")]
    Midfielder,
    #[serde(rename = "A")]
    Forward,
}

impl Role {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Goalkeeper => "P",
            Self::Defender => "D",
            Self::Midfielder => "C",
            Self::Forward => "A",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "P" => Ok(Self::Goalkeeper),
            "D" => Ok(Self::Defender),
            "C" => Ok(Self::Midfielder),
            "A" => Ok(Self::Forward),
            other => Err(format!("unknown role code: {}", other)),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// TIMING PARAMETERS
// ============================================================================
/// Floor for the configurable per-league countdown (seconds).
pub const MIN_TIMER_SECS: u64 = 2;
/// Default per-league countdown (seconds).
pub const DEFAULT_TIMER_SECS: u64 = 5;
/// Presence entries older than this are reported offline.
pub const LIVENESS_WINDOW: std::time::Duration = std::time::Duration::from_secs(45);
/// Cooldown between accepted buzz actions per league.
pub const BUZZ_COOLDOWN: std::time::Duration = std::time::Duration::from_millis(500);
/// Cooldown between accepted bid actions per league.
pub const BID_COOLDOWN: std::time::Duration = std::time::Duration::from_millis(500);

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register Ctrl+C handler for immediate (non-graceful) termination.
#[cfg(feature = "server")]
pub fn kys() {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.unwrap();
        println!();
        log::warn!("violent interrupt received, exiting immediately");
        std::process::exit(0);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn league_key_normalizes() {
        assert_eq!(LeagueKey::from("  MyLeague "), LeagueKey::from("myleague"));
        assert_eq!(LeagueKey::from("Serie-A").as_str(), "serie-a");
    }
    #[test]
    fn role_round_trips_codes() {
        for code in ["P", "D", "C", "A"] {
            let role: Role = code.parse().unwrap();
            assert_eq!(role.code(), code);
        }
        assert!("X".parse::<Role>().is_err());
        assert_eq!("p".parse::<Role>().unwrap(), Role::Goalkeeper);
    }
}
