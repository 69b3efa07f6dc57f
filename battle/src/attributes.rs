use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest accepted power or defense value
pub const STAT_MIN: i32 = 1;
/// Highest accepted power or defense value
pub const STAT_MAX: i32 = 999;
/// Lowest accepted serial number
pub const SERIAL_MIN: i32 = 1;
/// Highest accepted serial number
pub const SERIAL_MAX: i32 = 1999;

/// Card rarity tiers, scarcest last.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "camelCase")]
pub enum Rarity {
    Common,
    Rare,
    UltraRare,
    Legendary,
}

impl Rarity {
    /// Flat vitality bonus granted by this tier.
    pub fn vitality_bonus(&self) -> i32 {
        match self {
            Rarity::Common => 0,
            Rarity::Rare => 20,
            Rarity::UltraRare => 40,
            Rarity::Legendary => 60,
        }
    }
}

/// A rarity keyword that matches no tier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown rarity: {0}")]
pub struct UnknownRarity(pub String);

impl FromStr for Rarity {
    type Err = UnknownRarity;

    /// Accepts the spellings seen on cards: "Ultra-Rare", "ultra rare"
    /// and "ultrarare" all name the same tier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "common" => Ok(Rarity::Common),
            "rare" => Ok(Rarity::Rare),
            "ultrarare" => Ok(Rarity::UltraRare),
            "legendary" => Ok(Rarity::Legendary),
            _ => Err(UnknownRarity(s.to_string())),
        }
    }
}

/// An attribute value outside its accepted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("power {0} is out of range 1..=999")]
    PowerOutOfRange(i32),
    #[error("defense {0} is out of range 1..=999")]
    DefenseOutOfRange(i32),
    #[error("serial {0} is out of range 1..=1999")]
    SerialOutOfRange(i32),
}

/// The four stats read off a card.
///
/// Immutable once built; both constructors guarantee every field sits
/// inside its accepted range, so the vitality and combat code never
/// re-validates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardAttributes {
    pub power: i32,
    pub defense: i32,
    pub rarity: Rarity,
    pub serial: i32,
}

impl CardAttributes {
    /// Build attributes, rejecting any out-of-range field. Manual stat
    /// entry goes through here.
    pub fn new(
        power: i32,
        defense: i32,
        rarity: Rarity,
        serial: i32,
    ) -> Result<Self, AttributeError> {
        if !(STAT_MIN..=STAT_MAX).contains(&power) {
            return Err(AttributeError::PowerOutOfRange(power));
        }
        if !(STAT_MIN..=STAT_MAX).contains(&defense) {
            return Err(AttributeError::DefenseOutOfRange(defense));
        }
        if !(SERIAL_MIN..=SERIAL_MAX).contains(&serial) {
            return Err(AttributeError::SerialOutOfRange(serial));
        }
        Ok(Self {
            power,
            defense,
            rarity,
            serial,
        })
    }

    /// Build attributes, clamping each field into range. Heuristic
    /// extraction goes through here, since text recognition can read
    /// wild numbers off a card.
    pub fn clamped(power: i32, defense: i32, rarity: Rarity, serial: i32) -> Self {
        Self {
            power: power.clamp(STAT_MIN, STAT_MAX),
            defense: defense.clamp(STAT_MIN, STAT_MAX),
            rarity,
            serial: serial.clamp(SERIAL_MIN, SERIAL_MAX),
        }
    }
}

impl Default for CardAttributes {
    /// The fallback record substituted when extraction fails.
    fn default() -> Self {
        Self {
            power: 50,
            defense: 50,
            rarity: Rarity::Common,
            serial: 1000,
        }
    }
}
