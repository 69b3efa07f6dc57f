use core::cmp::Ordering;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::attributes::CardAttributes;
use crate::vitality::compute_vitality;

/// Hard cap on exchanges in one battle, so a fight between two walls of
/// defense still terminates.
pub const MAX_TURNS: u32 = 100;
/// Chance for any single attack to land critically
pub const CRIT_CHANCE: f64 = 0.10;
/// Damage multiplier on a critical hit
pub const CRIT_MULTIPLIER: i32 = 2;
/// Lower bound of the per-attack damage roll, as a fraction of power
pub const DAMAGE_ROLL_MIN: f64 = 0.08;
/// Upper bound of the per-attack damage roll
pub const DAMAGE_ROLL_MAX: f64 = 0.18;
/// Divisor turning defense into flat damage mitigation
pub const DEFENSE_MITIGATION_DIVISOR: i32 = 10;

/// Which corner of the battle a combatant fights from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Challenger,
    Opponent,
}

impl Side {
    pub fn other(&self) -> Side {
        match self {
            Side::Challenger => Side::Opponent,
            Side::Opponent => Side::Challenger,
        }
    }
}

/// Tunable combat mechanics.
///
/// The default enables the full rule set; clearing `critical_hits` or
/// `defense_mitigation` reproduces the plainer rule sets as subsets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatRules {
    pub damage_roll_min: f64,
    pub damage_roll_max: f64,
    pub critical_hits: bool,
    pub crit_chance: f64,
    pub crit_multiplier: i32,
    pub defense_mitigation: bool,
    pub max_turns: u32,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            damage_roll_min: DAMAGE_ROLL_MIN,
            damage_roll_max: DAMAGE_ROLL_MAX,
            critical_hits: true,
            crit_chance: CRIT_CHANCE,
            crit_multiplier: CRIT_MULTIPLIER,
            defense_mitigation: true,
            max_turns: MAX_TURNS,
        }
    }
}

/// One side of a battle: derived vitality plus the stats that drive
/// each exchange.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Combatant {
    pub power: i32,
    pub defense: i32,
    pub vitality: i32,
}

impl Combatant {
    pub fn new(power: i32, defense: i32, vitality: i32) -> Self {
        Self {
            power,
            defense,
            vitality,
        }
    }

    /// Derive a combatant from card attributes, vitality included.
    pub fn from_attributes(attrs: &CardAttributes) -> Self {
        Self {
            power: attrs.power,
            defense: attrs.defense,
            vitality: compute_vitality(attrs),
        }
    }
}

/// One attack, with running vitality snapshots for both sides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    /// 1-based position of this attack in the battle
    pub turn: u32,
    pub attacker: Side,
    pub damage: i32,
    pub critical: bool,
    pub challenger_vitality: i32,
    pub opponent_vitality: i32,
}

/// A finished battle. Immutable; owned by whoever asked for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BattleResult {
    pub starting_challenger_vitality: i32,
    pub starting_opponent_vitality: i32,
    pub final_challenger_vitality: i32,
    pub final_opponent_vitality: i32,
    pub exchanges: Vec<Exchange>,
    /// `None` is a tie.
    pub winner: Option<Side>,
}

/// Run a battle to completion, recording every exchange.
///
/// Turns alternate starting with the challenger. Each attack deals
/// `power * roll` damage where the roll is uniform over the rules'
/// range, doubled on a critical hit, reduced by a tenth of the
/// defender's defense, and floored at 1 so every exchange makes
/// progress. A defender dropping to 0 ends the battle on the spot with
/// no retaliation turn. If `rules.max_turns` exchanges pass without a
/// knockout, the higher remaining vitality wins; equal is a tie.
pub fn resolve_battle<R: Rng>(
    challenger: Combatant,
    opponent: Combatant,
    rules: &CombatRules,
    rng: &mut R,
) -> BattleResult {
    let mut challenger_vitality = challenger.vitality;
    let mut opponent_vitality = opponent.vitality;
    let mut exchanges: Vec<Exchange> = Vec::new();
    let mut attacker = Side::Challenger;

    while challenger_vitality > 0
        && opponent_vitality > 0
        && (exchanges.len() as u32) < rules.max_turns
    {
        let (power, defense) = match attacker {
            Side::Challenger => (challenger.power, opponent.defense),
            Side::Opponent => (opponent.power, challenger.defense),
        };

        let roll = rng.gen_range(rules.damage_roll_min..rules.damage_roll_max);
        let critical = rules.critical_hits && rng.gen_bool(rules.crit_chance);
        let multiplier = if critical { rules.crit_multiplier } else { 1 };

        let mut damage = ((power as f64 * roll * multiplier as f64) as i32).max(1);
        if rules.defense_mitigation {
            damage = (damage - defense / DEFENSE_MITIGATION_DIVISOR).max(1);
        }

        match attacker {
            Side::Challenger => opponent_vitality -= damage,
            Side::Opponent => challenger_vitality -= damage,
        }

        exchanges.push(Exchange {
            turn: exchanges.len() as u32 + 1,
            attacker,
            damage,
            critical,
            challenger_vitality: challenger_vitality.max(0),
            opponent_vitality: opponent_vitality.max(0),
        });

        attacker = attacker.other();
    }

    let final_challenger_vitality = challenger_vitality.max(0);
    let final_opponent_vitality = opponent_vitality.max(0);
    let winner = match final_challenger_vitality.cmp(&final_opponent_vitality) {
        Ordering::Greater => Some(Side::Challenger),
        Ordering::Less => Some(Side::Opponent),
        Ordering::Equal => None,
    };

    BattleResult {
        starting_challenger_vitality: challenger.vitality,
        starting_opponent_vitality: opponent.vitality,
        final_challenger_vitality,
        final_opponent_vitality,
        exchanges,
        winner,
    }
}

/// Seeded entry point: builds a [`StdRng`] so callers holding only a
/// seed (session resolution, the sim CLI) replay deterministically.
pub fn resolve_battle_seeded(
    challenger: Combatant,
    opponent: Combatant,
    rules: &CombatRules,
    seed: u64,
) -> BattleResult {
    let mut rng = StdRng::seed_from_u64(seed);
    resolve_battle(challenger, opponent, rules, &mut rng)
}
