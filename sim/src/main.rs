//! Monte-Carlo battle runner: pit two stat lines against each other
//! over many seeds and report the win split. Useful for eyeballing how
//! rarity, serials, and the optional mechanics shift the odds.

use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;

use pfpb_battle::{
    resolve_battle_seeded, CardAttributes, CombatRules, Combatant, Rarity, Side,
};

#[derive(Parser, Debug)]
#[command(
    name = "pfpb-sim",
    about = "Monte-Carlo battle simulation for PFP Battle"
)]
struct Args {
    /// Challenger stats as power,defense,rarity,serial
    #[arg(long, value_parser = parse_card)]
    challenger: CardAttributes,

    /// Opponent stats as power,defense,rarity,serial
    #[arg(long, value_parser = parse_card)]
    opponent: CardAttributes,

    /// Number of battles to simulate
    #[arg(long, default_value_t = 10_000)]
    battles: u64,

    /// Base seed; battle i runs on seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Disable critical hits
    #[arg(long)]
    no_crits: bool,

    /// Disable defense mitigation
    #[arg(long)]
    no_defense: bool,
}

fn parse_card(s: &str) -> Result<CardAttributes, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err("expected power,defense,rarity,serial".to_string());
    }
    let power: i32 = parts[0].parse().map_err(|_| format!("bad power: {}", parts[0]))?;
    let defense: i32 = parts[1].parse().map_err(|_| format!("bad defense: {}", parts[1]))?;
    let rarity: Rarity = parts[2].parse().map_err(|e| format!("{e}"))?;
    let serial: i32 = parts[3].parse().map_err(|_| format!("bad serial: {}", parts[3]))?;
    CardAttributes::new(power, defense, rarity, serial).map_err(|e| e.to_string())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    battles: u64,
    challenger_vitality: i32,
    opponent_vitality: i32,
    challenger_wins: u64,
    opponent_wins: u64,
    ties: u64,
    challenger_win_rate: f64,
    average_exchanges: f64,
}

fn main() {
    let args = Args::parse();
    let rules = CombatRules {
        critical_hits: !args.no_crits,
        defense_mitigation: !args.no_defense,
        ..CombatRules::default()
    };
    let challenger = Combatant::from_attributes(&args.challenger);
    let opponent = Combatant::from_attributes(&args.opponent);

    let (challenger_wins, opponent_wins, ties, exchanges) = (0..args.battles)
        .into_par_iter()
        .map(|i| {
            let result =
                resolve_battle_seeded(challenger, opponent, &rules, args.seed.wrapping_add(i));
            let exchanges = result.exchanges.len() as u64;
            match result.winner {
                Some(Side::Challenger) => (1u64, 0u64, 0u64, exchanges),
                Some(Side::Opponent) => (0, 1, 0, exchanges),
                None => (0, 0, 1, exchanges),
            }
        })
        .reduce(
            || (0, 0, 0, 0),
            |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2, a.3 + b.3),
        );

    let denominator = args.battles.max(1) as f64;
    let summary = Summary {
        battles: args.battles,
        challenger_vitality: challenger.vitality,
        opponent_vitality: opponent.vitality,
        challenger_wins,
        opponent_wins,
        ties,
        challenger_win_rate: challenger_wins as f64 / denominator,
        average_exchanges: exchanges as f64 / denominator,
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&summary).expect("summary serializes")
    );
}
