use crate::attributes::CardAttributes;

/// Serial numbers count down from this value when computing scarcity.
pub const SERIAL_BONUS_CEILING: i32 = 2000;
/// Divisor turning serial scarcity into vitality: serial 1 earns just
/// under 40 points, serial 1999 almost nothing.
pub const SERIAL_BONUS_DIVISOR: i32 = 50;

/// Starting vitality for a card: raw stats plus rarity and scarcity
/// bonuses, never below 1.
///
/// The scarcity bonus is `(2000 - serial) / 50` with the fraction
/// truncated, so lower serials earn more. Total over every valid
/// attribute record; same input, same output.
pub fn compute_vitality(attrs: &CardAttributes) -> i32 {
    let base = attrs.power + attrs.defense;
    let serial_bonus = (SERIAL_BONUS_CEILING - attrs.serial) / SERIAL_BONUS_DIVISOR;
    (base + attrs.rarity.vitality_bonus() + serial_bonus).max(1)
}
