use pfpb_battle::{CardAttributes, Rarity};

/// Rarity keywords in precedence order; the ultra spellings must come
/// before plain "rare", which they contain.
const RARITY_KEYWORDS: &[(&str, Rarity)] = &[
    ("legendary", Rarity::Legendary),
    ("ultra-rare", Rarity::UltraRare),
    ("ultra rare", Rarity::UltraRare),
    ("ultrarare", Rarity::UltraRare),
    ("rare", Rarity::Rare),
    ("common", Rarity::Common),
];

/// Power and defense read at most this many digits.
const STAT_DIGITS: usize = 3;
/// Serial numbers read at most this many digits.
const SERIAL_DIGITS: usize = 4;

/// Parse power, defense, rarity, and serial out of recognized card
/// text.
///
/// Labeled values win ("Power: 120", "DEF 44", "Serial #345"); failing
/// that, power and defense fall back to the first and second bare
/// numbers in reading order, and serial to the smallest number seen
/// (scarce cards advertise low serials). With nothing to go on, each
/// field takes its fallback value. Every result is clamped into the
/// accepted attribute ranges, so this function cannot produce an
/// invalid record.
pub fn parse_stats_text(text: &str) -> CardAttributes {
    let lower = text.to_lowercase();

    let rarity = RARITY_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, rarity)| *rarity)
        .unwrap_or(Rarity::Common);

    let stat_numbers = standalone_numbers(&lower, STAT_DIGITS);

    let power = labeled_number(&lower, &["power", "attack", "atk"], STAT_DIGITS)
        .or_else(|| stat_numbers.first().copied())
        .unwrap_or(50);

    let defense = labeled_number(&lower, &["defense", "defence", "def"], STAT_DIGITS)
        .or_else(|| stat_numbers.get(1).copied())
        .unwrap_or(50);

    let serial = labeled_number(&lower, &["serial", "#", "s/n"], SERIAL_DIGITS)
        .or_else(|| standalone_numbers(&lower, SERIAL_DIGITS).into_iter().min())
        .unwrap_or(1000);

    CardAttributes::clamped(power, defense, rarity, serial)
}

/// Number following any of `labels`, tried in order. A label occurrence
/// counts only when digits appear right after it (past ':', '#', and
/// spaces), the way stats are printed on cards.
fn labeled_number(lower: &str, labels: &[&str], max_digits: usize) -> Option<i32> {
    labels
        .iter()
        .find_map(|label| number_after(lower, label, max_digits))
}

fn number_after(lower: &str, label: &str, max_digits: usize) -> Option<i32> {
    let mut search_from = 0;
    while let Some(pos) = lower[search_from..].find(label) {
        let after = search_from + pos + label.len();
        let rest = lower[after..].trim_start_matches(|c: char| c == ':' || c == '#' || c.is_whitespace());
        let digits: String = rest
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .take(max_digits)
            .collect();
        if !digits.is_empty() {
            return digits.parse().ok();
        }
        search_from = after;
    }
    None
}

/// Bare numbers in reading order: maximal digit runs not glued to
/// letters and no longer than `max_digits`.
fn standalone_numbers(lower: &str, max_digits: usize) -> Vec<i32> {
    let bytes = lower.as_bytes();
    let mut numbers = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let bounded_left = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
        let bounded_right = i == bytes.len() || !bytes[i].is_ascii_alphanumeric();
        if bounded_left && bounded_right && i - start <= max_digits {
            if let Ok(value) = lower[start..i].parse() {
                numbers.push(value);
            }
        }
    }
    numbers
}
