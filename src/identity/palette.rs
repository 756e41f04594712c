//! Name and color pools for newly connected identities

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "Swift", "Clever", "Brave", "Bright", "Quick", "Smart", "Bold", "Cool", "Epic", "Fire",
    "Mega", "Super", "Ultra", "Hyper", "Turbo", "Ninja", "Cosmic", "Stellar", "Mystic",
    "Phoenix", "Dragon", "Thunder", "Lightning", "Frost", "Blaze", "Storm", "Crystal",
    "Golden", "Silver", "Royal",
];

const NOUNS: &[&str] = &[
    "Player", "Gamer", "Hero", "Champion", "Master", "Wizard", "Knight", "Warrior", "Explorer",
    "Hunter", "Seeker", "Raider", "Guardian", "Defender", "Conqueror", "Pioneer", "Voyager",
    "Ranger", "Scout", "Captain", "Commander", "Admiral", "Fox", "Wolf", "Eagle", "Hawk",
    "Tiger", "Lion", "Bear", "Shark",
];

/// Curated cell colors, readable on both light and dark boards.
const COLORS: &[&str] = &[
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F7DC6F",
    "#BB8FCE", "#85C1E9", "#F8C471", "#82E0AA", "#F1948A", "#85929E", "#D7BDE2", "#A9DFBF",
    "#F9E79F", "#D5A6BD", "#A3E4D7", "#FADBD8", "#E8DAEF", "#D6EAF8", "#FCF3CF", "#EBDEF0",
    "#D1F2EB", "#FDF2E9", "#EAEDED", "#FEF9E7", "#F4F6F6", "#1B2631",
];

const NAME_ATTEMPTS: usize = 8;

/// Generate a display name, preferring one no connected identity is using.
/// After a bounded number of attempts a colliding name is accepted;
/// uniqueness is a preference, not a guarantee.
pub fn generate_name<R: Rng>(rng: &mut R, in_use: &HashSet<String>) -> String {
    let mut name = random_name(rng);
    for _ in 1..NAME_ATTEMPTS {
        if !in_use.contains(&name) {
            break;
        }
        name = random_name(rng);
    }
    name
}

fn random_name<R: Rng>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).unwrap_or(&"Swift");
    let noun = NOUNS.choose(rng).unwrap_or(&"Player");
    let number = rng.gen_range(1..1000);
    format!("{adjective}{noun}{number}")
}

/// Pick a palette color not currently in use; once the palette is exhausted,
/// fall back to a procedurally generated bright color. The fallback is not
/// guaranteed unique.
pub fn pick_color<R: Rng>(rng: &mut R, in_use: &HashSet<String>) -> String {
    let available: Vec<&&str> = COLORS.iter().filter(|c| !in_use.contains(**c)).collect();
    match available.choose(rng) {
        Some(color) => (**color).to_string(),
        None => fallback_color(rng),
    }
}

fn fallback_color<R: Rng>(rng: &mut R) -> String {
    let hue = rng.gen_range(0..360);
    let saturation = rng.gen_range(70..100);
    let lightness = rng.gen_range(45..70);
    format!("hsl({hue}, {saturation}%, {lightness}%)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_color_prefers_unused_palette_entries() {
        let mut rng = rand::thread_rng();
        let mut in_use: HashSet<String> = COLORS.iter().map(|c| c.to_string()).collect();
        in_use.remove("#4ECDC4");
        assert_eq!(pick_color(&mut rng, &in_use), "#4ECDC4");
    }

    #[test]
    fn pick_color_falls_back_when_palette_exhausted() {
        let mut rng = rand::thread_rng();
        let in_use: HashSet<String> = COLORS.iter().map(|c| c.to_string()).collect();
        let color = pick_color(&mut rng, &in_use);
        assert!(color.starts_with("hsl("), "expected procedural color, got {color}");
    }

    #[test]
    fn generated_names_have_pool_shape() {
        let mut rng = rand::thread_rng();
        let name = generate_name(&mut rng, &HashSet::new());
        assert!(ADJECTIVES.iter().any(|a| name.starts_with(a)));
        assert!(name.chars().last().is_some_and(|c| c.is_ascii_digit()));
    }
}
