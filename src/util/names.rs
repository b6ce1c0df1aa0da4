//! Display name helpers

use rand::seq::SliceRandom;
use rand::Rng;

const ADJECTIVES: [&str; 15] = [
    "Brave", "Swift", "Mighty", "Clever", "Fierce", "Agile", "Nimble", "Sneaky", "Deadly",
    "Rapid", "Silent", "Shadow", "Mystic", "Pixel", "Cyber",
];

const NOUNS: [&str; 15] = [
    "Warrior", "Hunter", "Ninja", "Sniper", "Ranger", "Knight", "Archer", "Rogue", "Soldier",
    "Assassin", "Gunner", "Fighter", "Agent", "Trooper", "Scout",
];

/// Random guest name such as `SwiftNinja42`
pub fn guest_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("Pixel");
    let noun = NOUNS.choose(rng).copied().unwrap_or("Scout");
    format!("{}{}{}", adjective, noun, rng.gen_range(0..100))
}

/// Name given to the n-th bot (1-based)
pub fn bot_name(index: usize) -> String {
    format!("Bot{}", index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn guest_names_are_composed_from_word_lists() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let name = guest_name(&mut rng);
            assert!(ADJECTIVES.iter().any(|a| name.starts_with(a)));
            let digits = name.trim_start_matches(|c: char| !c.is_ascii_digit());
            assert!(digits.parse::<u32>().unwrap() < 100);
        }
    }

    #[test]
    fn bot_names_are_one_based() {
        assert_eq!(bot_name(1), "Bot1");
        assert_eq!(bot_name(15), "Bot15");
    }
}
