//! Uniform random policy over legal actions.

use eldorado_core::{Action, ActionMask, CardType, Direction};
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Samples every action component among the values its mask allows.
///
/// The stream is seeded like the episode but runs on its own ChaCha stream,
/// so the policy never consumes the engine's randomness.
pub struct MaskSampler {
    rng: ChaCha8Rng,
}

impl MaskSampler {
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(1);
        Self { rng }
    }

    pub fn sample(&mut self, mask: &ActionMask) -> Action {
        let play = self.pick(&mask.play);
        let special = self.pick(&mask.special);
        let movement = self.pick(&mask.movement);
        let buy = self.pick(&mask.shop);

        let mut remove = mask.remove;
        for slot in remove.iter_mut() {
            *slot = self.rng.gen_range(0..=*slot);
        }

        Action {
            play: play.checked_sub(1).and_then(CardType::from_index),
            use_special: special == 1,
            remove,
            movement: movement.checked_sub(1).and_then(Direction::from_index),
            buy: buy.checked_sub(1),
        }
    }

    /// Index of a uniformly chosen allowed option; 0 when nothing is allowed
    fn pick(&mut self, allowed: &[bool]) -> usize {
        allowed
            .iter()
            .enumerate()
            .filter(|(_, ok)| **ok)
            .map(|(i, _)| i)
            .choose(&mut self.rng)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eldorado_core::{Difficulty, Game, GameConfig};

    #[test]
    fn test_samples_are_legal() {
        let mut game = Game::new(GameConfig::new(11, 2, 3, Difficulty::Medium)).unwrap();
        let mut sampler = MaskSampler::new(11);

        for _ in 0..300 {
            if game.is_done() {
                break;
            }
            let player = game.current_player();
            let mask = game.action_mask(player).unwrap();
            let action = sampler.sample(&mask);

            if let Some(kind) = action.play {
                assert!(mask.can_play(kind));
            }
            if let Some(direction) = action.movement {
                assert!(mask.can_move(direction));
            }
            if let Some(index) = action.buy {
                assert!(mask.can_buy(index));
            }
            for (count, max) in action.remove.iter().zip(mask.remove.iter()) {
                assert!(count <= max);
            }
            game.step(player, &action).unwrap();
        }
    }

    #[test]
    fn test_same_seed_same_choices() {
        let game = Game::new(GameConfig::new(3, 2, 2, Difficulty::Easy)).unwrap();
        let mask = game.action_mask(0).unwrap();
        let mut a = MaskSampler::new(5);
        let mut b = MaskSampler::new(5);
        for _ in 0..20 {
            assert_eq!(a.sample(&mask), b.sample(&mask));
        }
    }

    #[test]
    fn test_only_option_is_taken() {
        let mut sampler = MaskSampler::new(0);
        assert_eq!(sampler.pick(&[false, false, true]), 2);
        assert_eq!(sampler.pick(&[false; 4]), 0);
    }
}
