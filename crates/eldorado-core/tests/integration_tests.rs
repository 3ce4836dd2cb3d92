//! Integration tests for the Eldorado engine.
//!
//! These tests drive whole episodes through the public API, from reset to the
//! final rewards, and check the engine's invariants after every step.

use eldorado_core::shop::MARKET_SLOTS;
use eldorado_core::*;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Plays cards until a move gets closer to the goal, never buys anything
fn greedy_action(game: &Game, player: PlayerId) -> Action {
    let mask = game.action_mask(player).unwrap();
    let p = game.player(player).unwrap();

    if p.phase == TurnPhase::Buying {
        return Action::pass();
    }

    let goals: Vec<HexCoord> = game
        .map()
        .cells()
        .filter(|(_, hex)| hex.is_end())
        .map(|(coord, _)| coord)
        .collect();
    let distance = |coord: HexCoord| {
        goals
            .iter()
            .map(|goal| coord.distance_to(goal))
            .min()
            .unwrap_or(0)
    };

    let here = game.map().player_location(player).unwrap();
    let best = Direction::ALL
        .into_iter()
        .filter(|dir| mask.can_move(*dir))
        .min_by_key(|dir| distance(here.neighbor(*dir)));
    if let Some(direction) = best {
        if distance(here.neighbor(direction)) < distance(here) {
            return Action::move_to(direction);
        }
    }

    match CardType::ALL.into_iter().find(|kind| mask.can_play(*kind)) {
        Some(kind) => Action::play(kind),
        None => Action::pass(),
    }
}

/// Uniform choice among the values each mask component allows
fn random_action<R: Rng>(game: &Game, player: PlayerId, rng: &mut R) -> Action {
    let mask = game.action_mask(player).unwrap();
    let pick = |allowed: &[bool], rng: &mut R| {
        allowed
            .iter()
            .enumerate()
            .filter(|(_, ok)| **ok)
            .map(|(i, _)| i)
            .choose(rng)
            .unwrap_or(0)
    };

    let mut action = Action::pass();
    action.play = pick(&mask.play, rng).checked_sub(1).and_then(CardType::from_index);
    action.use_special = pick(&mask.special, rng) == 1;
    action.movement = pick(&mask.movement, rng)
        .checked_sub(1)
        .and_then(Direction::from_index);
    action.buy = pick(&mask.shop, rng).checked_sub(1);
    for (slot, &max) in action.remove.iter_mut().zip(mask.remove.iter()) {
        *slot = rng.gen_range(0..=max);
    }
    action
}

fn check_invariants(game: &Game) {
    for player in game.players() {
        assert_eq!(
            player.deck.len(),
            player.deck.owned_total(),
            "player {} lost track of a card",
            player.id
        );
        let location = game.map().player_location(player.id).unwrap();
        assert!(game.map().get(&location).is_some());
        assert!(player.resources.coins <= Coins::MAX);
    }
    let shop = game.shop();
    assert!(shop.market_count() <= MARKET_SLOTS);
    for index in 0..SHOP_TYPES {
        assert!(shop.stock(index) <= 3);
        if shop.stock(index) == 0 {
            assert!(!shop.is_in_market(index));
        }
    }
}

/// Run an episode to the end, returning every outcome
fn run_episode<F>(game: &mut Game, mut policy: F) -> Vec<StepOutcome>
where
    F: FnMut(&Game, PlayerId) -> Action,
{
    let mut outcomes = Vec::new();
    loop {
        let player = game.current_player();
        let action = policy(&*game, player);
        let outcome = match game.step(player, &action) {
            Ok(outcome) => outcome,
            Err(e) => panic!("step {} rejected {action:?}: {e}", game.steps()),
        };
        check_invariants(game);
        let done = outcome.done;
        outcomes.push(outcome);
        if done {
            return outcomes;
        }
    }
}

fn assert_rewards_consistent(game: &Game) {
    let rewards = game.rewards();
    let winners = game.players().iter().filter(|p| p.has_won).count() as i32;
    let n = game.player_count() as i32;
    if winners == 0 {
        assert!(game.is_truncated());
        assert!(rewards.iter().all(|&r| r == -1));
    } else {
        for (player, reward) in game.players().iter().zip(&rewards) {
            let expected = if player.has_won { n - winners } else { -winners };
            assert_eq!(*reward, expected);
        }
    }
}

#[test]
fn test_scripted_two_player_episode() {
    let config = GameConfig::new(1, 2, 2, Difficulty::Easy).with_max_steps(5_000);
    let mut game = Game::new(config).unwrap();
    let outcomes = run_episode(&mut game, greedy_action);

    let last = outcomes.last().unwrap();
    assert!(last.done);
    assert!(!last.truncated);
    assert_eq!(last.events, vec![GameEvent::EpisodeFinished { truncated: false }]);

    let rewards = game.rewards();
    assert!(
        rewards == vec![1, -1] || rewards == vec![-1, 1],
        "unexpected rewards {rewards:?}"
    );
    let goals = outcomes
        .iter()
        .flat_map(|outcome| &outcome.events)
        .filter(|event| matches!(event, GameEvent::ReachedGoal { .. }))
        .count();
    assert_eq!(goals, 1);
    assert_eq!(game.episode_info().winners.len(), 1);
    assert_rewards_consistent(&game);
}

#[test]
fn test_scripted_episode_hits_the_step_cap() {
    let config = GameConfig::new(2024, 2, 2, Difficulty::Easy).with_max_steps(5_000);
    let mut game = Game::new(config).unwrap();
    let outcomes = run_episode(&mut game, greedy_action);

    let last = outcomes.last().unwrap();
    assert_eq!(outcomes.len(), 5_000);
    assert!(last.truncated);
    assert!(last
        .events
        .contains(&GameEvent::EpisodeFinished { truncated: true }));
    assert_eq!(game.rewards(), vec![-1, -1]);
    assert!(game.episode_info().winners.is_empty());
}

#[test]
fn test_episodes_are_reproducible() {
    let run = || {
        let config = GameConfig::new(99, 3, 4, Difficulty::Hard).with_max_steps(800);
        let mut game = Game::new(config).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let outcomes = run_episode(&mut game, |g, p| random_action(g, p, &mut rng));
        (outcomes, game.rewards(), game.episode_info())
    };
    assert_eq!(run(), run());
}

#[test]
fn test_random_legal_play_never_errors() {
    for seed in 0..12 {
        let difficulty = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard][seed as usize % 3];
        let players = (seed % 4 + 1) as u8;
        let config = GameConfig::new(seed, players, 3, difficulty).with_max_steps(1_500);
        let mut game = Game::new(config).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed + 1000);

        let outcomes = run_episode(&mut game, |g, p| random_action(g, p, &mut rng));
        assert!(outcomes.last().unwrap().done);
        assert_rewards_consistent(&game);

        let info = game.episode_info();
        assert_eq!(info.steps as usize, outcomes.len());
        assert_eq!(info.players.len(), players as usize);
        let total_turns: u32 = info.players.iter().map(|p| p.turns).sum();
        assert_eq!(total_turns, info.turns);
    }
}

#[test]
fn test_override_applies_to_exactly_one_decision() {
    // Find an episode where some player plays a special card with a follow-up
    for seed in 0..40 {
        let config = GameConfig::new(seed, 2, 3, Difficulty::Medium).with_max_steps(3_000);
        let mut game = Game::new(config).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        while !game.is_done() {
            let player = game.current_player();
            let action = random_action(&game, player, &mut rng);
            let had_override = game.pending_override().is_some();
            let outcome = game.step(player, &action).unwrap();

            if had_override {
                assert!(game.pending_override().is_none());
                return;
            }
            if game.pending_override().is_some() {
                assert!(outcome
                    .events
                    .iter()
                    .any(|e| matches!(e, GameEvent::SpecialUsed { .. })));
                assert_eq!(game.current_player(), player);
            }
        }
    }
    panic!("no special card with a follow-up was played in 40 episodes");
}

#[test]
fn test_single_use_cards_never_come_back() {
    let config = GameConfig::new(5, 2, 3, Difficulty::Easy).with_max_steps(2_000);
    let mut game = Game::new(config).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(77);

    while !game.is_done() {
        let player = game.current_player();
        let action = random_action(&game, player, &mut rng);
        let before = game.player(player).unwrap().deck.owned_counts();
        let outcome = game.step(player, &action).unwrap();
        let after = game.player(player).unwrap().deck.owned_counts();

        for event in &outcome.events {
            if let GameEvent::CardPlayed { card, .. } | GameEvent::SpecialUsed { card, .. } = event {
                let archetype = card.archetype();
                let removed = archetype.single_use
                    && !(archetype.special.is_some() && matches!(event, GameEvent::CardPlayed { .. }));
                let bought = outcome
                    .events
                    .iter()
                    .any(|e| matches!(e, GameEvent::CardBought { card: c, .. } | GameEvent::CardAcquired { card: c, .. } if c == card));
                if removed && !bought {
                    assert_eq!(after[card.index()] + 1, before[card.index()]);
                }
            }
        }
    }
}

#[test]
fn test_reset_starts_a_fresh_episode() {
    let mut game = Game::new(GameConfig::new(8, 2, 2, Difficulty::Easy)).unwrap();
    game.step(0, &Action::pass()).unwrap();
    game.step(0, &Action::pass()).unwrap();
    assert_eq!(game.current_player(), 1);

    game.reset(8, 2, 2, Difficulty::Easy).unwrap();
    assert_eq!(game.current_player(), 0);
    assert_eq!(game.steps(), 0);
    assert_eq!(game.turns(), 0);

    let fresh = Game::new(GameConfig::new(8, 2, 2, Difficulty::Easy)).unwrap();
    assert_eq!(game.observe(0).unwrap(), fresh.observe(0).unwrap());
}

#[test]
fn test_observation_shapes() {
    let game = Game::new(GameConfig::new(4, 4, 5, Difficulty::Hard)).unwrap();
    let obs = game.observe(2).unwrap();

    assert_eq!(obs.map.len(), game.map().cell_count());
    assert_eq!(obs.phase, TurnPhase::Inactive);
    assert_eq!(obs.hand.iter().map(|&n| n as usize).sum::<usize>(), HAND_SIZE);
    assert_eq!(obs.owned.iter().map(|&n| n as usize).sum::<usize>(), 8);
    assert_eq!(obs.resources, [0.0; 5]);
    assert_eq!(obs.shop.iter().filter(|slot| slot[1] == 1).count(), MARKET_SLOTS);

    // The observer always sees itself as occupant 1
    let own = game.map().player_location(2).unwrap();
    let index = game
        .map()
        .cells()
        .position(|(coord, _)| coord == own)
        .unwrap();
    assert_eq!(obs.map[index][0], 1);
}
