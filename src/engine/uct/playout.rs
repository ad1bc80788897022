use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::engine::config::EngineConfig;
use crate::engine::field::Field;
use crate::engine::player::Player;

/// Plays a uniformly random game to completion (or until the generated
/// move list runs dry) from `field`'s current position, then undoes every
/// move it made so the caller's board is left untouched. Returns the
/// winner, or `None` for a draw.
pub fn play_random_game(field: &mut Field, rng: &mut StdRng, config: &EngineConfig, komi: f64) -> Option<Player> {
    let mut moves = generate_possible_moves(field, config.uct_radius);
    moves.shuffle(rng);

    let mut putted = 0;
    for pos in moves {
        if field.cell(pos).putting_allowed() {
            field.do_step(pos);
            putted += 1;
        }
    }

    let winner = winner_from_score(field, komi);

    for _ in 0..putted {
        field.undo_step();
    }

    winner
}

/// `field.score()` is Red's capture count minus Black's; `komi` is a signed
/// handicap subtracted from it before comparing to zero, per the dynamic
/// komi adjustment described in the search design (a positive komi makes
/// Red's position look `komi` points worse than its raw score, compensating
/// for a lead the search has started treating as comfortable).
pub fn winner_from_score(field: &Field, komi: f64) -> Option<Player> {
    let adjusted = field.score() as f64 - komi;
    if adjusted > 0.0 {
        Some(Player::Red)
    } else if adjusted < 0.0 {
        Some(Player::Black)
    } else {
        None
    }
}

/// BFS outward from every placed stone over the 4-connected neighbourhood
/// (so `dist` tracks true Manhattan distance, per `Field::manhattan_distance`),
/// up to `radius` steps, collecting every still-playable point reached along
/// the way. On an empty board (no stones placed yet) falls back to the board
/// centre.
pub fn generate_possible_moves(field: &Field, radius: i32) -> Vec<usize> {
    let mut visited = vec![false; field.len()];
    let mut queue = VecDeque::new();
    let mut moves = Vec::new();
    let mut any_seed = false;

    for pos in field.min_pos()..=field.max_pos() {
        if field.cell(pos).is_put() {
            queue.push_back((pos, 0));
            any_seed = true;
        }
    }

    if !any_seed {
        let centre = field.to_pos(field.width() / 2, field.height() / 2);
        return vec![centre];
    }

    while let Some((pos, dist)) = queue.pop_front() {
        if field.cell(pos).putting_allowed() {
            moves.push(pos);
        }
        if dist >= radius {
            continue;
        }
        for next in [field.n(pos), field.s(pos), field.w(pos), field.e(pos)] {
            if field.cell(next).putting_allowed() && !visited[next] {
                visited[next] = true;
                queue.push_back((next, dist + 1));
            }
        }
    }

    moves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SurCond;
    use crate::engine::field::BeginPattern;
    use crate::engine::zobrist::ZobristTable;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn test_field() -> Field {
        let zobrist = Arc::new(ZobristTable::new(15 * 15, 42));
        Field::new(15, 15, BeginPattern::Clean, zobrist, SurCond::Standard)
    }

    #[test]
    fn empty_board_falls_back_to_centre() {
        let field = test_field();
        let moves = generate_possible_moves(&field, 3);
        assert_eq!(moves, vec![field.to_pos(7, 7)]);
    }

    #[test]
    fn radius_bounds_the_generated_set() {
        let mut field = test_field();
        field.do_step(field.to_pos(7, 7));
        let moves = generate_possible_moves(&field, 1);
        for &pos in &moves {
            assert!(field.manhattan_distance(pos, field.to_pos(7, 7)) <= 1);
        }
        assert!(moves.contains(&field.to_pos(7, 8)));
        assert!(!moves.contains(&field.to_pos(7, 7)));
        // Diagonal neighbours are two 4-connected hops away, outside radius 1.
        assert!(!moves.contains(&field.to_pos(8, 8)));
    }

    #[test]
    fn play_random_game_restores_the_board() {
        let mut field = test_field();
        field.do_step(field.to_pos(7, 7));
        let before_hash = field.hash();
        let before_moves = field.moves_count();
        let config = EngineConfig::default();
        let mut rng = StdRng::seed_from_u64(9);
        play_random_game(&mut field, &mut rng, &config, 0.0);
        assert_eq!(field.hash(), before_hash);
        assert_eq!(field.moves_count(), before_moves);
    }

    #[test]
    fn winner_from_score_respects_komi() {
        let field = test_field();
        assert_eq!(winner_from_score(&field, 0.0), None);
    }
}
