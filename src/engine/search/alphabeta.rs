use std::sync::Mutex;

use crate::engine::config::EngineConfig;
use crate::engine::field::Field;
use crate::engine::player::Player;
use crate::engine::trajectories::Trajectories;

/// Returned by a root search: the chosen move (`None` if the pruned move
/// set was empty, meaning the position should fall through to a cheaper
/// strategy) and its negamax score from the mover's perspective.
#[derive(Clone, Copy, Debug)]
pub struct SearchOutcome {
    pub pos: Option<usize>,
    pub score: i32,
}

#[inline]
fn perspective_sign(player: Player) -> i32 {
    if player == Player::Red {
        1
    } else {
        -1
    }
}

#[inline]
fn score_for(field: &Field, player: Player) -> i32 {
    field.score() * perspective_sign(player)
}

/// Negamax over the trajectory-pruned move set, with a PVS-style
/// null-window re-search: the first child at each node is searched with
/// the full window, every later child first gets a zero-width probe and
/// only earns a full re-search if that probe suggests it might actually
/// beat alpha.
fn negamax(
    field: &mut Field,
    parent_trajectories: &Trajectories,
    config: &EngineConfig,
    depth: u32,
    pos: usize,
    mover: Player,
    alpha: i32,
    beta: i32,
) -> i32 {
    field.do_step_as(pos, mover);

    let result = if field.d_score() < 0 {
        // Placed into a live surround for no gain: a wasted tempo, scored
        // as a near-certain loss without expanding further.
        i32::MIN + 1
    } else if depth == 0 {
        score_for(field, mover)
    } else {
        let mut trajectories = parent_trajectories.clone();
        trajectories.build_trajectories_incremental(field, parent_trajectories, mover.next(), pos);
        let moves = trajectories.moves().to_vec();

        if moves.is_empty() {
            score_for(field, mover)
        } else {
            let moves = ordered_moves(config, field, moves, mover.next());
            let mut alpha = alpha;
            let mut best = i32::MIN + 1;
            for (i, &mv) in moves.iter().enumerate() {
                let score = if i == 0 {
                    -negamax(field, &trajectories, config, depth - 1, mv, mover.next(), -beta, -alpha)
                } else {
                    let probe = -negamax(field, &trajectories, config, depth - 1, mv, mover.next(), -alpha - 1, -alpha);
                    if probe > alpha && probe < beta {
                        -negamax(field, &trajectories, config, depth - 1, mv, mover.next(), -beta, -probe)
                    } else {
                        probe
                    }
                };
                if score > best {
                    best = score;
                }
                if score > alpha {
                    alpha = score;
                }
                if alpha >= beta {
                    break;
                }
            }
            best
        }
    };

    field.undo_step();
    result
}

fn ordered_moves(config: &EngineConfig, field: &Field, mut moves: Vec<usize>, mover: Player) -> Vec<usize> {
    if config.alphabeta_sort {
        moves.sort_by_key(|&pos| std::cmp::Reverse(crate::engine::estimate::position_estimate(field, pos, mover)));
    }
    moves
}

/// The score the position would get if the side to move passed instead:
/// flips the active player with no stone placed, rebuilds trajectories for
/// that hypothetical position (no move played, so a plain refresh), and
/// runs the same asymmetric-window search `depth` plies deep from the
/// opponent's perspective. Mirrors the original engine's
/// `getEnemyEstimate`, used by the root to recognise a search that found
/// nothing better than letting the opponent move freely.
pub(super) fn pass_estimate(field: &Field, trajectories: &Trajectories, config: &EngineConfig, depth: u32) -> i32 {
    let mover = field.player();
    let mut passed = field.clone();
    passed.set_next_player();
    let enemy = passed.player();
    debug_assert_eq!(enemy, mover.next());

    let mut refreshed = trajectories.clone();
    refreshed.build_trajectories_refresh(&passed, trajectories);
    let moves = refreshed.moves().to_vec();

    let result = if moves.is_empty() || depth == 0 {
        score_for(&passed, enemy)
    } else {
        let mut beyond_field = passed.clone();
        let alpha0 = -refreshed.max_score(&mut beyond_field, enemy.next());
        let mut enemy_field = passed.clone();
        let beta0 = refreshed.max_score(&mut enemy_field, enemy);

        let shared = Mutex::new(alpha0);
        let num_threads = config.num_threads.max(1).min(moves.len());
        std::thread::scope(|scope| {
            for thread_index in 0..num_threads {
                let shared = &shared;
                let passed = &passed;
                let refreshed = &refreshed;
                let moves = &moves;
                scope.spawn(move || {
                    let mut worker_field = passed.clone();
                    for &pos in moves.iter().skip(thread_index).step_by(num_threads) {
                        let alpha = *shared.lock().unwrap();
                        if alpha >= beta0 {
                            break;
                        }
                        let score = -negamax(&mut worker_field, refreshed, config, depth - 1, pos, enemy, -beta0, -alpha);
                        let mut guard = shared.lock().unwrap();
                        if score > *guard {
                            *guard = score;
                        }
                    }
                });
            }
        });
        shared.into_inner().unwrap()
    };
    -result
}

/// Splits the root's pruned move list across `config.num_threads` workers,
/// each holding its own cloned board and trajectory set, and merges on a
/// shared best-score/best-move pair behind a mutex — the same
/// coarse-grained sharing the original engine used its OpenMP critical
/// section for.
pub fn alphabeta_root(field: &Field, trajectories: &Trajectories, config: &EngineConfig, depth: u32) -> SearchOutcome {
    let mover = field.player();
    let enemy = mover.next();

    let mut enemy_field = field.clone();
    let alpha0 = -trajectories.max_score(&mut enemy_field, enemy);
    let mut mover_field = field.clone();
    let beta0 = trajectories.max_score(&mut mover_field, mover);

    let moves = trajectories.moves().to_vec();
    if moves.is_empty() {
        return SearchOutcome { pos: None, score: score_for(field, mover) };
    }

    let shared = Mutex::new((alpha0, None::<usize>));
    let num_threads = config.num_threads.max(1).min(moves.len());

    std::thread::scope(|scope| {
        for thread_index in 0..num_threads {
            let shared = &shared;
            let field = field;
            let trajectories = trajectories;
            let moves = &moves;
            scope.spawn(move || {
                let mut worker_field = field.clone();
                for &pos in moves.iter().skip(thread_index).step_by(num_threads) {
                    let (alpha, _) = *shared.lock().unwrap();
                    if alpha >= beta0 {
                        break;
                    }
                    let score = -negamax(
                        &mut worker_field,
                        trajectories,
                        config,
                        depth.saturating_sub(1),
                        pos,
                        enemy,
                        -beta0,
                        -alpha,
                    );
                    let mut guard = shared.lock().unwrap();
                    if score > guard.0 {
                        guard.0 = score;
                        guard.1 = Some(pos);
                    }
                }
            });
        }
    });

    let (alpha, best_move) = shared.into_inner().unwrap();
    if alpha == pass_estimate(field, trajectories, config, depth.saturating_sub(1)) {
        // The best line found is no better than letting the opponent move
        // freely: the search is uninformative here, so report "no move"
        // and let the caller fall through to a cheaper strategy.
        return SearchOutcome { pos: None, score: alpha };
    }
    match best_move {
        Some(pos) => SearchOutcome { pos: Some(pos), score: alpha },
        None => SearchOutcome { pos: moves.first().copied(), score: alpha },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SurCond;
    use crate::engine::field::BeginPattern;
    use crate::engine::zobrist::ZobristTable;
    use std::sync::Arc;

    #[test]
    fn root_search_picks_a_move_on_empty_board() {
        let zobrist = Arc::new(ZobristTable::new(12 * 12, 13));
        let mut field = Field::new(12, 12, BeginPattern::Clean, zobrist.clone(), SurCond::Standard);
        let mut trajectories = Trajectories::new(zobrist);
        trajectories.build_trajectories(&mut field, field.player(), 2);
        // Near-empty boards legitimately produce an empty pruned move set;
        // the search result should still be well-formed either way.
        let mut config = EngineConfig::default();
        config.num_threads = 2;
        let outcome = alphabeta_root(&field, &trajectories, &config, 2);
        assert!(outcome.score > i32::MIN);
    }

    #[test]
    fn pass_estimate_is_well_formed_on_empty_board() {
        let zobrist = Arc::new(ZobristTable::new(10 * 10, 23));
        let mut field = Field::new(10, 10, BeginPattern::Clean, zobrist.clone(), SurCond::Standard);
        let mut trajectories = Trajectories::new(zobrist);
        trajectories.build_trajectories(&mut field, field.player(), 2);
        let config = EngineConfig::default();
        let estimate = pass_estimate(&field, &trajectories, &config, 1);
        assert!(estimate > i32::MIN);
    }
}
