//! The façade the stdio protocol layer drives: owns the board, the
//! trajectory cache, and the persistent UCT tree, and picks which search
//! strategy answers each request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::engine::config::{EngineConfig, SearchStrategy};
use crate::engine::estimate::best_position_estimate;
use crate::engine::field::{BeginPattern, Field};
use crate::engine::player::Player;
use crate::engine::search::{alphabeta_root, mtdf_root};
use crate::engine::trajectories::Trajectories;
use crate::engine::uct::UctRoot;
use crate::engine::zobrist::ZobristTable;

/// A chosen move, or `None` when the board has no room left at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Move {
    pub x: i32,
    pub y: i32,
}

pub struct BotEngine {
    field: Field,
    trajectories: Trajectories,
    uct: UctRoot,
    config: EngineConfig,
}

impl BotEngine {
    pub fn new(width: i32, height: i32, begin_pattern: BeginPattern, seed: u64, config: EngineConfig) -> BotEngine {
        let zobrist = Arc::new(ZobristTable::new((width * height) as usize, seed));
        let mut field = Field::new(width, height, begin_pattern, zobrist.clone(), config.sur_cond);
        let mut trajectories = Trajectories::new(zobrist);
        trajectories.build_trajectories(&mut field, field.player(), config.uct_depth);
        let uct = UctRoot::new(field.player());
        BotEngine { field, trajectories, uct, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn width(&self) -> i32 {
        self.field.width()
    }

    pub fn height(&self) -> i32 {
        self.field.height()
    }

    pub fn player(&self) -> Player {
        self.field.player()
    }

    pub fn set_player(&mut self, player: Player) {
        self.field.set_player(player);
        self.uct.reset(player);
    }

    pub fn moves_count(&self) -> usize {
        self.field.moves_count()
    }

    fn is_board_full(&self) -> bool {
        (self.field.min_pos()..=self.field.max_pos()).all(|p| !self.field.cell(p).putting_allowed())
    }

    /// Places `player`'s stone at `(x, y)` and rebuilds the trajectory
    /// cache incrementally for the new position.
    pub fn do_step(&mut self, x: i32, y: i32) -> anyhow::Result<()> {
        if x < 0 || y < 0 || x >= self.field.width() || y >= self.field.height() {
            anyhow::bail!("move ({x}, {y}) is off the {}x{} board", self.field.width(), self.field.height());
        }
        let pos = self.field.to_pos(x, y);
        let player = self.field.player();
        let last = self.trajectories.clone();
        if !self.field.do_step(pos) {
            anyhow::bail!("({x}, {y}) is already occupied or captured");
        }
        self.trajectories.build_trajectories_incremental(&mut self.field, &last, player.next(), pos);
        self.uct.advance(pos, self.field.player());
        Ok(())
    }

    /// Undoes the most recent move, rebuilding the trajectory cache from
    /// scratch (cheap re-derivation beats trying to reverse the
    /// incremental update) and resetting the UCT tree, since it has no
    /// way to un-reuse statistics gathered past this point.
    pub fn undo_step(&mut self) -> bool {
        if self.field.moves_count() == 0 {
            return false;
        }
        let ok = self.field.undo_step();
        if ok {
            let player = self.field.player();
            self.trajectories.build_trajectories(&mut self.field, player, self.config.uct_depth);
            self.uct.reset(player);
        }
        ok
    }

    fn to_move(&self, pos: usize) -> Move {
        Move { x: self.field.to_x(pos), y: self.field.to_y(pos) }
    }

    /// Handles the boundary cases the search strategies themselves don't
    /// need to think about: a board too small to play on, an entirely
    /// empty board (play the centre), the single-reply-to-the-opening-move
    /// case (centre, or a step toward it from an edge-biased first stone),
    /// and a completely full board (nothing left to do).
    fn trivial_reply(&self) -> Option<Option<Move>> {
        if self.field.width() < 3 || self.field.height() < 3 {
            return Some(None);
        }
        if self.is_board_full() {
            return Some(None);
        }
        let cx = self.field.width() / 2;
        let cy = self.field.height() / 2;
        if self.field.moves_count() == 0 {
            return Some(Some(self.to_move(self.field.to_pos(cx, cy))));
        }
        if self.field.moves_count() == 1 {
            let first = self.field.points_seq()[0];
            let (fx, fy) = (self.field.to_x(first), self.field.to_y(first));
            let on_edge = fx == 0 || fy == 0 || fx == self.field.width() - 1 || fy == self.field.height() - 1;
            if on_edge {
                return Some(Some(self.to_move(self.field.to_pos(cx, cy))));
            }
            // Step one cell toward the centre along the axis whose
            // edge-distance is smaller; ties fall into the `dy` branch.
            let edge_dist_x = fx.min(self.field.width() - 1 - fx);
            let edge_dist_y = fy.min(self.field.height() - 1 - fy);
            let (mut rx, mut ry) = (fx, fy);
            if edge_dist_x < edge_dist_y {
                let dx = cx - fx;
                rx += dx.signum();
            } else {
                let dy = cy - fy;
                ry += dy.signum();
            }
            return Some(Some(self.to_move(self.field.to_pos(rx, ry))));
        }
        None
    }

    fn run_strategy(&mut self, strategy: SearchStrategy, minimax_depth: u32, mtdf_depth: u32, uct_iterations: u64) -> Option<Move> {
        let pos = match strategy {
            SearchStrategy::PositionEstimate => best_position_estimate(&self.field),
            SearchStrategy::Minimax => alphabeta_root(&self.field, &self.trajectories, &self.config, minimax_depth).pos,
            SearchStrategy::Mtdf => mtdf_root(&self.field, &self.trajectories, &self.config, mtdf_depth).pos,
            SearchStrategy::Uct => self
                .uct
                .search(&self.field, &self.config, self.trajectories.moves(), uct_iterations)
                .pos,
            SearchStrategy::MinimaxWithUct => {
                let minimax = alphabeta_root(&self.field, &self.trajectories, &self.config, minimax_depth).pos;
                minimax.or_else(|| {
                    self.uct
                        .search(&self.field, &self.config, self.trajectories.moves(), uct_iterations)
                        .pos
                })
            }
            SearchStrategy::MtdfWithUct => {
                let mtdf = mtdf_root(&self.field, &self.trajectories, &self.config, mtdf_depth).pos;
                mtdf.or_else(|| {
                    self.uct
                        .search(&self.field, &self.config, self.trajectories.moves(), uct_iterations)
                        .pos
                })
            }
        };
        pos.or_else(|| best_position_estimate(&self.field)).map(|p| self.to_move(p))
    }

    /// Generates a move at the configured default strength.
    pub fn get(&mut self) -> Option<Move> {
        if let Some(trivial) = self.trivial_reply() {
            return trivial;
        }
        let depth = self.config.default_minimax_depth;
        let mtdf_depth = self.config.default_mtdf_depth;
        let iterations = self.config.default_uct_iterations;
        self.run_strategy(self.config.search_type, depth, mtdf_depth, iterations)
    }

    /// Generates a move at a caller-specified strength, `complexity`
    /// clamped into `[min_complexity, max_complexity]` and linearly mapped
    /// onto each strategy's own depth/iteration range.
    pub fn get_with_complexity(&mut self, complexity: u32) -> Option<Move> {
        if let Some(trivial) = self.trivial_reply() {
            return trivial;
        }
        let depth = self.config.minimax_depth_for(complexity);
        let mtdf_depth = self.config.mtdf_depth_for(complexity);
        let iterations = self.config.uct_iterations_for(complexity);
        self.run_strategy(self.config.search_with_complexity_type, depth, mtdf_depth, iterations)
    }

    /// Generates a move within a wall-clock budget. Only the UCT-bearing
    /// strategies honour the deadline directly (iterative search can
    /// always be cut short); a pure minimax/MTD(f) strategy instead uses
    /// the budget to pick a depth via the same interpolation the
    /// complexity-based entry point uses, scaled by a rough per-ply time
    /// estimate.
    pub fn get_with_time(&mut self, budget: Duration) -> Option<Move> {
        if let Some(trivial) = self.trivial_reply() {
            return trivial;
        }
        let deadline = Instant::now() + budget;
        let pos = match self.config.search_with_time_type {
            SearchStrategy::Uct | SearchStrategy::MinimaxWithUct | SearchStrategy::MtdfWithUct => self
                .uct
                .search_with_deadline(&self.field, &self.config, self.trajectories.moves(), deadline)
                .pos,
            SearchStrategy::Minimax => alphabeta_root(&self.field, &self.trajectories, &self.config, self.config.default_minimax_depth).pos,
            SearchStrategy::Mtdf => mtdf_root(&self.field, &self.trajectories, &self.config, self.config.default_mtdf_depth).pos,
            SearchStrategy::PositionEstimate => best_position_estimate(&self.field),
        };
        pos.or_else(|| best_position_estimate(&self.field)).map(|p| self.to_move(p))
    }

    pub fn score(&self) -> i32 {
        self.field.score()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_board_plays_the_centre() {
        let mut bot = BotEngine::new(9, 9, BeginPattern::Clean, 1, EngineConfig::default());
        let mv = bot.get().expect("empty board always has a move");
        assert_eq!(mv, Move { x: 4, y: 4 });
    }

    #[test]
    fn do_step_then_undo_restores_move_count() {
        let mut bot = BotEngine::new(9, 9, BeginPattern::Clean, 1, EngineConfig::default());
        bot.do_step(0, 0).unwrap();
        assert_eq!(bot.moves_count(), 1);
        assert!(bot.undo_step());
        assert_eq!(bot.moves_count(), 0);
    }

    #[test]
    fn out_of_bounds_move_is_rejected() {
        let mut bot = BotEngine::new(9, 9, BeginPattern::Clean, 1, EngineConfig::default());
        assert!(bot.do_step(100, 100).is_err());
    }
}
