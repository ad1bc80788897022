//! Compile-time tuning constants from the original engine, carried as a
//! runtime-configurable record instead of preprocessor defines.

use std::time::Duration;

/// How empty bases are resolved when a stone is placed inside previously
/// traced (but not yet captured) enemy territory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SurCond {
    /// If the placing player doesn't surround anything, the opponent's
    /// empty base is finished into a real capture by the opponent.
    #[default]
    Standard,
    /// A chain always finishes into a surround, even enclosing nothing.
    Always,
    /// Placements into an empty base are always resolved in the enemy's
    /// favour.
    AlwaysEnemy,
}

/// Which UCB variant the UCT selection step uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UcbKind {
    /// Plain UCB1.
    Ucb1,
    /// UCB1 with a variance-scaled exploration term.
    #[default]
    Ucb1Tuned,
}

/// Which searches `BotEngine::get`/`get_with_complexity`/`get_with_time`
/// fall through, in order, before giving up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStrategy {
    PositionEstimate,
    Minimax,
    Uct,
    MinimaxWithUct,
    Mtdf,
    MtdfWithUct,
}

/// The tunables that used to be preprocessor defines in `config.h`.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub sur_cond: SurCond,
    /// Sort the pruned move set ascending by projection count before
    /// alpha-beta expands it, for tighter cutoffs. Off by default.
    pub alphabeta_sort: bool,

    pub uct_depth: u32,
    pub uct_when_create_children: u32,
    pub uctk: f64,
    pub uct_draw_weight: f64,
    pub uct_radius: i32,
    pub ucb_kind: UcbKind,

    pub komi_interval: u32,
    pub uct_red: f64,
    pub uct_green: f64,
    pub dynamic_komi: bool,

    pub search_type: SearchStrategy,
    pub search_with_complexity_type: SearchStrategy,
    pub search_with_time_type: SearchStrategy,

    pub min_minimax_depth: u32,
    pub max_minimax_depth: u32,
    pub default_minimax_depth: u32,

    pub min_mtdf_depth: u32,
    pub max_mtdf_depth: u32,
    pub default_mtdf_depth: u32,

    pub min_uct_iterations: u64,
    pub max_uct_iterations: u64,
    pub default_uct_iterations: u64,

    pub min_complexity: u32,
    pub max_complexity: u32,

    pub num_threads: usize,

    /// Default deadline for `gen_move_with_time` style requests, unused
    /// unless the caller asks for a time-bounded search directly.
    pub default_time_budget: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sur_cond: SurCond::Standard,
            alphabeta_sort: false,

            uct_depth: 6,
            uct_when_create_children: 2,
            uctk: 1.0,
            uct_draw_weight: 0.4,
            uct_radius: 3,
            ucb_kind: UcbKind::Ucb1Tuned,

            komi_interval: 1000,
            uct_red: 0.4,
            uct_green: 0.6,
            dynamic_komi: false,

            search_type: SearchStrategy::MinimaxWithUct,
            search_with_complexity_type: SearchStrategy::MinimaxWithUct,
            search_with_time_type: SearchStrategy::Uct,

            min_minimax_depth: 0,
            max_minimax_depth: 10,
            default_minimax_depth: 8,

            min_mtdf_depth: 0,
            max_mtdf_depth: 10,
            default_mtdf_depth: 8,

            min_uct_iterations: 0,
            max_uct_iterations: 250_000,
            default_uct_iterations: 200_000,

            min_complexity: 0,
            max_complexity: 100,

            num_threads: std::thread::available_parallelism().map_or(1, |v| v.get()),

            default_time_budget: Duration::from_secs(5),
        }
    }
}

impl EngineConfig {
    /// Linear interpolation from (min_complexity, lo) to (max_complexity, hi).
    fn interpolate(&self, complexity: u32, lo: u64, hi: u64) -> u64 {
        let complexity = complexity.clamp(self.min_complexity, self.max_complexity) as i64;
        let span = (self.max_complexity - self.min_complexity).max(1) as i64;
        let lo = lo as i64;
        let hi = hi as i64;
        let value = (complexity - self.min_complexity as i64) * (hi - lo) / span + lo;
        value as u64
    }

    pub fn minimax_depth_for(&self, complexity: u32) -> u32 {
        self.interpolate(complexity, self.min_minimax_depth as u64, self.max_minimax_depth as u64) as u32
    }

    pub fn mtdf_depth_for(&self, complexity: u32) -> u32 {
        self.interpolate(complexity, self.min_mtdf_depth as u64, self.max_mtdf_depth as u64) as u32
    }

    pub fn uct_iterations_for(&self, complexity: u32) -> u64 {
        self.interpolate(complexity, self.min_uct_iterations, self.max_uct_iterations)
    }
}
