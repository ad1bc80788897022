use clap::Parser;

use crate::engine::config::{EngineConfig, SearchStrategy, SurCond, UcbKind};

/// Command-line options for the engine process. Mirrors the shape of an
/// `EngineConfig`, but as flat, clap-friendly fields that get folded into
/// one once parsing succeeds.
#[derive(Parser, Debug, Clone)]
#[command(name = "points-bot", about = "An engine for the Russian-rules territory game")]
pub struct EngineOptions {
    /// `trace`, `debug`, `info`, `warn`, or `error`.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[arg(long)]
    pub num_threads: Option<usize>,

    #[arg(long, value_enum, default_value = "standard")]
    pub sur_cond: SurCondArg,

    #[arg(long)]
    pub alphabeta_sort: bool,

    #[arg(long, default_value_t = 6)]
    pub uct_depth: u32,

    #[arg(long, default_value_t = 1.0)]
    pub uctk: f64,

    #[arg(long)]
    pub ucb1: bool,

    #[arg(long)]
    pub dynamic_komi: bool,

    #[arg(long, value_enum, default_value = "minimax-with-uct")]
    pub search_type: SearchStrategyArg,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum SurCondArg {
    Standard,
    Always,
    AlwaysEnemy,
}

impl From<SurCondArg> for SurCond {
    fn from(value: SurCondArg) -> Self {
        match value {
            SurCondArg::Standard => SurCond::Standard,
            SurCondArg::Always => SurCond::Always,
            SurCondArg::AlwaysEnemy => SurCond::AlwaysEnemy,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum SearchStrategyArg {
    PositionEstimate,
    Minimax,
    Uct,
    MinimaxWithUct,
    Mtdf,
    MtdfWithUct,
}

impl From<SearchStrategyArg> for SearchStrategy {
    fn from(value: SearchStrategyArg) -> Self {
        match value {
            SearchStrategyArg::PositionEstimate => SearchStrategy::PositionEstimate,
            SearchStrategyArg::Minimax => SearchStrategy::Minimax,
            SearchStrategyArg::Uct => SearchStrategy::Uct,
            SearchStrategyArg::MinimaxWithUct => SearchStrategy::MinimaxWithUct,
            SearchStrategyArg::Mtdf => SearchStrategy::Mtdf,
            SearchStrategyArg::MtdfWithUct => SearchStrategy::MtdfWithUct,
        }
    }
}

impl EngineOptions {
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(num_threads) = self.num_threads {
            config.num_threads = num_threads;
        }
        config.sur_cond = self.sur_cond.into();
        config.alphabeta_sort = self.alphabeta_sort;
        config.uct_depth = self.uct_depth;
        config.uctk = self.uctk;
        config.ucb_kind = if self.ucb1 { UcbKind::Ucb1 } else { UcbKind::Ucb1Tuned };
        config.dynamic_komi = self.dynamic_komi;
        config.search_type = self.search_type.into();
        config.search_with_complexity_type = self.search_type.into();
        config
    }
}
