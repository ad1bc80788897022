use rand::rngs::StdRng;
use rand::Rng;

use crate::engine::config::{EngineConfig, UcbKind};

use super::node::UctTree;

/// Picks `node`'s best child by UCB score. Unvisited children always win
/// (with a small random tiebreak among themselves), since an untried move
/// could be the best one and zero visits gives no information either way.
pub fn select_child(tree: &UctTree, node_idx: usize, config: &EngineConfig, komi: f64, rng: &mut StdRng) -> usize {
    let parent_visits = tree.node(node_idx).visits.max(1) as f64;
    let mut best_idx = tree.children(node_idx)[0];
    let mut best_score = f64::NEG_INFINITY;

    for &child_idx in tree.children(node_idx) {
        let node = tree.node(child_idx);
        let score = if node.visits == 0 {
            10_000.0 + rng.random::<f64>() * 999.0
        } else {
            ucb(parent_visits, node.visits as f64, node.wins as f64, node.draws as f64, config, komi)
        };
        if score > best_score {
            best_score = score;
            best_idx = child_idx;
        }
    }

    best_idx
}

/// The UCB1 / UCB1-tuned point estimate for a node with `visits` samples,
/// `wins`/`draws` outcomes, under a `parent_visits`-visit parent. Shared by
/// in-tree selection and the root's final best-move choice — both read the
/// same formula, just over different candidate sets.
pub(super) fn ucb(parent_visits: f64, visits: f64, wins: f64, draws: f64, config: &EngineConfig, komi: f64) -> f64 {
    let win_rate = (wins + draws * config.uct_draw_weight) / visits - komi;
    match config.ucb_kind {
        UcbKind::Ucb1 => win_rate + config.uctk * (2.0 * parent_visits.ln() / visits).sqrt(),
        UcbKind::Ucb1Tuned => {
            let variance = (wins + draws * config.uct_draw_weight.powi(2)) / visits - win_rate * win_rate;
            let bounded_variance = variance.min(0.25);
            let exploration = config.uctk * (bounded_variance * parent_visits.ln() / visits).sqrt();
            win_rate + exploration
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn tree_with_two_children(visits_a: i64, wins_a: i64, visits_b: i64, wins_b: i64) -> UctTree {
        let mut tree = UctTree::new();
        let a = tree.add_child(UctTree::ROOT, 1);
        let b = tree.add_child(UctTree::ROOT, 2);
        tree.node_mut(a).visits = visits_a;
        tree.node_mut(a).wins = wins_a;
        tree.node_mut(b).visits = visits_b;
        tree.node_mut(b).wins = wins_b;
        tree.node_mut(UctTree::ROOT).visits = visits_a + visits_b;
        tree
    }

    #[test]
    fn unvisited_child_always_wins_selection() {
        let tree = tree_with_two_children(50, 40, 0, 0);
        let mut rng = StdRng::seed_from_u64(1);
        let config = EngineConfig::default();
        let chosen = select_child(&tree, UctTree::ROOT, &config, 0.0, &mut rng);
        assert_eq!(tree.node(chosen).pos, 2);
    }

    #[test]
    fn higher_win_rate_scores_higher_under_ucb1() {
        let mut config = EngineConfig::default();
        config.ucb_kind = UcbKind::Ucb1;
        let high = ucb(100.0, 20.0, 18.0, 0.0, &config, 0.0);
        let low = ucb(100.0, 20.0, 2.0, 0.0, &config, 0.0);
        assert!(high > low);
    }

    #[test]
    fn komi_shifts_win_rate_down() {
        let config = EngineConfig::default();
        let no_komi = ucb(100.0, 20.0, 10.0, 0.0, &config, 0.0);
        let with_komi = ucb(100.0, 20.0, 10.0, 0.0, &config, 0.2);
        assert!(with_komi < no_komi);
    }
}
