//! Cheap one-ply heuristic used as the final fallback search strategy, and
//! as the per-move ordering signal other searches can consult.

use crate::engine::field::Field;
use crate::engine::player::Player;

/// Indexed by `number_near_points`, this penalises a move that touches few
/// of the mover's own stones and many of the opponent's.
const NEAR_POINTS_PENALTY: [i32; 9] = [-5, -1, 0, 0, 1, 2, 5, 20, 30];

/// Scores placing a stone for `player` at `pos`, without mutating `field`.
///
/// Rewards moves that join existing groups of `player`'s stones (`g1`) more
/// than moves that merely crowd the opponent's (`g2`), penalises both by how
/// tightly either colour already surrounds the point, and gives a small
/// bonus for staying adjacent to the most recent move (keeps the position
/// estimate from wandering to unrelated parts of the board).
pub fn position_estimate(field: &Field, pos: usize, player: Player) -> i32 {
    let enemy = player.next();
    let g1 = field.number_near_groups(pos, player) as i32;
    let g2 = field.number_near_groups(pos, enemy) as i32;
    let c1 = NEAR_POINTS_PENALTY[field.number_near_points(pos, player) as usize];
    let c2 = NEAR_POINTS_PENALTY[field.number_near_points(pos, enemy) as usize];

    let mut score = (g1 * 3 + g2 * 2) * (5 - (g1 - g2).abs()) - c1 - c2;

    if let Some(&last) = field.points_seq().last() {
        if field.is_near_points(pos, &[last]) {
            score += 5;
        }
    }

    score
}

/// Scans every legal point for `field.player()` and returns the
/// highest-scoring one, or `None` if the board has no room left.
pub fn best_position_estimate(field: &Field) -> Option<usize> {
    let player = field.player();
    let mut best: Option<(usize, i32)> = None;
    for pos in field.min_pos()..=field.max_pos() {
        if !field.cell(pos).putting_allowed() {
            continue;
        }
        let score = position_estimate(field, pos, player);
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((pos, score));
        }
    }
    best.map(|(pos, _)| pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SurCond;
    use crate::engine::field::BeginPattern;
    use crate::engine::zobrist::ZobristTable;
    use std::sync::Arc;

    fn test_field() -> Field {
        let zobrist = Arc::new(ZobristTable::new(20 * 20, 11));
        Field::new(20, 20, BeginPattern::Clean, zobrist, SurCond::Standard)
    }

    #[test]
    fn empty_board_has_a_best_move() {
        let field = test_field();
        assert!(best_position_estimate(&field).is_some());
    }

    #[test]
    fn adjacency_to_own_stone_scores_higher_than_isolation() {
        let mut field = test_field();
        let centre = field.to_pos(10, 10);
        field.do_step(centre);
        let far = field.to_pos(0, 0);
        let near = field.n(field.n(centre));
        let near_score = position_estimate(&field, near, field.player());
        let far_score = position_estimate(&field, far, field.player());
        assert!(near_score >= far_score);
    }
}
