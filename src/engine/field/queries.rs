//! Read-only neighbourhood queries used by the position estimator and the
//! trajectory heuristics to judge how "connected" a point is.

use crate::engine::player::Player;

use super::{Cell, Field};

impl Field {
    /// `|dx| + |dy|` between two positions' board coordinates — the metric
    /// `generate_possible_moves`'s radius-bounded flood uses to decide how
    /// far from a placed stone a candidate move may sit.
    pub fn manhattan_distance(&self, a: usize, b: usize) -> i32 {
        (self.to_x(a) - self.to_x(b)).abs() + (self.to_y(a) - self.to_y(b)).abs()
    }

    /// Whether `pos` is adjacent (8-connected) to a placed stone of
    /// `player`'s colour.
    pub fn is_near(&self, pos: usize, player: Player) -> bool {
        self.near_positions(pos)
            .into_iter()
            .any(|p| self.cell(p).is_put() && self.cell(p).player() == player)
    }

    /// Whether `pos` is adjacent to any of `points`.
    pub fn is_near_points(&self, pos: usize, points: &[usize]) -> bool {
        self.near_positions(pos).into_iter().any(|p| points.contains(&p))
    }

    /// How many of the 8 neighbours of `pos` are placed stones of
    /// `player`'s colour.
    pub fn number_near_points(&self, pos: usize, player: Player) -> u32 {
        self.near_positions(pos)
            .into_iter()
            .filter(|&p| self.cell(p).is_put() && self.cell(p).player() == player)
            .count() as u32
    }

    /// How many distinct groups of `player`'s stones touch `pos`: four
    /// fixed corner checks, one per orthogonal direction that is itself
    /// free, counting a group whenever either adjacent diagonal or the
    /// next orthogonal neighbour around that corner is one of `player`'s
    /// stones (matches the "do these two stones count as one group from
    /// this point's perspective" rule used by the position estimator).
    pub fn number_near_groups(&self, pos: usize, player: Player) -> u32 {
        let cond = (player as u8) | Cell::PUT;
        let (w, n, e, s) = (self.w(pos), self.n(pos), self.e(pos), self.s(pos));
        let (nw, ne, se, sw) = (self.nw(pos), self.ne(pos), self.se(pos), self.sw(pos));

        let mut groups = 0u32;
        if self.cell(w).is_not_enable(cond) && (self.cell(nw).is_enable(cond) || self.cell(n).is_enable(cond)) {
            groups += 1;
        }
        if self.cell(s).is_not_enable(cond) && (self.cell(sw).is_enable(cond) || self.cell(w).is_enable(cond)) {
            groups += 1;
        }
        if self.cell(e).is_not_enable(cond) && (self.cell(se).is_enable(cond) || self.cell(s).is_enable(cond)) {
            groups += 1;
        }
        if self.cell(n).is_not_enable(cond) && (self.cell(ne).is_enable(cond) || self.cell(e).is_enable(cond)) {
            groups += 1;
        }
        groups
    }

    fn near_positions(&self, pos: usize) -> [usize; 8] {
        [
            self.n(pos),
            self.s(pos),
            self.e(pos),
            self.w(pos),
            self.ne(pos),
            self.nw(pos),
            self.se(pos),
            self.sw(pos),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SurCond;
    use crate::engine::field::BeginPattern;
    use crate::engine::zobrist::ZobristTable;
    use std::sync::Arc;

    fn test_field() -> Field {
        let zobrist = Arc::new(ZobristTable::new(20 * 20, 9));
        Field::new(20, 20, BeginPattern::Clean, zobrist, SurCond::Standard)
    }

    #[test]
    fn isolated_stone_has_one_group() {
        let mut field = test_field();
        let centre = field.to_pos(10, 10);
        field.do_step(centre);
        let n = field.n(centre);
        assert_eq!(field.number_near_groups(n, Player::Red), 1);
    }

    #[test]
    fn no_neighbours_means_zero_groups() {
        let field = test_field();
        let pos = field.to_pos(10, 10);
        assert_eq!(field.number_near_groups(pos, Player::Red), 0);
        assert_eq!(field.number_near_points(pos, Player::Red), 0);
    }
}
