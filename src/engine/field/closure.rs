//! Chain tracing and surround resolution: the core rule of the game.
//!
//! When a stone is placed, any new closed chain of that stone's colour may
//! enclose opposing stones (captured) and/or empty points (marked as an
//! "empty base", resolved once a later move decides their fate).

use crate::engine::config::SurCond;
use crate::engine::player::Player;

use super::{Cell, Field};

/// The 8 directions in the fixed clockwise order `build_chain`'s boundary
/// walk rotates through: `W, NW, N, NE, E, SE, S, SW`.
const DIRECTIONS: [fn(&Field, usize) -> usize; 8] = [
    |f, p| f.w(p),
    |f, p| f.nw(p),
    |f, p| f.n(p),
    |f, p| f.ne(p),
    |f, p| f.e(p),
    |f, p| f.se(p),
    |f, p| f.s(p),
    |f, p| f.sw(p),
];

impl Field {
    /// Called immediately after a stone lands at `pos` for `player`: finds
    /// every new chain of `player`'s colour passing through `pos`, and for
    /// each one that actually encloses something, resolves it via
    /// `find_surround`. Also handles placement inside a previously traced
    /// empty base.
    pub(super) fn check_closure(&mut self, pos: usize, player: Player) {
        if self.cell(pos).is_in_empty_base() {
            self.resolve_empty_base(pos, player);
            return;
        }
        let cond = (player as u8) | Cell::PUT;
        self.close_chains_through(pos, cond, player);
    }

    /// Runs `get_input_points`/`build_chain`/`find_surround` for every
    /// candidate pair through `pos`, stopping once `input_count - 1` rings
    /// have closed (at most `input_count - 1` of the up-to-4 candidates can
    /// ever be distinct closed rings, so the last is redundant).
    fn close_chains_through(&mut self, pos: usize, cond: u8, resolve_as: Player) {
        let points = self.get_input_points(pos, cond);
        if points.len() <= 1 {
            return;
        }
        let mut closed = 0;
        for &(chain_dir, sur_dir) in &points {
            if let Some(chain) = self.build_chain(pos, chain_dir, cond) {
                self.find_surround(&chain, sur_dir, resolve_as);
                closed += 1;
                if closed == points.len() - 1 {
                    break;
                }
            }
        }
    }

    /// Placing inside a base that was already traced (but not yet
    /// resolved into a capture) as empty territory. Walks left along the
    /// row until a placed stone is found to identify whose base this is;
    /// if it's the mover's own base, simply clears it. Otherwise, the
    /// mover's own new stone might itself close a ring around the empty
    /// base (reclaiming it outright); failing that, a chain of the
    /// enemy's own colour is walked for leftward until one is found that
    /// actually encloses `pos`, finishing the enemy's empty base into a
    /// real capture.
    fn resolve_empty_base(&mut self, pos: usize, player: Player) {
        let mut owner_pos = self.w(pos);
        while !self.cell(owner_pos).is_put() {
            owner_pos = self.w(owner_pos);
        }
        if self.cell(owner_pos).player() == self.cell(pos).player() {
            let mut c = self.cell(pos);
            c.clear_empty_base();
            self.push_change(pos);
            self.set_cell(pos, c);
            return;
        }

        if self.sur_cond() != SurCond::AlwaysEnemy {
            let cond = (player as u8) | Cell::PUT;
            self.close_chains_through(pos, cond, player);
            if self.cell(pos).is_base_bound() {
                self.remove_empty_base(pos);
                return;
            }
        }

        let enemy = player.next();
        let enemy_cond = (enemy as u8) | Cell::PUT;
        let mut scan = pos;
        loop {
            scan = self.w(scan);
            while self.cell(scan).is_not_enable(enemy_cond) {
                scan = self.w(scan);
            }
            let points = self.get_input_points(scan, enemy_cond);
            for &(chain_dir, sur_dir) in &points {
                if let Some(chain) = self.build_chain(scan, chain_dir, enemy_cond) {
                    if self.is_point_inside_ring(&chain, pos) {
                        self.find_surround(&chain, sur_dir, enemy);
                        break;
                    }
                }
            }
            if self.cell(pos).is_captured() {
                break;
            }
        }
    }

    /// Clears the `EMPTY_BASE` marking across the 4-connected empty-base
    /// region starting at `start` (used once that base has just been
    /// folded into a real capture by a closing chain).
    fn remove_empty_base(&mut self, start: usize) {
        let region = self.wave(start, |field, p| field.cell(p).is_in_empty_base());
        for p in region {
            let mut c = self.cell(p);
            c.clear_empty_base();
            self.push_change(p);
            self.set_cell(p, c);
        }
    }

    /// Up to 4 `(chain-candidate, surround-candidate)` pairs around
    /// `center`: wherever an orthogonal neighbour is not free-for-`cond`
    /// but one of its own diagonal/orthogonal neighbours is, a chain can
    /// be traced starting there, with the opposite orthogonal cell as the
    /// interior seed.
    fn get_input_points(&self, center: usize, cond: u8) -> Vec<(usize, usize)> {
        let (w, n, e, s) = (self.w(center), self.n(center), self.e(center), self.s(center));
        let (nw, ne, se, sw) = (self.nw(center), self.ne(center), self.se(center), self.sw(center));

        let mut points = Vec::with_capacity(4);

        if self.cell(w).is_not_enable(cond) {
            if self.cell(nw).is_enable(cond) {
                points.push((nw, w));
            } else if self.cell(n).is_enable(cond) {
                points.push((n, w));
            }
        }
        if self.cell(s).is_not_enable(cond) {
            if self.cell(sw).is_enable(cond) {
                points.push((sw, s));
            } else if self.cell(w).is_enable(cond) {
                points.push((w, s));
            }
        }
        if self.cell(e).is_not_enable(cond) {
            if self.cell(se).is_enable(cond) {
                points.push((se, e));
            } else if self.cell(s).is_enable(cond) {
                points.push((s, e));
            }
        }
        if self.cell(n).is_not_enable(cond) {
            if self.cell(ne).is_enable(cond) {
                points.push((ne, n));
            } else if self.cell(e).is_enable(cond) {
                points.push((e, n));
            }
        }
        points
    }

    /// First rotation candidate after arriving at `center` from the
    /// direction indexed `incoming`: skips the two nearest directions on
    /// either side of straight back, landing 3 (or, for an even index, 2)
    /// steps further clockwise — the exact asymmetric skip the original
    /// engine's `getFirstNextPos` encodes.
    fn first_next_index(incoming: usize) -> usize {
        ((incoming / 2) * 2 + 3) % 8
    }

    /// Attempts to trace a closed chain of `cond`'s colour starting
    /// `center -> first -> ... -> center`, always turning to the first
    /// next neighbour satisfying `cond` found by rotating clockwise from
    /// `first_next_index` of the incoming direction. Returns `None` if the
    /// walk doesn't wind negatively (i.e. doesn't actually enclose
    /// anything on its concave side) or closes too short to be a ring.
    fn build_chain(&mut self, center: usize, first: usize, cond: u8) -> Option<Vec<usize>> {
        let mut chain = vec![center];
        let mut area = self.square(center, first);
        let mut prev = center;
        let mut cur = first;

        loop {
            if self.cell(cur).is_tagged() {
                while chain.last().copied() != Some(cur) {
                    let removed = chain.pop().unwrap();
                    let mut c = self.cell(removed);
                    c.clear_tag();
                    self.set_cell(removed, c);
                }
            } else {
                let mut c = self.cell(cur);
                c.set_tag();
                self.set_cell(cur, c);
                chain.push(cur);
            }

            let new_center = cur;
            let incoming_at_new_center = prev;
            let incoming_dir = DIRECTIONS.iter().position(|f| f(self, new_center) == incoming_at_new_center).expect("boundary walk must arrive from an adjacent cell");

            let mut dir = Field::first_next_index(incoming_dir);
            while self.cell(DIRECTIONS[dir](self, new_center)).is_not_enable(cond) {
                dir = (dir + 1) % 8;
            }
            let next = DIRECTIONS[dir](self, new_center);

            area += self.square(new_center, next);
            prev = new_center;
            cur = next;

            if cur == center {
                break;
            }
            if chain.len() > self.len() {
                for &p in &chain {
                    let mut c = self.cell(p);
                    c.clear_tag();
                    self.set_cell(p, c);
                }
                return None;
            }
        }

        for &p in &chain {
            let mut c = self.cell(p);
            c.clear_tag();
            self.set_cell(p, c);
        }

        if area < 0 && chain.len() > 2 {
            Some(chain)
        } else {
            None
        }
    }

    /// Floods the interior of `chain` starting from the adjacent seed
    /// `inside_point`, and decides, per the configured [`SurCond`],
    /// whether it becomes a capture (enemy stones inside are marked
    /// captured and previously-captured own stones inside are freed) or
    /// an empty base (marked but left for a future placement to resolve).
    /// `player` is the colour the chain belongs to.
    ///
    /// Chain cells are tagged before the flood so `wave`'s own visited
    /// check keeps it from crossing the ring it is tracing; the `BOUND`
    /// bit in `bound_cond` instead stops the flood at any *other* chain
    /// left standing by an earlier capture.
    fn find_surround(&mut self, chain: &[usize], inside_point: usize, player: Player) {
        for &p in chain {
            let mut c = self.cell(p);
            c.set_tag();
            self.set_cell(p, c);
        }

        let bound_cond = (player as u8) | Cell::PUT | Cell::BOUND;
        let interior = self.wave(inside_point, |field, p| field.cell(p).is_not_bound(bound_cond));

        for &p in chain {
            let mut c = self.cell(p);
            c.clear_tag();
            self.set_cell(p, c);
        }

        let mut captured = 0i32;
        let mut freed = 0i32;
        for &p in &interior {
            let cell = self.cell(p);
            if cell.is_put() {
                if cell.player() != player {
                    captured += 1;
                } else if cell.is_captured() {
                    freed += 1;
                }
            }
        }
        self.add_capture_count(player, captured);
        self.add_capture_count(player.next(), -freed);

        let becomes_capture = match self.sur_cond() {
            SurCond::Always | SurCond::AlwaysEnemy => true,
            SurCond::Standard => captured != 0,
        };

        if becomes_capture {
            for &p in chain {
                let mut c = self.cell(p);
                c.set_base_bound();
                self.push_change(p);
                self.set_cell(p, c);
            }
            for &p in &interior {
                let cell = self.cell(p);
                self.push_change(p);
                let mut c = cell;
                if cell.is_put() {
                    if cell.player() != player {
                        c.capture();
                    } else {
                        c.free();
                    }
                } else {
                    c.capture();
                }
                self.set_cell(p, c);
            }
        } else {
            for &p in &interior {
                let cell = self.cell(p);
                if !cell.is_put() {
                    let mut c = cell;
                    c.set_empty_base();
                    self.push_change(p);
                    self.set_cell(p, c);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::field::BeginPattern;
    use crate::engine::zobrist::ZobristTable;
    use std::sync::Arc;

    fn test_field() -> Field {
        let zobrist = Arc::new(ZobristTable::new(20 * 20, 3));
        Field::new(20, 20, BeginPattern::Clean, zobrist, SurCond::Standard)
    }

    #[test]
    fn simple_capture_surrounds_one_enemy_stone() {
        let mut field = test_field();
        // Black stone at the centre, Red traces a diamond around it.
        let cx = field.width() / 2;
        let cy = field.height() / 2;
        field.set_player(Player::Black);
        field.do_step(field.to_pos(cx, cy));

        field.set_player(Player::Red);
        field.do_step(field.to_pos(cx, cy - 1));
        field.do_step(field.to_pos(cx + 1, cy));
        field.do_step(field.to_pos(cx, cy + 1));
        field.do_step(field.to_pos(cx - 1, cy));

        assert_eq!(field.capture_count(Player::Red), 1);
        assert!(field.cell(field.to_pos(cx, cy)).is_captured());
    }

    #[test]
    fn no_chain_no_capture() {
        let mut field = test_field();
        field.do_step(field.to_pos(5, 5));
        assert_eq!(field.capture_count(Player::Red), 0);
        assert_eq!(field.capture_count(Player::Black), 0);
    }

    #[test]
    fn empty_base_then_enemy_placement_captures() {
        let mut field = test_field();
        let cx = field.width() / 2;
        let cy = field.height() / 2;

        // Red traces a diamond around an empty point: creates an empty base.
        field.set_player(Player::Red);
        field.do_step(field.to_pos(cx, cy - 1));
        field.do_step(field.to_pos(cx + 1, cy));
        field.do_step(field.to_pos(cx, cy + 1));
        field.do_step(field.to_pos(cx - 1, cy));
        assert!(field.cell(field.to_pos(cx, cy)).is_in_empty_base());

        // Black plays into the empty base: Red's base resolves into a capture.
        field.set_player(Player::Black);
        field.do_step(field.to_pos(cx, cy));

        assert!(!field.cell(field.to_pos(cx, cy)).is_in_empty_base());
        assert!(field.cell(field.to_pos(cx, cy)).is_captured());
        assert_eq!(field.capture_count(Player::Red), 1);
    }
}
