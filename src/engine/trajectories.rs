//! Builds, for each side, the set of forced-looking capture lines near the
//! current position, and prunes them down to a small move set that the
//! search trees expand instead of every legal point.

use std::sync::Arc;

use itertools::Itertools;

use crate::engine::field::Field;
use crate::engine::player::Player;
use crate::engine::trajectory::Trajectory;
use crate::engine::zobrist::ZobristTable;

/// A point must touch at least this many distinct groups of the mover's
/// own stones to be worth tracing a trajectory through — otherwise it's
/// almost never part of a real capture race.
const MIN_NEAR_GROUPS: u32 = 2;

#[derive(Clone)]
pub struct Trajectories {
    red: Vec<Trajectory>,
    black: Vec<Trajectory>,
    projection: Vec<u32>,
    depth: [u32; 2],
    moves: [Vec<usize>; 2],
    all_moves: Vec<usize>,
    zobrist: Arc<ZobristTable>,
}

impl Trajectories {
    pub fn new(zobrist: Arc<ZobristTable>) -> Trajectories {
        let len = zobrist.len();
        Trajectories {
            red: Vec::new(),
            black: Vec::new(),
            projection: vec![0; len],
            depth: [0, 0],
            moves: [Vec::new(), Vec::new()],
            all_moves: Vec::new(),
            zobrist,
        }
    }

    fn side(&self, player: Player) -> &Vec<Trajectory> {
        match player {
            Player::Red => &self.red,
            Player::Black => &self.black,
        }
    }

    fn side_mut(&mut self, player: Player) -> &mut Vec<Trajectory> {
        match player {
            Player::Red => &mut self.red,
            Player::Black => &mut self.black,
        }
    }

    pub fn trajectories(&self, player: Player) -> &[Trajectory] {
        self.side(player)
    }

    /// The pruned move set produced by the most recent `calculate_moves`.
    pub fn moves(&self) -> &[usize] {
        &self.all_moves
    }

    /// The pruned move set for just `player`'s own trajectories, used as
    /// the move list `calculate_max_score` iterates — the combined set
    /// would let it "play" points that only matter to the opponent's race.
    pub fn moves_for(&self, player: Player) -> &[usize] {
        &self.moves[player.index()]
    }

    pub fn depth(&self, player: Player) -> u32 {
        self.depth[player.index()]
    }

    /// Adds `trajectory` for `player` if every point on it is
    /// sufficiently connected to the mover's own stones, and no
    /// already-known trajectory for this player has the same hash.
    fn add_trajectory(&mut self, field: &Field, player: Player, trajectory: Trajectory) {
        if trajectory.is_empty() {
            return;
        }
        let well_connected = trajectory
            .points()
            .iter()
            .all(|&p| field.cell(p).is_base_bound() || field.number_near_groups(p, player) >= MIN_NEAR_GROUPS);
        if !well_connected {
            return;
        }
        if self.side(player).iter().any(|t| t.hash() == trajectory.hash()) {
            return;
        }
        self.side_mut(player).push(trajectory);
    }

    /// Reuses an enemy trajectory that survived the move just played at
    /// `pos`, by stripping `pos` out of it (the original would have
    /// played through `pos` but it's already occupied by the mover now).
    fn add_trajectory_without_point(&mut self, field: &Field, player: Player, trajectory: &Trajectory, pos: usize) {
        let stripped = trajectory.without_point(pos, &self.zobrist, player);
        self.add_trajectory(field, player, stripped);
    }

    /// Explores placements near `player`'s own stones, extending `current`
    /// one point at a time, accepting any line whose last move nets a
    /// positive score change (a capture), and recursing up to `depth`
    /// plies past that for multi-step forced sequences.
    fn build_trajectories_recursive(
        &mut self,
        field: &mut Field,
        player: Player,
        depth: u32,
        current: &mut Trajectory,
        candidates: &[usize],
    ) {
        for &pos in candidates {
            if !field.cell(pos).putting_allowed() {
                continue;
            }
            if !field.is_near(pos, player) {
                continue;
            }

            let in_empty_base = field.cell(pos).is_in_empty_base();
            field.do_step_as(pos, player);
            current.push_back(pos, &self.zobrist, player);

            let d_score = field.d_score();
            if in_empty_base {
                if d_score > 0 {
                    self.add_trajectory(field, player, current.clone());
                }
            } else if d_score > 0 {
                self.add_trajectory(field, player, current.clone());
            } else if depth > 0 {
                self.build_trajectories_recursive(field, player, depth - 1, current, candidates);
            }

            current.pop_back(&self.zobrist, player);
            field.undo_step();
        }
    }

    fn candidate_positions(field: &Field) -> Vec<usize> {
        (field.min_pos()..=field.max_pos())
            .filter(|&p| field.cell(p).putting_allowed())
            .collect()
    }

    /// Traces `player`'s trajectories from scratch: a no-op when `player`'s
    /// configured depth is zero (no plies budgeted at all), otherwise one
    /// placement per candidate followed by `depth - 1` further plies of
    /// recursion, matching the original's `buildPlayerTrajectories`
    /// (the recursive call already accounts for the ply it was entered
    /// on, so the remaining-depth argument is one less than the budget).
    fn build_player_trajectories(&mut self, field: &mut Field, player: Player, candidates: &[usize]) {
        let depth = self.depth[player.index()];
        if depth == 0 {
            return;
        }
        let mut current = Trajectory::new();
        self.build_trajectories_recursive(field, player, depth - 1, &mut current, candidates);
    }

    /// Rebuilds both sides' trajectories from scratch at full depth.
    /// `depth` is split so the side to move gets the larger (or equal)
    /// half, matching its first-mover advantage in a forced race.
    pub fn build_trajectories(&mut self, field: &mut Field, player: Player, depth: u32) {
        self.red.clear();
        self.black.clear();
        self.depth[player.index()] = (depth + 1) / 2;
        self.depth[player.next().index()] = depth / 2;

        let candidates = Self::candidate_positions(field);
        self.build_player_trajectories(field, player, &candidates);
        self.build_player_trajectories(field, player.next(), &candidates);
        self.calculate_moves(field);
    }

    /// Rebuilds trajectories after `pos` was played by `player`: the
    /// mover's own trajectories are rebuilt from scratch (the board
    /// changed too much to reuse them cheaply), but the opponent's
    /// trajectories that didn't touch `pos` are filtered and reused
    /// as-is, and those that did touch it are reused with `pos` stripped.
    pub fn build_trajectories_incremental(&mut self, field: &mut Field, last: &Trajectories, player: Player, pos: usize) {
        let enemy = player.next();
        self.depth[player.index()] = last.depth[player.index()];
        self.depth[enemy.index()] = last.depth[enemy.index()].saturating_sub(1);

        let candidates = Self::candidate_positions(field);

        self.red.clear();
        self.black.clear();

        self.build_player_trajectories(field, player, &candidates);

        let enemy_depth = self.depth[enemy.index()] as usize;
        if enemy_depth > 0 {
            let carried: Vec<Trajectory> = last
                .side(enemy)
                .iter()
                .filter(|t| (t.len() <= enemy_depth || (t.len() == enemy_depth + 1 && t.contains(pos))) && t.is_valid_except(field, pos))
                .cloned()
                .collect();
            for t in carried {
                if t.contains(pos) {
                    self.add_trajectory_without_point(field, enemy, &t, pos);
                } else {
                    self.add_trajectory(field, enemy, t);
                }
            }
        }

        self.calculate_moves(field);
    }

    /// Rebuilds trajectories after an enemy move that did *not* land on
    /// any of the mover's traced points: both sides' trajectories are
    /// simply filtered for continued validity and reused.
    pub fn build_trajectories_refresh(&mut self, field: &Field, last: &Trajectories) {
        self.depth = last.depth;
        self.red = last.red.iter().filter(|t| t.is_valid(field)).cloned().collect();
        self.black = last.black.iter().filter(|t| t.is_valid(field)).cloned().collect();
        self.calculate_moves(field);
    }

    fn project(&mut self) {
        for t in self.red.iter().chain(self.black.iter()) {
            if t.is_excluded() {
                continue;
            }
            for &p in t.points() {
                self.projection[p] += 1;
            }
        }
    }

    fn unproject(&mut self) {
        for t in self.red.iter().chain(self.black.iter()) {
            if t.is_excluded() {
                continue;
            }
            for &p in t.points() {
                self.projection[p] = self.projection[p].saturating_sub(1);
            }
        }
    }

    fn include_all_trajectories(&mut self) {
        for t in self.red.iter_mut().chain(self.black.iter_mut()) {
            t.set_excluded(false);
        }
    }

    /// XORs `t1`'s hash with the keys of every point `t2` has that `t1`
    /// doesn't, approximating the hash of their union for the composite
    /// check below.
    fn intersect_hash(&self, t1: &Trajectory, t2: &Trajectory, player: Player) -> u64 {
        let mut hash = t1.hash();
        for &p in t2.points() {
            if !t1.contains(p) {
                hash ^= self.zobrist.key(player, p);
            }
        }
        hash
    }

    /// Excludes any trajectory whose hash equals the combined hash of two
    /// other, smaller trajectories of the same colour: it's redundant,
    /// since playing out the two smaller ones covers the same ground.
    fn exclude_composite_trajectories(&mut self, player: Player) {
        let trajectories = self.side(player).clone();
        let n = trajectories.len();
        let mut to_exclude = Vec::new();
        for k in 0..n {
            if trajectories[k].is_excluded() {
                continue;
            }
            for i in 0..n {
                if i == k || trajectories[i].is_excluded() {
                    continue;
                }
                for j in 0..n {
                    if j == k || j == i || trajectories[j].is_excluded() {
                        continue;
                    }
                    if trajectories[k].len() > trajectories[i].len()
                        && trajectories[k].len() > trajectories[j].len()
                        && trajectories[k].hash() == self.intersect_hash(&trajectories[i], &trajectories[j], player)
                    {
                        to_exclude.push(k);
                    }
                }
            }
        }
        for k in to_exclude {
            self.side_mut(player)[k].set_excluded(true);
        }
    }

    /// Excludes trajectories that, after projection, have more than one
    /// point nobody else covers — the ambiguity means this trajectory
    /// alone isn't forcing anything, so it's not worth keeping in the
    /// pruned move set. Iterates to a fixed point since excluding one
    /// trajectory changes the projection counts others are judged by.
    fn exclude_unnecessary_trajectories(&mut self, player: Player) -> bool {
        let mut changed = false;
        loop {
            let mut excluded_this_round = false;
            let indices: Vec<usize> = (0..self.side(player).len())
                .filter(|&i| !self.side(player)[i].is_excluded())
                .collect();
            for i in indices {
                let unique_points = self.side(player)[i]
                    .points()
                    .iter()
                    .filter(|&&p| self.projection[p] == 1)
                    .count();
                if unique_points > 1 {
                    let points: Vec<usize> = self.side(player)[i].points().to_vec();
                    for p in points {
                        self.projection[p] = self.projection[p].saturating_sub(1);
                    }
                    self.side_mut(player)[i].set_excluded(true);
                    excluded_this_round = true;
                    changed = true;
                }
            }
            if !excluded_this_round {
                break;
            }
        }
        changed
    }

    fn collect_points(&self, player: Player) -> Vec<usize> {
        self.side(player)
            .iter()
            .filter(|t| !t.is_excluded())
            .flat_map(|t| t.points().iter().copied())
            .unique()
            .collect()
    }

    /// The full pipeline: drop redundant (composite) trajectories, project
    /// the survivors onto the board, drop the ones that turned out
    /// unnecessary once points are shared, collect what's left into
    /// `all_moves`, then restore every trajectory's `excluded` flag so the
    /// next call starts from the same base set.
    fn calculate_moves(&mut self, field: &Field) {
        self.exclude_composite_trajectories(Player::Red);
        self.exclude_composite_trajectories(Player::Black);

        self.project();

        loop {
            let a = self.exclude_unnecessary_trajectories(Player::Red);
            let b = self.exclude_unnecessary_trajectories(Player::Black);
            if !a && !b {
                break;
            }
        }

        let mut red_moves = self.collect_points(Player::Red);
        let mut black_moves = self.collect_points(Player::Black);
        red_moves.retain(|&p| field.cell(p).putting_allowed());
        black_moves.retain(|&p| field.cell(p).putting_allowed());

        let all_moves: Vec<usize> = red_moves.iter().copied().chain(black_moves.iter().copied()).unique().collect();

        self.unproject();
        self.include_all_trajectories();

        self.moves[Player::Red.index()] = red_moves;
        self.moves[Player::Black.index()] = black_moves;
        self.all_moves = all_moves;
    }

    /// Optimistic upper bound on `player`'s own score reachable by
    /// repeatedly playing moves from `player`'s own pruned set, never
    /// giving up ground and never letting the opponent move at all —
    /// this is a one-sided bound, not a game-tree value, used only to
    /// seed the alpha-beta root window.
    pub fn calculate_max_score(&self, field: &mut Field, player: Player, depth: u32) -> i32 {
        let sign = if player == Player::Red { 1 } else { -1 };
        let mut result = field.score() * sign;
        if depth > 0 {
            for &pos in self.moves_for(player) {
                if !field.cell(pos).putting_allowed() {
                    continue;
                }
                field.do_step_as(pos, player);
                if field.d_score() >= 0 {
                    let cur = self.calculate_max_score(field, player, depth - 1);
                    if cur > result {
                        result = cur;
                    }
                }
                field.undo_step();
            }
        }
        result
    }

    /// This side's best-case score plus the opponent's pruned-search
    /// depth worth of tempo, used as the alpha-beta root window's bound
    /// for the opposite colour.
    pub fn max_score(&self, field: &mut Field, player: Player) -> i32 {
        self.calculate_max_score(field, player, self.depth(player)) + self.depth(player.next()) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SurCond;
    use crate::engine::field::BeginPattern;

    fn test_field() -> (Field, Arc<ZobristTable>) {
        let zobrist = Arc::new(ZobristTable::new(20 * 20, 5));
        (Field::new(20, 20, BeginPattern::Clean, zobrist.clone(), SurCond::Standard), zobrist)
    }

    #[test]
    fn empty_board_has_no_trajectories() {
        let (mut field, zobrist) = test_field();
        let mut trajectories = Trajectories::new(zobrist);
        trajectories.build_trajectories(&mut field, Player::Red, 4);
        assert!(trajectories.trajectories(Player::Red).is_empty());
        assert!(trajectories.trajectories(Player::Black).is_empty());
    }

    #[test]
    fn fresh_build_is_idempotent_on_depth() {
        let (mut field, zobrist) = test_field();
        let mut trajectories = Trajectories::new(zobrist);
        trajectories.build_trajectories(&mut field, Player::Red, 4);
        assert_eq!(trajectories.depth(Player::Red), 2);
        assert_eq!(trajectories.depth(Player::Black), 2);
    }
}
