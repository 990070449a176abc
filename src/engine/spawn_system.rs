use super::*;

impl MazeEngine {
    /// Drops each monster on a uniformly random room. Monsters may share a
    /// room with each other or with the player.
    pub(super) fn spawn_monsters(&mut self) {
        for _ in 0..self.settings.monster_count {
            let spawn = self.random_room();
            self.monsters.push(spawn);
        }
        debug!("spawned {} monsters", self.monsters.len());
    }

    pub(super) fn place_exit(&mut self) -> Result<Vec2> {
        let candidates = self.candidate_rooms(|engine, pos| engine.is_valid_exit(pos));
        self.rng
            .pick(&candidates)
            .copied()
            .ok_or(MazeError::NoValidPlacement { item: "exit" })
    }

    /// Must run after the exit is placed.
    pub(super) fn place_key(&mut self) -> Result<Vec2> {
        let candidates = self.candidate_rooms(|engine, pos| engine.is_valid_key(pos));
        self.rng
            .pick(&candidates)
            .copied()
            .ok_or(MazeError::NoValidPlacement { item: "key" })
    }

    pub(super) fn is_valid_exit(&self, pos: Vec2) -> bool {
        self.is_open_tree_room(pos) && on_border(pos, self.graph.width(), self.graph.height())
    }

    pub(super) fn is_valid_key(&self, pos: Vec2) -> bool {
        self.is_open_tree_room(pos)
            && in_key_half(pos, self.exit, self.graph.width(), self.graph.height())
    }

    fn is_open_tree_room(&self, pos: Vec2) -> bool {
        let in_tree = self
            .graph
            .node_at(pos)
            .map(|node| node.is_part_of_spanning_tree())
            .unwrap_or(false);
        in_tree && pos != self.player && !self.monsters.contains(&pos)
    }

    // Uniform over the accepted rooms, same as resampling until one fits.
    fn candidate_rooms(&self, accept: impl Fn(&Self, Vec2) -> bool) -> Vec<Vec2> {
        self.graph
            .nodes()
            .iter()
            .map(|node| node.pos())
            .filter(|pos| accept(self, *pos))
            .collect()
    }

    fn random_room(&mut self) -> Vec2 {
        let x = self.rng.int(0, self.graph.width() - 1);
        let y = self.rng.int(0, self.graph.height() - 1);
        Vec2 { x, y }
    }
}
