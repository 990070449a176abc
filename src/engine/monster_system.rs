use super::*;

impl MazeEngine {
    /// Moves every monster one step. Monsters chase where the player stood
    /// before this turn's move.
    pub(super) fn move_monsters(&mut self, player_before: Vec2) {
        for idx in 0..self.monsters.len() {
            let monster = self.monsters[idx];
            if monster == self.player {
                continue;
            }
            let Some(origin) = self.graph.index_of(monster) else {
                continue;
            };

            let sees_player = self
                .visible_ids(origin)
                .into_iter()
                .any(|id| self.graph.node(id).pos() == player_before);
            let next = if sees_player {
                self.pursuit_step(origin, player_before)
            } else {
                let rooms = self.graph.adjacent_rooms(origin);
                self.rng.pick(&rooms).copied()
            };

            if let Some(next) = next {
                self.monsters[idx] = self.graph.node(next).pos();
            }
        }
    }

    fn pursuit_step(&self, origin: NodeId, target: Vec2) -> Option<NodeId> {
        let from = self.graph.node(origin).pos();
        let dir = pursuit_direction(from, target)?;
        let next = self.graph.passage_to(origin, dir);
        if next.is_none() {
            debug!("monster at {from} blocked chasing {target} to the {dir:?}");
        }
        next
    }
}
