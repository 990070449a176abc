use super::*;

impl MazeEngine {
    /// Rooms seen from `from`: the room itself, then up to `visibility_range`
    /// rooms along each straight run of passages (north, south, west, east).
    /// Empty when `from` is off the grid.
    pub fn visible_rooms(&self, from: Vec2) -> Vec<Vec2> {
        let Some(origin) = self.graph.index_of(from) else {
            return Vec::new();
        };
        self.visible_ids(origin)
            .into_iter()
            .map(|id| self.graph.node(id).pos())
            .collect()
    }

    pub(super) fn visible_ids(&self, origin: NodeId) -> Vec<NodeId> {
        let range = self.settings.visibility_range;
        let mut rooms = Vec::with_capacity(1 + 4 * range.min(self.graph.nodes().len()));
        rooms.push(origin);

        for dir in RAY_ORDER {
            let mut current = origin;
            for _ in 0..range {
                let Some(next) = self.graph.passage_to(current, dir) else {
                    break;
                };
                rooms.push(next);
                current = next;
            }
        }
        rooms
    }

    /// Flags everything the player can see as visited. Flags are never cleared.
    pub fn mark_visible(&mut self) {
        let Some(origin) = self.graph.index_of(self.player) else {
            return;
        };
        for id in self.visible_ids(origin) {
            self.graph.node_mut(id).visited = true;
        }
    }
}
