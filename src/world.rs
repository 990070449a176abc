use std::hash::{Hash, Hasher};

use log::debug;

use crate::rng::Rng;
use crate::types::{Direction, Occupant, Vec2};

pub type NodeId = usize;
pub type EdgeId = usize;

/// A wall between two rooms. Border walls only have `side_a`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    side_a: NodeId,
    side_b: Option<NodeId>,
    passage: bool,
}

impl Edge {
    fn new(side_a: NodeId) -> Self {
        Self {
            side_a,
            side_b: None,
            passage: false,
        }
    }

    pub fn side_a(&self) -> NodeId {
        self.side_a
    }

    pub fn side_b(&self) -> Option<NodeId> {
        self.side_b
    }

    pub fn is_passage(&self) -> bool {
        self.passage
    }

    pub fn is_border(&self) -> bool {
        self.side_b.is_none()
    }

    /// The room across this wall from `side`, or `None` when `side` is not
    /// one of its rooms or there is nothing on the far side.
    pub fn other(&self, side: NodeId) -> Option<NodeId> {
        if side == self.side_a {
            self.side_b
        } else if Some(side) == self.side_b {
            Some(self.side_a)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pos: Vec2,
    edges: [Option<EdgeId>; 4],
    pub(crate) occupant: Occupant,
    pub(crate) visited: bool,
    pub(crate) in_tree: bool,
}

impl Node {
    fn new(x: i32, y: i32) -> Self {
        Self {
            pos: Vec2 { x, y },
            edges: [None; 4],
            occupant: Occupant::Empty,
            visited: false,
            in_tree: false,
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn x(&self) -> i32 {
        self.pos.x
    }

    pub fn y(&self) -> i32 {
        self.pos.y
    }

    pub fn edge(&self, dir: Direction) -> Option<EdgeId> {
        self.edges[dir.index()]
    }

    pub fn occupant(&self) -> Occupant {
        self.occupant
    }

    pub fn is_visited(&self) -> bool {
        self.visited
    }

    pub fn is_part_of_spanning_tree(&self) -> bool {
        self.in_tree
    }
}

// Two nodes are the same room when their coordinates match, whatever their
// transient state.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pos.hash(state);
    }
}

#[derive(Clone, Debug)]
pub struct MazeGraph {
    width: i32,
    height: i32,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl MazeGraph {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut graph = Self {
            width,
            height,
            nodes: Vec::with_capacity(width as usize * height as usize),
            edges: Vec::new(),
        };
        for y in 0..height {
            for x in 0..width {
                graph.nodes.push(Node::new(x, y));
            }
        }
        for id in 0..graph.nodes.len() {
            for dir in Direction::ALL {
                graph.link_wall(id, dir);
            }
        }
        graph
    }

    /// Gives `id` a wall on `dir`, reusing the neighbour's wall when the
    /// neighbour already built one on the shared side.
    fn link_wall(&mut self, id: NodeId, dir: Direction) {
        if self.nodes[id].edges[dir.index()].is_some() {
            return;
        }
        let edge_id = self.edges.len();
        self.edges.push(Edge::new(id));
        self.nodes[id].edges[dir.index()] = Some(edge_id);

        let Some(neighbor) = self.step(id, dir) else {
            return;
        };
        let back = dir.opposite().index();
        if self.nodes[neighbor].edges[back].is_none() {
            self.nodes[neighbor].edges[back] = Some(edge_id);
            self.edges[edge_id].side_b = Some(neighbor);
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn index_of(&self, pos: Vec2) -> Option<NodeId> {
        if !self.contains(pos) {
            return None;
        }
        Some(pos.y as usize * self.width as usize + pos.x as usize)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn node_at(&self, pos: Vec2) -> Option<&Node> {
        self.index_of(pos).map(|id| &self.nodes[id])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id]
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Node]> {
        self.nodes.chunks(self.width as usize)
    }

    /// Grid neighbour in `dir`, ignoring walls.
    pub fn step(&self, id: NodeId, dir: Direction) -> Option<NodeId> {
        let pos = self.nodes[id].pos;
        let (dx, dy) = dir.delta();
        self.index_of(Vec2::new(pos.x + dx, pos.y + dy))
    }

    pub fn is_open(&self, id: NodeId, dir: Direction) -> bool {
        self.nodes[id]
            .edge(dir)
            .map(|edge| self.edges[edge].passage)
            .unwrap_or(false)
    }

    pub fn passage_to(&self, id: NodeId, dir: Direction) -> Option<NodeId> {
        let edge = &self.edges[self.nodes[id].edge(dir)?];
        if !edge.passage {
            return None;
        }
        edge.other(id)
    }

    /// Closed interior walls around `id`: the candidates for carving.
    pub fn valid_walls(&self, id: NodeId) -> Vec<EdgeId> {
        Direction::ALL
            .iter()
            .filter_map(|dir| self.nodes[id].edge(*dir))
            .filter(|edge| {
                let edge = &self.edges[*edge];
                !edge.passage && !edge.is_border()
            })
            .collect()
    }

    pub fn adjacent_rooms(&self, id: NodeId) -> Vec<NodeId> {
        Direction::ALL
            .iter()
            .filter_map(|dir| self.passage_to(id, *dir))
            .collect()
    }

    pub fn passage_count(&self) -> usize {
        self.edges.iter().filter(|edge| edge.passage).count()
    }

    /// Randomized Prim's: grows a spanning tree from `root` by opening one
    /// frontier wall at a time. Returns the number of passages carved.
    pub fn carve_spanning_tree(&mut self, root: NodeId, rng: &mut Rng) -> usize {
        self.nodes[root].in_tree = true;
        let mut frontier = self.valid_walls(root);
        let mut carved = 0;

        while !frontier.is_empty() {
            let edge_id = frontier.swap_remove(rng.pick_index(frontier.len()));
            let edge = &self.edges[edge_id];
            let Some(side_b) = edge.side_b else {
                continue;
            };
            let side_a = edge.side_a;
            let fresh = match (self.nodes[side_a].in_tree, self.nodes[side_b].in_tree) {
                (true, false) => side_b,
                (false, true) => side_a,
                _ => continue,
            };

            self.edges[edge_id].passage = true;
            self.nodes[fresh].in_tree = true;
            carved += 1;
            frontier.extend(self.valid_walls(fresh));
        }

        debug!(
            "carved {carved} passages over {}x{} grid from root {}",
            self.width, self.height, self.nodes[root].pos
        );
        carved
    }
}
