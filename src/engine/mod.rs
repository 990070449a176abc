use log::{debug, info};

use crate::config::MazeSettings;
use crate::constants::KEY_COLLECTED;
use crate::error::{MazeError, Result};
use crate::rng::Rng;
use crate::types::{
    CellView, Direction, GameMessage, GameState, MazeSnapshot, Occupant, TurnReport, Vec2,
};
use crate::world::{MazeGraph, Node, NodeId};

mod monster_system;
mod spawn_system;
mod utils;
mod vision_system;

pub use self::utils::pursuit_direction;
use self::utils::{in_key_half, on_border, RAY_ORDER};

#[derive(Clone, Debug)]
pub struct MazeEngine {
    settings: MazeSettings,
    seed: u64,
    graph: MazeGraph,
    rng: Rng,

    player: Vec2,
    key: Vec2,
    exit: Vec2,
    monsters: Vec<Vec2>,

    state: GameState,
    message: Option<GameMessage>,
    turn: u64,
}

impl MazeEngine {
    pub fn new(settings: MazeSettings, seed: u64) -> Result<Self> {
        settings.validate()?;
        let mut rng = Rng::new(seed);
        let mut graph = MazeGraph::new(settings.width, settings.height);

        let root = rng.pick_index(graph.nodes().len());
        graph.carve_spanning_tree(root, &mut rng);
        graph.node_mut(root).visited = true;
        let start = graph.node(root).pos();

        let mut engine = Self {
            settings,
            seed,
            graph,
            rng,
            player: start,
            key: KEY_COLLECTED,
            exit: start,
            monsters: Vec::with_capacity(settings.monster_count),
            state: GameState::Active,
            message: None,
            turn: 0,
        };
        engine.spawn_monsters();
        engine.exit = engine.place_exit()?;
        engine.key = engine.place_key()?;
        engine.sync_occupants();
        engine.mark_visible();

        debug!(
            "maze ready: seed={seed} player={} exit={} key={} monsters={:?}",
            engine.player, engine.exit, engine.key, engine.monsters
        );
        Ok(engine)
    }

    pub fn with_entropy(settings: MazeSettings) -> Result<Self> {
        let seed = Rng::from_entropy().next_seed();
        Self::new(settings, seed)
    }

    pub fn restart(&mut self) -> Result<()> {
        let seed = self.rng.next_seed();
        *self = Self::new(self.settings, seed)?;
        Ok(())
    }

    pub fn settings(&self) -> &MazeSettings {
        &self.settings
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn grid(&self) -> &MazeGraph {
        &self.graph
    }

    pub fn node(&self, pos: Vec2) -> Option<&Node> {
        self.graph.node_at(pos)
    }

    pub fn player(&self) -> Vec2 {
        self.player
    }

    /// The key's room, or [`KEY_COLLECTED`] once picked up.
    pub fn key(&self) -> Vec2 {
        self.key
    }

    pub fn has_key(&self) -> bool {
        self.key == KEY_COLLECTED
    }

    pub fn exit(&self) -> Vec2 {
        self.exit
    }

    pub fn monsters(&self) -> &[Vec2] {
        &self.monsters
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        self.state != GameState::Dead
    }

    pub fn is_escaped(&self) -> bool {
        self.state == GameState::Escaped
    }

    pub fn peek_message(&self) -> Option<GameMessage> {
        self.message
    }

    pub fn take_message(&mut self) -> Option<GameMessage> {
        self.message.take()
    }

    pub fn is_room_empty(&self, pos: Vec2) -> bool {
        !(self.player == pos || self.monsters.contains(&pos) || self.key == pos || self.exit == pos)
    }

    pub fn open_directions(&self, pos: Vec2) -> Vec<Direction> {
        let Some(id) = self.graph.index_of(pos) else {
            return Vec::new();
        };
        Direction::ALL
            .into_iter()
            .filter(|dir| self.graph.is_open(id, *dir))
            .collect()
    }

    pub fn move_player(&mut self, dir: Direction) -> TurnReport {
        let mut moved = false;

        if !self.state.is_terminal() {
            self.turn += 1;
            let start = self.player;
            match self.passage_from(start, dir) {
                Some(next) => {
                    self.player = next;
                    self.message = None;
                    moved = true;
                }
                None => self.message = Some(GameMessage::InvalidMove),
            }

            self.move_monsters(start);
            self.sync_occupants();
            self.mark_visible();
        }

        self.resolve_state();
        TurnReport {
            moved,
            message: self.message,
            state: self.state,
        }
    }

    /// Resolves death, key pickup and escape for the current positions.
    /// Messages left from earlier turns are discarded first.
    pub fn evaluate_state(&mut self) {
        self.message = None;
        self.resolve_state();
    }

    // Keeps whatever the move itself left pending.
    fn resolve_state(&mut self) {
        match self.state {
            GameState::Dead => {
                self.message = Some(GameMessage::Killed);
                return;
            }
            GameState::Escaped => {
                self.message = Some(GameMessage::Escaped);
                return;
            }
            GameState::Active => {}
        }

        let caught = self.monsters.contains(&self.player);

        if self.key == self.player {
            self.key = KEY_COLLECTED;
            self.raise(GameMessage::KeyFound);
            info!("key collected at {} on turn {}", self.player, self.turn);
        }

        if self.exit == self.player {
            if !self.has_key() {
                self.raise(GameMessage::ExitLocked);
            } else if !caught {
                self.state = GameState::Escaped;
                self.raise(GameMessage::Escaped);
                info!("player escaped through {} on turn {}", self.exit, self.turn);
            }
        }

        if caught {
            self.state = GameState::Dead;
            self.raise(GameMessage::Killed);
            info!("player killed at {} on turn {}", self.player, self.turn);
        }
    }

    pub fn visible_monsters(&self) -> Vec<Vec2> {
        let visible = self.visible_rooms(self.player);
        self.monsters
            .iter()
            .copied()
            .filter(|monster| visible.contains(monster))
            .collect()
    }

    pub fn snapshot(&self) -> MazeSnapshot {
        let cells = self
            .graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(id, node)| CellView {
                x: node.x(),
                y: node.y(),
                passages: Direction::ALL.map(|dir| self.graph.is_open(id, dir)),
                visited: node.is_visited(),
                occupant: node.occupant(),
            })
            .collect();

        MazeSnapshot {
            width: self.graph.width(),
            height: self.graph.height(),
            visibility_range: self.settings.visibility_range,
            cells,
            player: self.player,
            key: (!self.has_key()).then_some(self.key),
            exit: self.exit,
            monsters: self.monsters.clone(),
            visible: self.visible_rooms(self.player),
            state: self.state,
        }
    }

    fn passage_from(&self, pos: Vec2, dir: Direction) -> Option<Vec2> {
        let id = self.graph.index_of(pos)?;
        let next = self.graph.passage_to(id, dir)?;
        Some(self.graph.node(next).pos())
    }

    fn raise(&mut self, message: GameMessage) {
        if self.message.map_or(true, |current| message >= current) {
            self.message = Some(message);
        }
    }

    // The player's marker wins a shared room.
    fn sync_occupants(&mut self) {
        for node in self.graph.nodes_mut() {
            node.occupant = Occupant::Empty;
        }
        for idx in 0..self.monsters.len() {
            if let Some(id) = self.graph.index_of(self.monsters[idx]) {
                self.graph.node_mut(id).occupant = Occupant::Monster;
            }
        }
        if let Some(id) = self.graph.index_of(self.player) {
            self.graph.node_mut(id).occupant = Occupant::Player;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::config::MazeSettings;
    use crate::constants::KEY_COLLECTED;
    use crate::error::MazeError;
    use crate::types::{Direction, GameMessage, GameState, Occupant, Vec2};

    use super::MazeEngine;

    fn small(seed: u64) -> MazeEngine {
        MazeEngine::new(MazeSettings::new(5, 5, 0, 3), seed).expect("5x5 maze builds")
    }

    fn neighbor(engine: &MazeEngine, pos: Vec2, dir: Direction) -> Option<Vec2> {
        engine.passage_from(pos, dir)
    }

    fn first_open(engine: &MazeEngine) -> (Direction, Vec2) {
        let dir = engine.open_directions(engine.player())[0];
        let next = neighbor(engine, engine.player(), dir).expect("open direction has a room");
        (dir, next)
    }

    fn first_wall(engine: &MazeEngine) -> Option<Direction> {
        let open = engine.open_directions(engine.player());
        Direction::ALL.into_iter().find(|dir| !open.contains(dir))
    }

    /// Moves key and exit out of the way so scenarios only see what they set up.
    fn park_items(engine: &mut MazeEngine, avoid: &[Vec2]) {
        let free: Vec<Vec2> = engine
            .grid()
            .nodes()
            .iter()
            .map(|node| node.pos())
            .filter(|pos| !avoid.contains(pos))
            .collect();
        engine.exit = free[0];
        engine.key = free[1];
    }

    #[test]
    fn construction_rejects_non_positive_sides() {
        for (width, height) in [(0, 5), (5, 0), (-1, -1)] {
            let result = MazeEngine::new(MazeSettings::new(width, height, 0, 3), 1);
            assert!(matches!(
                result,
                Err(MazeError::InvalidConfiguration { .. })
            ));
        }
    }

    #[test]
    fn oversized_grids_fail_before_allocating() {
        let result = MazeEngine::new(MazeSettings::new(70_000, 70_000, 0, 1), 1);
        assert!(matches!(
            result,
            Err(MazeError::InvalidConfiguration { width: 70_000, .. })
        ));
    }

    #[test]
    fn single_room_grid_has_nowhere_for_the_exit() {
        let result = MazeEngine::new(MazeSettings::new(1, 1, 0, 3), 9);
        assert_eq!(
            result.err(),
            Some(MazeError::NoValidPlacement { item: "exit" })
        );
    }

    #[test]
    fn generated_mazes_are_spanning_trees() {
        for seed in 0..100u64 {
            let engine = MazeEngine::new(MazeSettings::new(7, 6, 2, 3), seed).expect("maze builds");
            assert_eq!(engine.grid().passage_count(), 7 * 6 - 1);
            assert_eq!(engine.grid().nodes().len(), 42);
        }
    }

    #[test]
    fn start_room_is_visited_and_holds_the_player() {
        let engine = small(3);
        let start = engine.node(engine.player()).expect("player on grid");
        assert!(start.is_visited());
        assert_eq!(start.occupant(), Occupant::Player);
        assert_eq!(engine.state(), GameState::Active);
        assert!(!engine.has_key());
    }

    #[test]
    fn placements_follow_the_rules() {
        for seed in 0..200u64 {
            let settings = MazeSettings::new(9, 7, 4, 2);
            let engine = MazeEngine::new(settings, seed).expect("maze builds");
            let (w, h) = (settings.width, settings.height);
            let exit = engine.exit();
            let key = engine.key();

            assert_eq!(engine.monsters().len(), 4);
            for monster in engine.monsters() {
                assert!(engine.grid().contains(*monster));
            }

            assert!(exit.x == 0 || exit.y == 0 || exit.x == w - 1 || exit.y == h - 1);
            assert_ne!(exit, engine.player());
            assert!(!engine.monsters().contains(&exit));

            assert_ne!(key, engine.player());
            assert!(!engine.monsters().contains(&key));
            let opposite = (exit.x == 0 && key.x >= w / 2)
                || (exit.x == w - 1 && key.x <= w / 2)
                || (exit.y == 0 && key.y >= h / 2)
                || (exit.y == h - 1 && key.y <= h / 2);
            assert!(opposite, "seed={seed} exit={exit} key={key}");
        }
    }

    #[test]
    fn same_seed_builds_and_plays_identically() {
        let settings = MazeSettings::new(12, 12, 5, 3);
        let mut a = MazeEngine::new(settings, 2024).expect("maze builds");
        let mut b = MazeEngine::new(settings, 2024).expect("maze builds");
        assert_eq!(a.grid().edges(), b.grid().edges());

        let moves = [
            Direction::North,
            Direction::East,
            Direction::East,
            Direction::South,
            Direction::West,
        ];
        for _ in 0..20 {
            for dir in moves {
                assert_eq!(a.move_player(dir), b.move_player(dir));
                assert_eq!(a.player(), b.player());
                assert_eq!(a.monsters(), b.monsters());
            }
        }
    }

    #[test]
    fn moving_through_a_passage_enters_the_neighbour() {
        let mut engine = small(17);
        let start = engine.player();
        let (dir, expected) = first_open(&engine);
        park_items(&mut engine, &[start, expected]);

        let report = engine.move_player(dir);
        assert!(report.moved);
        assert_eq!(report.message, None);
        assert_eq!(engine.player(), expected);
        assert_eq!(
            engine.node(expected).map(|node| node.occupant()),
            Some(Occupant::Player)
        );
        assert_eq!(
            engine.node(start).map(|node| node.occupant()),
            Some(Occupant::Empty)
        );
        assert_eq!(engine.turn(), 1);
    }

    #[test]
    fn bumping_a_wall_keeps_the_player_in_place() {
        let (mut engine, wall) = (0..500u64)
            .find_map(|seed| {
                let engine = small(seed);
                first_wall(&engine).map(|dir| (engine, dir))
            })
            .expect("some maze has a wall next to the start");
        let start = engine.player();
        park_items(&mut engine, &[start]);

        let report = engine.move_player(wall);
        assert!(!report.moved);
        assert_eq!(engine.player(), start);
        assert_eq!(report.message, Some(GameMessage::InvalidMove));
        assert_eq!(
            engine.take_message().map(|msg| msg.to_string()),
            Some("Invalid Move: Why are you running into walls?".to_string())
        );
    }

    #[test]
    fn take_message_drains_once() {
        let mut engine = small(5);
        engine.message = Some(GameMessage::KeyFound);
        assert_eq!(engine.take_message(), Some(GameMessage::KeyFound));
        assert_eq!(engine.take_message(), None);
        assert_eq!(engine.peek_message(), None);
    }

    #[test]
    fn standing_on_the_key_collects_it() {
        let mut engine = small(8);
        engine.key = engine.player();

        engine.evaluate_state();
        assert_eq!(engine.key(), KEY_COLLECTED);
        assert!(engine.has_key());
        assert_eq!(
            engine.take_message().map(|msg| msg.to_string()),
            Some("You found the key!".to_string())
        );
        assert_eq!(engine.state(), GameState::Active);
    }

    #[test]
    fn reaching_the_exit_with_the_key_escapes() {
        let mut engine = small(21);
        let (dir, next) = first_open(&engine);
        engine.key = KEY_COLLECTED;
        engine.exit = next;

        let report = engine.move_player(dir);
        assert_eq!(report.state, GameState::Escaped);
        assert!(engine.is_escaped());
        assert!(engine.is_alive());
        assert_eq!(
            engine.take_message().map(|msg| msg.to_string()),
            Some("Congratulations you've escaped the Death Maze!".to_string())
        );
    }

    #[test]
    fn key_and_exit_in_the_same_room_escape_in_one_turn() {
        let mut engine = small(22);
        let (dir, next) = first_open(&engine);
        engine.key = next;
        engine.exit = next;

        engine.move_player(dir);
        assert!(engine.is_escaped());
        assert_eq!(engine.take_message(), Some(GameMessage::Escaped));
    }

    #[test]
    fn reaching_the_exit_without_the_key_is_locked() {
        let mut engine = small(23);
        let start = engine.player();
        let (dir, next) = first_open(&engine);
        park_items(&mut engine, &[start, next]);
        engine.exit = next;

        engine.move_player(dir);
        assert_eq!(engine.state(), GameState::Active);
        assert_eq!(
            engine.take_message().map(|msg| msg.to_string()),
            Some("You found the exit, but you don't have the key!".to_string())
        );
    }

    #[test]
    fn monster_in_the_room_kills_even_on_the_exit() {
        let mut engine = small(31);
        engine.key = KEY_COLLECTED;
        let here = engine.player();
        engine.exit = here;
        engine.monsters.push(here);

        engine.evaluate_state();
        assert!(!engine.is_alive());
        assert!(!engine.is_escaped());
        assert_eq!(
            engine.take_message().map(|msg| msg.to_string()),
            Some("GAME OVER: You got killed by a Monster!".to_string())
        );
    }

    #[test]
    fn terminal_states_freeze_the_board() {
        let mut engine = small(41);
        let here = engine.player();
        engine.monsters.push(here);
        engine.evaluate_state();
        assert_eq!(engine.state(), GameState::Dead);

        let start = engine.player();
        let turn = engine.turn();
        for dir in Direction::ALL {
            let report = engine.move_player(dir);
            assert!(!report.moved);
            assert_eq!(report.state, GameState::Dead);
            assert_eq!(report.message, Some(GameMessage::Killed));
            assert_eq!(engine.player(), start);
            assert!(!engine.is_escaped());
        }
        assert_eq!(engine.turn(), turn);

        let mut engine = small(42);
        engine.state = GameState::Escaped;
        let start = engine.player();
        let (dir, _) = first_open(&engine);
        engine.move_player(dir);
        assert_eq!(engine.player(), start);
        assert!(engine.is_alive());
        assert_eq!(engine.take_message(), Some(GameMessage::Escaped));
    }

    #[test]
    fn monster_sharing_the_room_stays_for_the_kill() {
        let (mut engine, wall) = (0..500u64)
            .find_map(|seed| {
                let engine = small(seed);
                first_wall(&engine).map(|dir| (engine, dir))
            })
            .expect("some maze has a wall next to the start");
        let start = engine.player();
        park_items(&mut engine, &[start]);
        engine.monsters = vec![start];

        engine.move_player(wall);
        assert_eq!(engine.monsters(), &[start]);
        assert!(!engine.is_alive());
    }

    #[test]
    fn visited_rooms_never_go_dark() {
        let mut engine =
            MazeEngine::new(MazeSettings::new(10, 10, 3, 2), 77).expect("maze builds");
        let mut seen: HashSet<Vec2> = HashSet::new();
        for turn in 0..200usize {
            for node in engine.grid().nodes() {
                if seen.contains(&node.pos()) {
                    assert!(node.is_visited());
                }
                if node.is_visited() {
                    seen.insert(node.pos());
                }
            }
            if !engine.is_alive() || engine.is_escaped() {
                break;
            }
            engine.move_player(Direction::ALL[turn % 4]);
        }
        assert!(!seen.is_empty());
    }

    #[test]
    fn room_is_empty_only_without_characters_or_items() {
        let mut engine =
            MazeEngine::new(MazeSettings::new(6, 6, 1, 3), 12).expect("maze builds");
        assert!(!engine.is_room_empty(engine.player()));
        assert!(!engine.is_room_empty(engine.exit()));
        assert!(!engine.is_room_empty(engine.key()));
        assert!(!engine.is_room_empty(engine.monsters()[0]));

        let taken = [
            engine.player(),
            engine.exit(),
            engine.key(),
            engine.monsters()[0],
        ];
        let free = engine
            .grid()
            .nodes()
            .iter()
            .map(|node| node.pos())
            .find(|pos| !taken.contains(pos))
            .expect("a 6x6 grid has free rooms");
        assert!(engine.is_room_empty(free));

        engine.key = KEY_COLLECTED;
        assert!(engine.is_room_empty(taken[2]));
    }

    #[test]
    fn visible_monsters_are_those_in_sight() {
        let mut engine = small(50);
        let (_, next) = first_open(&engine);
        let far = engine
            .grid()
            .nodes()
            .iter()
            .map(|node| node.pos())
            .find(|pos| !engine.visible_rooms(engine.player()).contains(pos));
        engine.monsters = vec![next];
        if let Some(far) = far {
            engine.monsters.push(far);
        }
        assert_eq!(engine.visible_monsters(), vec![next]);
    }

    #[test]
    fn snapshot_mirrors_board_state() {
        let engine = MazeEngine::new(MazeSettings::new(6, 4, 2, 2), 99).expect("maze builds");
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.width, 6);
        assert_eq!(snapshot.height, 4);
        assert_eq!(snapshot.cells.len(), 24);
        assert_eq!(snapshot.player, engine.player());
        assert_eq!(snapshot.key, Some(engine.key()));
        assert_eq!(snapshot.monsters, engine.monsters().to_vec());
        assert_eq!(snapshot.state, GameState::Active);

        let open: usize = snapshot
            .cells
            .iter()
            .map(|cell| cell.passages.iter().filter(|open| **open).count())
            .sum();
        assert_eq!(open, 2 * (24 - 1));

        let json = serde_json::to_value(&snapshot).expect("snapshot serializes");
        assert_eq!(json["visibilityRange"], 2);
        assert_eq!(json["state"], "active");
    }

    #[test]
    fn fresh_evaluation_ignores_stale_messages() {
        let mut engine = small(26);
        let here = engine.player();
        park_items(&mut engine, &[here]);
        engine.exit = here;
        engine.message = Some(GameMessage::KeyFound);

        engine.evaluate_state();
        assert_eq!(engine.peek_message(), Some(GameMessage::ExitLocked));
        assert_eq!(engine.state(), GameState::Active);

        engine.exit = engine.key();
        engine.evaluate_state();
        assert_eq!(engine.peek_message(), None);
    }

    #[test]
    fn restart_builds_a_fresh_board() {
        let mut engine = small(60);
        let here = engine.player();
        engine.monsters.push(here);
        engine.evaluate_state();
        assert!(!engine.is_alive());

        engine.restart().expect("restart succeeds");
        assert_eq!(engine.state(), GameState::Active);
        assert_eq!(engine.turn(), 0);
        assert_eq!(engine.settings(), &MazeSettings::new(5, 5, 0, 3));
        assert_ne!(engine.seed(), 60);
        assert_eq!(engine.grid().passage_count(), 24);
    }
}
