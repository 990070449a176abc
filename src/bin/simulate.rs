use clap::Parser;
use death_maze::config::MazeSettings;
use death_maze::engine::{pursuit_direction, MazeEngine};
use death_maze::error::MazeError;
use death_maze::rng::Rng;
use death_maze::types::{Direction, GameMessage, GameState, Vec2};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Plays Death Maze games with an autopilot and reports how they end.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, default_value_t = 1)]
    games: usize,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    width: Option<i32>,
    #[arg(long)]
    height: Option<i32>,
    #[arg(long)]
    monsters: Option<usize>,
    #[arg(long)]
    visibility: Option<usize>,
    /// JSON settings file; flags override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 2_000)]
    max_turns: u64,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Outcome {
    Escaped,
    Killed,
    Timeout,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct GameResultLine {
    game: usize,
    seed: u64,
    width: i32,
    height: i32,
    monsters: usize,
    visibility: usize,
    outcome: Outcome,
    turns: u64,
    #[serde(rename = "keyCollected")]
    key_collected: bool,
    #[serde(rename = "invalidMoves")]
    invalid_moves: u64,
    #[serde(rename = "roomsSeen")]
    rooms_seen: usize,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    settings: MazeSettings,
    #[serde(rename = "gameCount")]
    game_count: usize,
    #[serde(rename = "skippedCount")]
    skipped_count: usize,
    #[serde(rename = "averageTurns")]
    average_turns: u64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    games: Vec<GameResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    game: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    turn: Option<u64>,
    details: Value,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let run_started_at_ms = now_ms();
    let base_seed = cli.seed.unwrap_or(run_started_at_ms);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(base_seed, run_started_at_ms));

    let settings = match resolve_settings(&cli) {
        Ok(settings) => settings,
        Err(error) => {
            emit_log(
                "error",
                "invalid_settings",
                &run_id,
                None,
                None,
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(1);
        }
    };

    let mut results = Vec::new();
    let mut skipped = 0usize;
    for game in 0..cli.games {
        let seed = base_seed.wrapping_add(game as u64);
        emit_log(
            "info",
            "game_started",
            &run_id,
            Some(game),
            Some(seed),
            None,
            json!({ "settings": settings }),
        );

        let result = match run_game(game, settings, seed, cli.max_turns) {
            Ok(result) => result,
            Err(error) => {
                skipped += 1;
                emit_log(
                    "warn",
                    "game_skipped",
                    &run_id,
                    Some(game),
                    Some(seed),
                    None,
                    json!({ "error": error.to_string() }),
                );
                continue;
            }
        };

        emit_log(
            "info",
            "game_finished",
            &run_id,
            Some(game),
            Some(seed),
            Some(result.turns),
            json!({
                "outcome": result.outcome,
                "keyCollected": result.key_collected,
                "roomsSeen": result.rooms_seen,
            }),
        );
        match serde_json::to_string(&result) {
            Ok(line) => println!("{line}"),
            Err(error) => log::error!("failed to serialize game result: {error}"),
        }
        results.push(result);
    }

    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        now_ms(),
        settings,
        results,
        skipped,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "gameCount": summary.game_count,
            "skippedCount": summary.skipped_count,
            "averageTurns": summary.average_turns,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );
}

fn resolve_settings(cli: &Cli) -> Result<MazeSettings, MazeError> {
    let mut settings = match cli.config.as_ref() {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|error| {
                MazeError::SettingsFormat(format!("{}: {error}", path.display()))
            })?;
            MazeSettings::from_json_str(&raw)?
        }
        None => MazeSettings::default(),
    };
    if let Some(width) = cli.width {
        settings.width = width;
    }
    if let Some(height) = cli.height {
        settings.height = height;
    }
    if let Some(monsters) = cli.monsters {
        settings.monster_count = monsters;
    }
    if let Some(visibility) = cli.visibility {
        settings.visibility_range = visibility;
    }
    settings.validate()?;
    Ok(settings)
}

fn run_game(
    game: usize,
    settings: MazeSettings,
    seed: u64,
    max_turns: u64,
) -> Result<GameResultLine, MazeError> {
    let mut engine = MazeEngine::new(settings, seed)?;
    let mut pilot_rng = Rng::new(seed ^ 0x5eed_0f_a11);
    let mut last_move: Option<Direction> = None;
    let mut key_collected = false;
    let mut invalid_moves = 0u64;

    while !engine.state().is_terminal() && engine.turn() < max_turns {
        let dir = choose_direction(&engine, &mut pilot_rng, last_move);
        let report = engine.move_player(dir);
        match report.message {
            Some(GameMessage::InvalidMove) => invalid_moves += 1,
            Some(GameMessage::KeyFound) => key_collected = true,
            _ => {}
        }
        if report.moved {
            last_move = Some(dir);
        }
        engine.take_message();
    }

    let outcome = match engine.state() {
        GameState::Escaped => Outcome::Escaped,
        GameState::Dead => Outcome::Killed,
        GameState::Active => Outcome::Timeout,
    };
    let rooms_seen = engine
        .grid()
        .nodes()
        .iter()
        .filter(|node| node.is_visited())
        .count();

    Ok(GameResultLine {
        game,
        seed,
        width: settings.width,
        height: settings.height,
        monsters: settings.monster_count,
        visibility: settings.visibility_range,
        outcome,
        turns: engine.turn(),
        key_collected: key_collected || engine.has_key(),
        invalid_moves,
        rooms_seen,
    })
}

/// Heads for the key (then the exit) once it is in sight. Otherwise wanders,
/// avoiding visible monsters and not doubling back unless cornered.
fn choose_direction(engine: &MazeEngine, rng: &mut Rng, last_move: Option<Direction>) -> Direction {
    let here = engine.player();
    let open = engine.open_directions(here);
    let target = if engine.has_key() {
        engine.exit()
    } else {
        engine.key()
    };

    if engine.visible_rooms(here).contains(&target) {
        if let Some(dir) = pursuit_direction(here, target).filter(|dir| open.contains(dir)) {
            return dir;
        }
    }

    let threats = engine.visible_monsters();
    let safe: Vec<Direction> = open
        .iter()
        .copied()
        .filter(|dir| {
            let (dx, dy) = dir.delta();
            let next = Vec2::new(here.x + dx, here.y + dy);
            !threats.contains(&next)
        })
        .collect();
    let pool = if safe.is_empty() { open } else { safe };

    let forward: Vec<Direction> = pool
        .iter()
        .copied()
        .filter(|dir| Some(dir.opposite()) != last_move)
        .collect();
    let choices = if forward.is_empty() { pool } else { forward };
    rng.pick(&choices).copied().unwrap_or(Direction::North)
}

fn default_run_id(seed: u64, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    settings: MazeSettings,
    games: Vec<GameResultLine>,
    skipped_count: usize,
) -> RunSummary {
    let game_count = games.len();
    let total_turns: u64 = games.iter().map(|game| game.turns).sum();
    let average_turns = if game_count == 0 {
        0
    } else {
        total_turns / game_count as u64
    };
    let mut outcome_counts = BTreeMap::new();
    for game in &games {
        *outcome_counts
            .entry(outcome_key(game.outcome))
            .or_insert(0) += 1;
    }
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        settings,
        game_count,
        skipped_count,
        average_turns,
        outcome_counts,
        games,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    game: Option<usize>,
    seed: Option<u64>,
    turn: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        game,
        seed,
        turn,
        details,
    };
    match serde_json::to_string(&log_line) {
        Ok(line) => eprintln!("{line}"),
        Err(error) => log::error!("failed to serialize log line for {event}: {error}"),
    }
}

fn outcome_key(outcome: Outcome) -> String {
    match outcome {
        Outcome::Escaped => "escaped",
        Outcome::Killed => "killed",
        Outcome::Timeout => "timeout",
    }
    .to_string()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
