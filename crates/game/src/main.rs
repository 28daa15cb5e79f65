//! Headless demo: runs a built-in level with scripted input, logs the
//! session and optionally writes and re-verifies the replay.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::info;
use platformer_game::config::GameConfig;
use platformer_game::logging::init_log;
use platformer_game::state::{DialogueOutcome, GameEvent, Screen};
use platformer_game::validation::{InputEvent, Key, KeyEdge};
use platformer_game::{FrameSink, Game, GameError, Level, ScriptedInput, SystemClock};
use platformer_replay::{VerifyOptions, read_replay, verify_replay, write_replay};
use platformer_sim::{Animation, AnimationSet, Block, Frame, Npc, Rect, Snapshot, Vec2};

/// Ticks to run when neither the config nor the command line sets a limit.
const DEFAULT_DEMO_TICKS: u64 = 600;

const TILE: f64 = 32.0;

#[derive(Parser, Debug)]
#[command(name = "platformer", about = "Run the platformer core headless")]
struct Cli {
    /// TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many ticks.
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Write the session replay here and verify it.
    #[arg(short, long)]
    replay_out: Option<PathBuf>,
}

/// Logs a line per second of game time and closes every dialogue on its
/// first advance.
struct LogSink {
    tick_rate_hz: u64,
}

impl FrameSink for LogSink {
    fn present(
        &mut self,
        snapshot: &Snapshot,
        events: &[GameEvent],
    ) -> Option<Vec<DialogueOutcome>> {
        if snapshot.tick % self.tick_rate_hz == 0
            && let Some(player) = snapshot.player()
        {
            info!(
                "tick {} player at ({:.1}, {:.1}) {:?} camera ({:.1}, {:.1})",
                snapshot.tick,
                player.position.x,
                player.position.y,
                snapshot.player_state,
                snapshot.camera.x,
                snapshot.camera.y
            );
        }

        let mut reply = None;
        for event in events {
            info!("tick {}: {event:?}", snapshot.tick);
            if let GameEvent::DialogueAdvance { .. } = event {
                reply = Some(vec![
                    DialogueOutcome::SetFlag("met_guide".to_string()),
                    DialogueOutcome::Transition(Screen::Ending("demo".to_string())),
                ]);
            }
        }
        reply
    }
}

fn demo_level() -> Level {
    let walk = Arc::new(Animation::new(
        vec![
            Frame {
                tile_idx: 1,
                delay_ms: 120,
            },
            Frame {
                tile_idx: 2,
                delay_ms: 120,
            },
        ],
        true,
    ));
    let animations = Arc::new(AnimationSet {
        standing: Arc::new(Animation::still(0)),
        walking: walk,
        jumping: Arc::new(Animation::still(3)),
    });

    let mut blocks = Vec::new();
    // Ground row from x = -320 to 960.
    for i in -10..30 {
        blocks.push(Block::solid(
            Rect::new(f64::from(i) * TILE, 64.0, TILE, TILE),
            10,
        ));
    }
    // A two-tile step to jump onto.
    for i in 8..10 {
        blocks.push(Block::solid(
            Rect::new(f64::from(i) * TILE, 32.0, TILE, TILE),
            11,
        ));
    }
    // Background.
    blocks.push(Block::scenery(Rect::new(0.0, 0.0, TILE, TILE), 20));

    let guide = Npc::new(Vec2::new(480.0, 48.0), Vec2::new(TILE, TILE), 30, "guide")
        .with_animation(Arc::new(Animation::new(
            vec![
                Frame {
                    tile_idx: 30,
                    delay_ms: 400,
                },
                Frame {
                    tile_idx: 31,
                    delay_ms: 400,
                },
            ],
            true,
        )));

    Level {
        name: "demo".to_string(),
        player_spawn: Vec2::new(0.0, 48.0),
        player_size: Vec2::new(TILE, TILE),
        animations,
        blocks,
        npcs: vec![guide],
    }
}

fn demo_script() -> ScriptedInput {
    let ev = |key, edge, timestamp_ms| InputEvent {
        key,
        edge,
        timestamp_ms,
    };
    ScriptedInput::new(vec![
        ev(Key::Right, KeyEdge::Down, 500),
        ev(Key::Jump, KeyEdge::Down, 1150),
        ev(Key::Jump, KeyEdge::Up, 1250),
        ev(Key::Right, KeyEdge::Up, 3000),
        ev(Key::Action, KeyEdge::Down, 3400),
        ev(Key::Action, KeyEdge::Up, 3500),
        ev(Key::Action, KeyEdge::Down, 4500),
        ev(Key::Action, KeyEdge::Up, 4600),
    ])
}

fn main() -> Result<(), GameError> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(ticks) = cli.ticks {
        config.max_ticks = Some(ticks);
    }
    config.max_ticks.get_or_insert(DEFAULT_DEMO_TICKS);

    init_log(config.log_level()?, &config.log.file)?;
    info!("platformer demo start, config {:?}", cli.config);

    let mut sink = LogSink {
        tick_rate_hz: u64::from(config.tick_rate_hz),
    };
    let mut game = Game::new(config, demo_level());
    let reason = game.run(&mut SystemClock::new(), &mut demo_script(), &mut sink);

    println!(
        "ended at tick {} ({}), flags: {:?}",
        game.current_tick(),
        reason.as_str(),
        game.state().flags().collect::<Vec<_>>()
    );

    let artifact = game.finalize(&reason);
    if let Some(path) = &cli.replay_out {
        write_replay(&artifact, path)?;
        let stored = read_replay(path)?;
        verify_replay(&stored, &VerifyOptions::default())?;
        println!("replay {} verified", path.display());
    }

    Ok(())
}
