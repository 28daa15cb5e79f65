//! Platformer Game Edge
//!
//! The edge wraps the Simulation Core and owns everything the core must not
//! do:
//! - Polling and validating input events
//! - Reducing key state to one `StepInput` per tick
//! - Pacing the fixed-timestep frame loop against a clock
//! - Dialogue and story state (`GameState`)
//! - Replay recording
//!
//! # Architecture
//!
//! The core is invoked only with `StepInput` and produces `Snapshot`s. Time,
//! input and presentation reach the loop through the [`Clock`],
//! [`InputSource`] and [`FrameSink`] traits.

#![deny(unsafe_code)]

pub mod config;
pub mod input;
pub mod logging;
pub mod state;
pub mod validation;

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use config::{ConfigError, GameConfig};
use input::InputState;
use log::{debug, info, warn};
use logging::LogInitError;
use platformer_replay::{ReplayRecorder, VerifyError};
use platformer_sim::{
    AnimationSet, Block, Npc, PlayerSpawn, Snapshot, StepInput, Tick, Vec2, World,
};
use platformer_wire::ReplayArtifact;
use state::{DialogueOutcome, GameEvent, GameState, Screen};
use thiserror::Error;
use validation::{InputEvent, ValidationResult, validate_event};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LogInitError),

    #[error("replay i/o failed: {0}")]
    Replay(#[from] io::Error),

    #[error("replay does not reproduce: {0}")]
    Verify(#[from] VerifyError),
}

// ============================================================================
// Session End Reason
// ============================================================================

/// Reason the frame loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// Global quit requested by the input source.
    Quit,
    /// Configured tick limit reached.
    MaxTicks,
    /// A dialogue outcome asked for another screen.
    Transition(Screen),
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quit => "quit",
            Self::MaxTicks => "max_ticks",
            Self::Transition(_) => "transition",
        }
    }
}

// ============================================================================
// Loop Seams
// ============================================================================

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&mut self) -> Duration;
    fn sleep(&mut self, duration: Duration);
}

/// Everything the platform layer delivered since the last poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputPoll {
    pub events: Vec<InputEvent>,
    pub quit: bool,
}

pub trait InputSource {
    /// Drain pending events. `now_ms` is the current frame time.
    fn poll(&mut self, now_ms: u64) -> InputPoll;
}

pub trait FrameSink {
    /// Present one tick. Returning outcomes ends the open dialogue with them.
    fn present(&mut self, snapshot: &Snapshot, events: &[GameEvent])
    -> Option<Vec<DialogueOutcome>>;
}

/// Wall clock backed by `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&mut self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Replays a fixed list of events, each delivered once the frame time
/// reaches its timestamp.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    events: VecDeque<InputEvent>,
    quit_at_ms: Option<u64>,
}

impl ScriptedInput {
    /// `events` must be sorted by timestamp.
    pub fn new(events: Vec<InputEvent>) -> Self {
        Self {
            events: events.into(),
            quit_at_ms: None,
        }
    }

    pub fn quit_at(mut self, ms: u64) -> Self {
        self.quit_at_ms = Some(ms);
        self
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, now_ms: u64) -> InputPoll {
        let mut events = Vec::new();
        while let Some(event) = self.events.front() {
            if event.timestamp_ms > now_ms {
                break;
            }
            events.extend(self.events.pop_front());
        }
        InputPoll {
            events,
            quit: self.quit_at_ms.is_some_and(|ms| now_ms >= ms),
        }
    }
}

// ============================================================================
// Level
// ============================================================================

/// A loaded level, as produced by the level collaborator.
#[derive(Debug, Clone)]
pub struct Level {
    pub name: String,
    /// Player center at spawn.
    pub player_spawn: Vec2,
    pub player_size: Vec2,
    pub animations: Arc<AnimationSet>,
    /// In load order; collidable blocks resolve in this order.
    pub blocks: Vec<Block>,
    pub npcs: Vec<Npc>,
}

// ============================================================================
// Game
// ============================================================================

/// One play session on one level.
pub struct Game {
    config: GameConfig,
    level_name: String,
    world: World,
    input: InputState,
    state: GameState,
    recorder: ReplayRecorder,
    /// Events produced after the last present, delivered with the next one.
    pending_events: Vec<GameEvent>,
    dropped_inputs: u64,
    overruns: u64,
}

impl Game {
    /// Build the world for `level`.
    ///
    /// # Panics
    /// If `config` does not pass [`GameConfig::validate`].
    pub fn new(config: GameConfig, level: Level) -> Self {
        let mut world = World::new(
            config.tick_rate_hz,
            config.physics_config(),
            PlayerSpawn {
                position: level.player_spawn,
                size: level.player_size,
                animations: level.animations,
            },
        );
        for block in level.blocks {
            world.add_block(block);
        }
        for npc in level.npcs {
            world.add_npc(npc);
        }

        let recorder = ReplayRecorder::new(&world, level.player_spawn);
        Self {
            input: InputState::new(config.input.hold_repeat_ms),
            config,
            level_name: level.name,
            world,
            state: GameState::new(),
            recorder,
            pending_events: Vec::new(),
            dropped_inputs: 0,
            overruns: 0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Get current tick.
    pub fn current_tick(&self) -> Tick {
        self.world.tick()
    }

    pub fn dropped_inputs(&self) -> u64 {
        self.dropped_inputs
    }

    /// Frames that fell more than one interval behind their deadline.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Validate an input event and apply it to the key state.
    pub fn receive_input(&mut self, event: &InputEvent, now_ms: u64) -> ValidationResult {
        let result = validate_event(event, now_ms, &mut self.input);
        if !result.is_accepted() {
            self.dropped_inputs += 1;
            debug!("dropped input {event:?}: {result:?}");
        }
        result
    }

    /// Process a single tick at frame time `now_ms`.
    pub fn step(&mut self, now_ms: u64) -> (Snapshot, Vec<GameEvent>) {
        let mut events = std::mem::take(&mut self.pending_events);

        if self.input.take_action() {
            match self.state.dialogue().map(|d| d.npc) {
                Some(npc) => events.push(GameEvent::DialogueAdvance { npc }),
                None => {
                    let in_reach = self
                        .world
                        .npc_in_reach(self.config.dialogue.interact_radius)
                        .map(|(id, npc)| (id, npc.dialogue_key.clone()));
                    if let Some((id, key)) = in_reach {
                        events.extend(self.state.start_dialogue(id, key));
                    }
                }
            }
        }

        // Jump is drained even while suppressed so a release during dialogue
        // does not fire afterwards.
        let jump = self.input.take_jump(now_ms);
        let step_input = StepInput {
            now_ms,
            movement: self.input.movement(),
            jump,
            suppressed: self.state.in_dialogue(),
        };

        let tick = self.world.tick();
        self.recorder.record_input(tick, step_input);
        let snapshot = self.world.advance(tick, &step_input);

        (snapshot, events)
    }

    /// Close the open dialogue with the collaborator's outcomes.
    pub fn end_dialogue(&mut self, outcomes: Vec<DialogueOutcome>) {
        self.pending_events.extend(self.state.end_dialogue(outcomes));
    }

    /// Check if the session should end after the current tick.
    pub fn should_end(&mut self) -> Option<EndReason> {
        if let Some(screen) = self.state.take_transition() {
            return Some(EndReason::Transition(screen));
        }
        match self.config.max_ticks {
            Some(max) if self.world.tick() >= max => Some(EndReason::MaxTicks),
            _ => None,
        }
    }

    /// Run the paced frame loop until quit, transition or the tick limit.
    pub fn run(
        &mut self,
        clock: &mut impl Clock,
        input: &mut impl InputSource,
        sink: &mut impl FrameSink,
    ) -> EndReason {
        let interval = Duration::from_nanos(1_000_000_000 / u64::from(self.config.tick_rate_hz));
        info!(
            "run level {:?} at {} Hz from tick {}",
            self.level_name,
            self.config.tick_rate_hz,
            self.world.tick()
        );

        let mut deadline = clock.now();
        let reason = loop {
            let now_ms = as_millis(clock.now());

            let poll = input.poll(now_ms);
            for event in &poll.events {
                self.receive_input(event, now_ms);
            }

            let (snapshot, events) = self.step(now_ms);
            if let Some(outcomes) = sink.present(&snapshot, &events) {
                self.end_dialogue(outcomes);
            }

            if poll.quit {
                break EndReason::Quit;
            }
            if let Some(reason) = self.should_end() {
                break reason;
            }

            deadline += interval;
            let now = clock.now();
            if now > deadline + interval {
                warn!(
                    "tick {} overran by {:?}, re-basing frame deadline",
                    self.world.tick(),
                    now - deadline
                );
                self.overruns += 1;
                deadline = now;
            } else if now < deadline {
                clock.sleep(deadline - now);
            }
        };

        info!(
            "run ended at tick {}: {reason:?} ({} inputs dropped, {} overruns)",
            self.world.tick(),
            self.dropped_inputs,
            self.overruns
        );
        reason
    }

    /// Finalize the session and produce a replay artifact.
    pub fn finalize(self, end_reason: &EndReason) -> ReplayArtifact {
        let final_digest = self.world.state_digest();
        let checkpoint_tick = self.world.tick();
        info!(
            "level {}: {} inputs recorded, final digest {final_digest:016x}",
            self.level_name,
            self.recorder.input_count()
        );
        self.recorder
            .finalize(final_digest, checkpoint_tick, end_reason.as_str())
    }
}

fn as_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use platformer_replay::{VerifyOptions, verify_replay};
    use platformer_sim::{PlayerState, Rect};

    use super::*;
    use crate::validation::{Key, KeyEdge};

    /// Clock that only moves when slept on, plus `work` per reading.
    struct FakeClock {
        now: Duration,
        work: Duration,
        sleeps: Vec<Duration>,
    }

    impl FakeClock {
        fn new(work: Duration) -> Self {
            Self {
                now: Duration::ZERO,
                work,
                sleeps: Vec::new(),
            }
        }
    }

    impl Clock for FakeClock {
        fn now(&mut self) -> Duration {
            self.now += self.work;
            self.now
        }

        fn sleep(&mut self, duration: Duration) {
            self.sleeps.push(duration);
            self.now += duration;
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        frames: Vec<Snapshot>,
        events: Vec<GameEvent>,
        reply_on_advance: Option<Vec<DialogueOutcome>>,
    }

    impl FrameSink for RecordingSink {
        fn present(
            &mut self,
            snapshot: &Snapshot,
            events: &[GameEvent],
        ) -> Option<Vec<DialogueOutcome>> {
            self.frames.push(snapshot.clone());
            self.events.extend_from_slice(events);
            if events
                .iter()
                .any(|e| matches!(e, GameEvent::DialogueAdvance { .. }))
            {
                self.reply_on_advance.take()
            } else {
                None
            }
        }
    }

    fn ev(key: Key, edge: KeyEdge, timestamp_ms: u64) -> InputEvent {
        InputEvent {
            key,
            edge,
            timestamp_ms,
        }
    }

    fn test_level() -> Level {
        Level {
            name: "test".to_string(),
            player_spawn: Vec2::ZERO,
            player_size: Vec2::new(32.0, 32.0),
            animations: Arc::new(AnimationSet::default()),
            blocks: vec![Block::solid(Rect::new(-500.0, 16.0, 1000.0, 32.0), 1)],
            npcs: vec![Npc::new(
                Vec2::new(24.0, 0.0),
                Vec2::new(16.0, 32.0),
                7,
                "elder",
            )],
        }
    }

    fn config_with_max(max_ticks: u64) -> GameConfig {
        GameConfig {
            max_ticks: Some(max_ticks),
            ..GameConfig::default()
        }
    }

    #[test]
    fn test_run_stops_at_max_ticks_and_replay_verifies() {
        let mut game = Game::new(config_with_max(30), test_level());
        let mut clock = FakeClock::new(Duration::ZERO);
        let mut input = ScriptedInput::new(vec![
            ev(Key::Right, KeyEdge::Down, 0),
            ev(Key::Right, KeyEdge::Up, 200),
            ev(Key::Jump, KeyEdge::Down, 250),
            ev(Key::Jump, KeyEdge::Up, 300),
        ]);
        let mut sink = RecordingSink::default();

        let reason = game.run(&mut clock, &mut input, &mut sink);

        assert_eq!(reason, EndReason::MaxTicks);
        assert_eq!(game.current_tick(), 30);
        assert_eq!(sink.frames.len(), 30);
        assert_eq!(sink.frames.last().unwrap().tick, 30);

        let artifact = game.finalize(&reason);
        assert_eq!(artifact.inputs.len(), 30);
        assert_eq!(artifact.end_reason, "max_ticks");
        assert_eq!(verify_replay(&artifact, &VerifyOptions::default()), Ok(()));
    }

    #[test]
    fn test_loop_sleeps_one_interval_per_frame() {
        let mut game = Game::new(config_with_max(5), test_level());
        let mut clock = FakeClock::new(Duration::ZERO);
        let mut sink = RecordingSink::default();

        game.run(&mut clock, &mut ScriptedInput::default(), &mut sink);

        let interval = Duration::from_nanos(1_000_000_000 / 60);
        assert_eq!(clock.sleeps, vec![interval; 4]);
        assert_eq!(game.overruns(), 0);
    }

    #[test]
    fn test_overrun_rebases_deadline() {
        let mut game = Game::new(config_with_max(10), test_level());
        // Two clock reads per frame at 25 ms each: every frame overruns.
        let mut clock = FakeClock::new(Duration::from_millis(25));
        let mut sink = RecordingSink::default();

        game.run(&mut clock, &mut ScriptedInput::default(), &mut sink);

        assert_eq!(game.current_tick(), 10);
        assert!(clock.sleeps.is_empty());
        assert_eq!(game.overruns(), 9);
    }

    #[test]
    fn test_quit_stops_after_current_tick() {
        let mut game = Game::new(GameConfig::default(), test_level());
        let mut clock = FakeClock::new(Duration::ZERO);
        let mut input = ScriptedInput::default().quit_at(100);
        let mut sink = RecordingSink::default();

        let reason = game.run(&mut clock, &mut input, &mut sink);

        assert_eq!(reason, EndReason::Quit);
        // Frame 6 reads 99 ms; frame 7 (116 ms) sees the quit and still
        // advances.
        assert_eq!(game.current_tick(), 8);
    }

    #[test]
    fn test_tap_jump_from_key_events() {
        let mut game = Game::new(config_with_max(8), test_level());
        let mut clock = FakeClock::new(Duration::ZERO);
        let mut input = ScriptedInput::new(vec![
            ev(Key::Jump, KeyEdge::Down, 50),
            ev(Key::Jump, KeyEdge::Up, 80),
        ]);
        let mut sink = RecordingSink::default();

        game.run(&mut clock, &mut input, &mut sink);

        // Frame 5 (83 ms) sees the release: minimum strength 3, then gravity.
        let frame = &sink.frames[5];
        assert_eq!(frame.player_state, PlayerState::Jumping);
        assert_eq!(frame.player().unwrap().velocity.y, -3.0 + 0.2);
        assert_eq!(sink.frames[4].player_state, PlayerState::Standing);
    }

    #[test]
    fn test_dialogue_suppresses_input_and_applies_outcomes() {
        let mut game = Game::new(GameConfig::default(), test_level());
        let mut clock = FakeClock::new(Duration::ZERO);
        let mut input = ScriptedInput::new(vec![
            ev(Key::Action, KeyEdge::Down, 100),
            ev(Key::Action, KeyEdge::Up, 120),
            ev(Key::Right, KeyEdge::Down, 150),
            ev(Key::Action, KeyEdge::Down, 300),
        ]);
        let mut sink = RecordingSink {
            reply_on_advance: Some(vec![
                DialogueOutcome::SetFlag("met_elder".to_string()),
                DialogueOutcome::Transition(Screen::Ending("credits".to_string())),
            ]),
            ..Default::default()
        };

        let reason = game.run(&mut clock, &mut input, &mut sink);

        assert_eq!(
            reason,
            EndReason::Transition(Screen::Ending("credits".to_string()))
        );
        assert!(game.state().has_flag("met_elder"));
        assert!(!game.state().in_dialogue());
        assert_eq!(
            sink.events,
            vec![
                GameEvent::DialogueStarted {
                    npc: 3,
                    dialogue_key: "elder".to_string()
                },
                GameEvent::DialogueAdvance { npc: 3 },
            ]
        );
        // Right was held only while the dialogue owned input.
        assert_eq!(game.world().player().position().x, 0.0);

        let artifact = game.finalize(&reason);
        assert!(artifact.inputs.iter().any(|i| i.suppressed));
        assert_eq!(verify_replay(&artifact, &VerifyOptions::default()), Ok(()));
    }

    #[test]
    fn test_jump_released_during_dialogue_never_fires() {
        let mut game = Game::new(GameConfig::default(), test_level());

        game.receive_input(&ev(Key::Action, KeyEdge::Down, 0), 0);
        let (_, events) = game.step(0);
        assert!(matches!(events.as_slice(), [GameEvent::DialogueStarted { .. }]));
        assert!(game.state().in_dialogue());

        game.receive_input(&ev(Key::Jump, KeyEdge::Down, 10), 16);
        let (snapshot, _) = game.step(16);
        assert_ne!(snapshot.player_state, PlayerState::Jumping);
        game.receive_input(&ev(Key::Jump, KeyEdge::Up, 30), 33);
        let (snapshot, _) = game.step(33);
        assert_ne!(snapshot.player_state, PlayerState::Jumping);
        assert_eq!(snapshot.player().unwrap().velocity.y, 0.0);

        game.end_dialogue(vec![DialogueOutcome::SetFlag("talked".to_string())]);
        assert!(!game.state().in_dialogue());
        assert!(game.should_end().is_none());

        for i in 3..12 {
            let (snapshot, _) = game.step(i * 16);
            assert_ne!(snapshot.player_state, PlayerState::Jumping, "tick {i}");
            assert_eq!(snapshot.player().unwrap().velocity.y, 0.0, "tick {i}");
        }

        // A fresh tap after the dialogue still jumps.
        game.receive_input(&ev(Key::Jump, KeyEdge::Down, 200), 200);
        game.receive_input(&ev(Key::Jump, KeyEdge::Up, 230), 230);
        let (snapshot, _) = game.step(230);
        assert_eq!(snapshot.player_state, PlayerState::Jumping);
        assert_eq!(snapshot.player().unwrap().velocity.y, -3.0 + 0.2);
    }

    #[test]
    fn test_action_out_of_reach_starts_nothing() {
        let mut level = test_level();
        level.npcs[0].position = Vec2::new(400.0, 0.0);
        let mut game = Game::new(GameConfig::default(), level);

        game.receive_input(&ev(Key::Action, KeyEdge::Down, 0), 0);
        let (_, events) = game.step(0);

        assert!(events.is_empty());
        assert!(!game.state().in_dialogue());
    }

    #[test]
    fn test_invalid_events_counted() {
        let mut game = Game::new(GameConfig::default(), test_level());

        assert!(game.receive_input(&ev(Key::Left, KeyEdge::Down, 10), 10).is_accepted());
        assert!(!game.receive_input(&ev(Key::Left, KeyEdge::Down, 11), 11).is_accepted());
        assert!(!game.receive_input(&ev(Key::Right, KeyEdge::Down, 5), 11).is_accepted());
        assert!(!game.receive_input(&ev(Key::Right, KeyEdge::Down, 50), 11).is_accepted());

        assert_eq!(game.dropped_inputs(), 3);
    }
}
