//! Platformer Replay System
//!
//! This crate provides replay artifact generation and verification.
//!
//! # Architecture
//!
//! The replay system consists of:
//! - `ReplayRecorder`: captures the level, physics tuning and every applied
//!   `StepInput` during a session
//! - `verify_replay`: re-simulates an artifact and checks it reproduces the
//!   recorded outcome
//! - `level_fingerprint`: identifies the collidable geometry a replay was
//!   recorded against

#![deny(unsafe_code)]

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use platformer_sim::{
    Block, PhysicsConfig, PlayerSpawn, Rect, STATE_DIGEST_ALGO_ID, StepInput, Tick, Vec2, World,
    canonicalize_f64,
};
use platformer_wire::{
    RectProto, ReplayArtifact, StepInputProto, TuningParameter, vec2_from_wire, vec2_to_wire,
};
use prost::Message;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Current artifact schema version.
pub const REPLAY_FORMAT_VERSION: u32 = 1;

// ============================================================================
// Level Fingerprint
// ============================================================================

/// Lowercase hex SHA-256 over the obstacle list in resolution order.
///
/// Each rect contributes x, y, w, h as canonicalized little-endian f64.
pub fn level_fingerprint<'a, I>(obstacles: I) -> String
where
    I: IntoIterator<Item = &'a Rect>,
{
    let mut hasher = Sha256::new();
    for rect in obstacles {
        for value in [rect.x, rect.y, rect.w, rect.h] {
            hasher.update(canonicalize_f64(value).to_le_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Replay Recorder
// ============================================================================

/// Records a session for replay artifact generation.
pub struct ReplayRecorder {
    tick_rate_hz: u32,
    config: PhysicsConfig,
    obstacles: Vec<Rect>,
    player_spawn: Vec2,
    player_size: Vec2,
    initial_tick: Tick,
    initial_digest: u64,
    inputs: Vec<(Tick, StepInput)>,
}

impl ReplayRecorder {
    /// Start recording from the world's current state.
    ///
    /// `player_spawn` is the center the player was spawned at; it MUST be the
    /// value the world was built with.
    pub fn new(world: &World, player_spawn: Vec2) -> Self {
        Self {
            tick_rate_hz: world.tick_rate_hz(),
            config: *world.config(),
            obstacles: world.obstacles().copied().collect(),
            player_spawn,
            player_size: world.player().size(),
            initial_tick: world.tick(),
            initial_digest: world.state_digest(),
            inputs: Vec::new(),
        }
    }

    /// Record the input applied at pre-step `tick`.
    pub fn record_input(&mut self, tick: Tick, input: StepInput) {
        self.inputs.push((tick, input));
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Finalize the replay artifact.
    pub fn finalize(
        self,
        final_digest: u64,
        checkpoint_tick: Tick,
        end_reason: &str,
    ) -> ReplayArtifact {
        let tuning_parameters = self
            .config
            .tuning_parameters()
            .into_iter()
            .map(|(key, value)| TuningParameter {
                key: key.to_string(),
                value,
            })
            .collect();

        ReplayArtifact {
            replay_format_version: REPLAY_FORMAT_VERSION,
            tick_rate_hz: self.tick_rate_hz,
            state_digest_algo_id: STATE_DIGEST_ALGO_ID.to_string(),
            tuning_parameters,
            level_fingerprint: level_fingerprint(&self.obstacles),
            obstacles: self.obstacles.into_iter().map(RectProto::from).collect(),
            player_spawn: vec2_to_wire(self.player_spawn),
            player_size: vec2_to_wire(self.player_size),
            initial_tick: self.initial_tick,
            initial_digest: self.initial_digest,
            inputs: self.inputs.into_iter().map(StepInputProto::from).collect(),
            final_digest,
            checkpoint_tick,
            end_reason: end_reason.to_string(),
        }
    }
}

// ============================================================================
// Replay Verification
// ============================================================================

/// Replay verification error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerifyError {
    #[error("Level fingerprint mismatch: expected {expected}, got {actual}")]
    LevelMismatch { expected: String, actual: String },

    #[error("Unsupported replay: {reason}")]
    Unsupported { reason: String },

    #[error("Initialization anchor mismatch: expected {expected:#x}, got {actual:#x}")]
    InitializationAnchorMismatch { expected: u64, actual: u64 },

    #[error("Input stream invalid: {reason}")]
    InputStreamInvalid { reason: String },

    #[error("Final digest mismatch: expected {expected:#x}, got {actual:#x}")]
    FinalDigestMismatch { expected: u64, actual: u64 },

    #[error("Checkpoint tick mismatch: expected {expected}, got {actual}")]
    CheckpointTickMismatch { expected: Tick, actual: Tick },

    #[error("Invalid replay format: {reason}")]
    InvalidFormat { reason: String },
}

impl VerifyError {
    fn format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
        }
    }
}

/// Options for replay verification.
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// Whether a recorded level fingerprint that does not match the
    /// recorded obstacles fails verification.
    /// - true: fail on mismatch
    /// - false: warn and re-simulate against the recorded obstacles
    pub strict_level_check: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            strict_level_check: true,
        }
    }
}

/// Verify a replay artifact produces the recorded outcome.
///
/// # Verification Steps
/// 1. Check format version and digest algorithm
/// 2. Verify level fingerprint (strict mode: fail; otherwise: warn)
/// 3. Validate the input stream: one input per tick in [initial, checkpoint)
/// 4. Rebuild physics config from tuning parameters and the level
/// 5. Verify the initial digest (initialization anchor)
/// 6. Replay ticks [initial_tick, checkpoint_tick)
/// 7. Assert world.tick() == checkpoint_tick
/// 8. Assert world.state_digest() == final_digest
pub fn verify_replay(
    artifact: &ReplayArtifact,
    options: &VerifyOptions,
) -> Result<(), VerifyError> {
    // Step 1: Schema
    if artifact.replay_format_version != REPLAY_FORMAT_VERSION {
        return Err(VerifyError::Unsupported {
            reason: format!("format version {}", artifact.replay_format_version),
        });
    }
    if artifact.state_digest_algo_id != STATE_DIGEST_ALGO_ID {
        return Err(VerifyError::Unsupported {
            reason: format!("digest algorithm {:?}", artifact.state_digest_algo_id),
        });
    }
    if artifact.tick_rate_hz == 0 {
        return Err(VerifyError::format("tick_rate_hz must be positive"));
    }

    let obstacles = artifact
        .obstacles
        .iter()
        .cloned()
        .map(Rect::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(VerifyError::format)?;

    // Step 2: Level fingerprint
    let actual = level_fingerprint(&obstacles);
    if actual != artifact.level_fingerprint {
        if options.strict_level_check {
            return Err(VerifyError::LevelMismatch {
                expected: artifact.level_fingerprint.clone(),
                actual,
            });
        }
        log::warn!(
            "level fingerprint mismatch (expected {}, got {actual}); continuing",
            artifact.level_fingerprint
        );
    }

    // Step 3: Input stream
    let inputs = validate_input_stream(artifact)?;

    // Step 4: Config and world
    let config = PhysicsConfig::from_tuning_parameters(
        artifact
            .tuning_parameters
            .iter()
            .map(|p| (p.key.as_str(), p.value)),
    )
    .map_err(VerifyError::format)?;
    if config.grounded_history_capacity == 0 {
        return Err(VerifyError::format(
            "grounded_history_capacity must be positive",
        ));
    }
    if artifact.initial_tick != 0 {
        return Err(VerifyError::Unsupported {
            reason: format!(
                "recording starts at tick {}, only fresh worlds can be rebuilt",
                artifact.initial_tick
            ),
        });
    }

    let spawn = vec2_from_wire(&artifact.player_spawn).map_err(VerifyError::format)?;
    let size = vec2_from_wire(&artifact.player_size).map_err(VerifyError::format)?;
    let mut world = World::new(artifact.tick_rate_hz, config, PlayerSpawn::new(spawn, size));
    for rect in obstacles {
        world.add_block(Block::solid(rect, 0));
    }

    // Step 5: Initialization anchor
    let initial_digest = world.state_digest();
    if initial_digest != artifact.initial_digest {
        return Err(VerifyError::InitializationAnchorMismatch {
            expected: artifact.initial_digest,
            actual: initial_digest,
        });
    }

    // Step 6: Replay ticks [initial_tick, checkpoint_tick)
    for tick in artifact.initial_tick..artifact.checkpoint_tick {
        let input = inputs.get(&tick).copied().unwrap_or_default();
        let _ = world.advance(tick, &input);
    }

    // Step 7: Verify checkpoint tick
    if world.tick() != artifact.checkpoint_tick {
        return Err(VerifyError::CheckpointTickMismatch {
            expected: artifact.checkpoint_tick,
            actual: world.tick(),
        });
    }

    // Step 8: Verify final digest
    let actual_digest = world.state_digest();
    if actual_digest != artifact.final_digest {
        return Err(VerifyError::FinalDigestMismatch {
            expected: artifact.final_digest,
            actual: actual_digest,
        });
    }

    Ok(())
}

/// Validate the input stream and index it by tick.
fn validate_input_stream(
    artifact: &ReplayArtifact,
) -> Result<HashMap<Tick, StepInput>, VerifyError> {
    let initial_tick = artifact.initial_tick;
    let checkpoint_tick = artifact.checkpoint_tick;

    if checkpoint_tick < initial_tick {
        return Err(VerifyError::InputStreamInvalid {
            reason: format!(
                "checkpoint tick {checkpoint_tick} precedes initial tick {initial_tick}"
            ),
        });
    }

    let mut by_tick = HashMap::with_capacity(artifact.inputs.len());
    for proto in &artifact.inputs {
        let (tick, input): (Tick, StepInput) =
            proto.clone().try_into().map_err(VerifyError::format)?;
        if tick < initial_tick || tick >= checkpoint_tick {
            return Err(VerifyError::InputStreamInvalid {
                reason: format!(
                    "Input at tick {tick} is outside valid range [{initial_tick}, {checkpoint_tick})"
                ),
            });
        }
        if by_tick.insert(tick, input).is_some() {
            return Err(VerifyError::InputStreamInvalid {
                reason: format!("Duplicate input at tick {tick}"),
            });
        }
    }

    if let Some(tick) = (initial_tick..checkpoint_tick).find(|t| !by_tick.contains_key(t)) {
        return Err(VerifyError::InputStreamInvalid {
            reason: format!("Missing input at tick {tick}"),
        });
    }

    Ok(by_tick)
}

// ============================================================================
// Replay I/O
// ============================================================================

/// Write a replay artifact to a file. Refuses to overwrite.
pub fn write_replay(artifact: &ReplayArtifact, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    if path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Replay artifact already exists at {}", path.display()),
        ));
    }

    let encoded = artifact.encode_to_vec();
    let mut file = fs::File::create(path)?;
    file.write_all(&encoded)?;

    log::info!(
        "wrote replay {} ({} inputs, {} bytes)",
        path.display(),
        artifact.inputs.len(),
        encoded.len()
    );
    Ok(())
}

/// Read a replay artifact from a file.
pub fn read_replay(path: &Path) -> io::Result<ReplayArtifact> {
    let data = fs::read(path)?;
    ReplayArtifact::decode(data.as_slice()).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to decode replay: {e}"),
        )
    })
}

// ============================================================================
// Tests
// ============================================================================
