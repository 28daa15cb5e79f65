//! Frame-based sprite animation.
//!
//! Animation definitions are shared read-only assets (`Arc<Animation>`)
//! built once by the asset collaborator; each entity owns only an
//! [`AnimationPlayer`] cursor into one of them.

use std::sync::Arc;

use crate::player::PlayerState;

/// One frame: a tile index into the sprite sheet and how long it is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub tile_idx: u32,
    pub delay_ms: u32,
}

/// An ordered list of frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    frames: Vec<Frame>,
    looping: bool,
    cycle_ms: u64,
}

impl Animation {
    /// # Panics
    /// If `frames` is empty.
    pub fn new(frames: Vec<Frame>, looping: bool) -> Self {
        assert!(!frames.is_empty(), "animation needs at least one frame");
        let cycle_ms = frames.iter().map(|f| u64::from(f.delay_ms)).sum();
        Self {
            frames,
            looping,
            cycle_ms,
        }
    }

    /// A single frame shown forever.
    pub fn still(tile_idx: u32) -> Self {
        Self::new(
            vec![Frame {
                tile_idx,
                delay_ms: u32::MAX,
            }],
            false,
        )
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Sum of all frame delays.
    pub fn cycle_ms(&self) -> u64 {
        self.cycle_ms
    }
}

/// Playback cursor for a shared animation.
#[derive(Debug, Clone)]
pub struct AnimationPlayer {
    animation: Arc<Animation>,
    frame_idx: usize,
    acc_ms: f64,
}

impl AnimationPlayer {
    pub fn new(animation: Arc<Animation>) -> Self {
        Self {
            animation,
            frame_idx: 0,
            acc_ms: 0.0,
        }
    }

    /// Switch to another animation, restarting from its first frame.
    pub fn play(&mut self, animation: Arc<Animation>) {
        self.animation = animation;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.frame_idx = 0;
        self.acc_ms = 0.0;
    }

    /// Advance by `elapsed_ms`. Frames advance while the accumulated time
    /// exceeds the current frame's delay. Non-looping animations hold their
    /// last frame. A looping animation whose delays are all zero stays on
    /// its current frame.
    pub fn advance(&mut self, elapsed_ms: f64) {
        if self.animation.is_looping() && self.animation.cycle_ms() == 0 {
            self.acc_ms = 0.0;
            return;
        }
        self.acc_ms += elapsed_ms;
        let frames = self.animation.frames();
        let last = frames.len() - 1;
        loop {
            let delay = f64::from(frames[self.frame_idx].delay_ms);
            if self.acc_ms <= delay {
                break;
            }
            self.acc_ms -= delay;
            if self.animation.is_looping() {
                self.frame_idx = (self.frame_idx + 1) % frames.len();
            } else if self.frame_idx == last {
                // Holding the last frame; nothing left to consume.
                self.acc_ms = 0.0;
                break;
            } else {
                self.frame_idx = last;
            }
        }
    }

    pub fn frame_idx(&self) -> usize {
        self.frame_idx
    }

    pub fn current_tile(&self) -> u32 {
        self.animation.frames()[self.frame_idx].tile_idx
    }
}

/// Player animations keyed by state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationSet {
    pub standing: Arc<Animation>,
    pub walking: Arc<Animation>,
    pub jumping: Arc<Animation>,
}

impl AnimationSet {
    pub fn for_state(&self, state: PlayerState) -> Arc<Animation> {
        match state {
            PlayerState::Standing => Arc::clone(&self.standing),
            PlayerState::Walking => Arc::clone(&self.walking),
            PlayerState::Jumping => Arc::clone(&self.jumping),
        }
    }
}

impl Default for AnimationSet {
    fn default() -> Self {
        let still = Arc::new(Animation::still(0));
        Self {
            standing: Arc::clone(&still),
            walking: Arc::clone(&still),
            jumping: still,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_cycle(looping: bool) -> Arc<Animation> {
        Arc::new(Animation::new(
            vec![
                Frame {
                    tile_idx: 4,
                    delay_ms: 100,
                },
                Frame {
                    tile_idx: 5,
                    delay_ms: 100,
                },
                Frame {
                    tile_idx: 6,
                    delay_ms: 50,
                },
            ],
            looping,
        ))
    }

    #[test]
    fn test_looping_animation_wraps() {
        let mut player = AnimationPlayer::new(walk_cycle(true));
        assert_eq!(player.current_tile(), 4);

        player.advance(100.0);
        assert_eq!(player.current_tile(), 4, "delay must be exceeded, not met");

        player.advance(1.0);
        assert_eq!(player.current_tile(), 5);

        player.advance(140.0);
        assert_eq!(player.current_tile(), 6);

        player.advance(51.0);
        assert_eq!(player.current_tile(), 4);
    }

    #[test]
    fn test_non_looping_holds_last_frame() {
        let mut player = AnimationPlayer::new(walk_cycle(false));
        player.advance(101.0);
        assert_eq!(player.current_tile(), 6);

        player.advance(10_000.0);
        assert_eq!(player.current_tile(), 6);
    }

    #[test]
    fn test_reset_on_play() {
        let mut player = AnimationPlayer::new(walk_cycle(true));
        player.advance(150.0);
        assert_eq!(player.frame_idx(), 1);

        player.play(Arc::new(Animation::still(9)));
        assert_eq!(player.frame_idx(), 0);
        assert_eq!(player.current_tile(), 9);
    }

    #[test]
    fn test_still_never_advances() {
        let mut player = AnimationPlayer::new(Arc::new(Animation::still(2)));
        for _ in 0..1000 {
            player.advance(1000.0 / 60.0);
        }
        assert_eq!(player.current_tile(), 2);
    }

    #[test]
    fn test_zero_delay_loop_holds_frame() {
        let animation = Arc::new(Animation::new(
            vec![
                Frame {
                    tile_idx: 1,
                    delay_ms: 0,
                },
                Frame {
                    tile_idx: 2,
                    delay_ms: 0,
                },
            ],
            true,
        ));
        assert_eq!(animation.cycle_ms(), 0);

        let mut player = AnimationPlayer::new(animation);
        for _ in 0..10 {
            player.advance(1000.0 / 60.0);
        }
        assert_eq!(player.current_tile(), 1);
    }

    #[test]
    fn test_zero_delay_frame_inside_loop_is_skipped() {
        let animation = Arc::new(Animation::new(
            vec![
                Frame {
                    tile_idx: 1,
                    delay_ms: 10,
                },
                Frame {
                    tile_idx: 2,
                    delay_ms: 0,
                },
                Frame {
                    tile_idx: 3,
                    delay_ms: 10,
                },
            ],
            true,
        ));
        let mut player = AnimationPlayer::new(animation);
        player.advance(15.0);
        assert_eq!(player.current_tile(), 3);
    }

    #[test]
    fn test_set_shares_assets() {
        let set = AnimationSet::default();
        assert!(Arc::ptr_eq(&set.standing, &set.for_state(PlayerState::Jumping)));
    }
}
