//! Game-state component: active dialogue, story flags and screen
//! transitions.
//!
//! NPC dialogue does not reach into the game directly; it reports a list
//! of [`DialogueOutcome`]s when it ends and this component applies them.

use std::collections::BTreeSet;

use platformer_sim::EntityId;

/// Screen the game moves to after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Load another level by name.
    Level(String),
    /// Show an ending.
    Ending(String),
}

/// Effect of a finished dialogue on the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueOutcome {
    SetFlag(String),
    ClearFlag(String),
    Transition(Screen),
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    DialogueStarted { npc: EntityId, dialogue_key: String },
    /// Action pressed while a dialogue is open.
    DialogueAdvance { npc: EntityId },
    DialogueEnded { npc: EntityId },
}

/// The dialogue currently owning input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialogue {
    pub npc: EntityId,
    pub dialogue_key: String,
}

#[derive(Debug, Clone, Default)]
pub struct GameState {
    dialogue: Option<Dialogue>,
    flags: BTreeSet<String>,
    pending_transition: Option<Screen>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dialogue(&self) -> Option<&Dialogue> {
        self.dialogue.as_ref()
    }

    pub fn in_dialogue(&self) -> bool {
        self.dialogue.is_some()
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }

    pub fn pending_transition(&self) -> Option<&Screen> {
        self.pending_transition.as_ref()
    }

    /// Open a dialogue. Replaces nothing: an already open dialogue is kept.
    pub fn start_dialogue(&mut self, npc: EntityId, dialogue_key: String) -> Option<GameEvent> {
        if self.dialogue.is_some() {
            return None;
        }
        log::debug!("dialogue {dialogue_key:?} started with npc {npc}");
        self.dialogue = Some(Dialogue {
            npc,
            dialogue_key: dialogue_key.clone(),
        });
        Some(GameEvent::DialogueStarted { npc, dialogue_key })
    }

    /// Close the open dialogue and apply its outcomes in order. A later
    /// transition replaces an earlier one.
    pub fn end_dialogue(&mut self, outcomes: Vec<DialogueOutcome>) -> Option<GameEvent> {
        let dialogue = self.dialogue.take()?;
        for outcome in outcomes {
            match outcome {
                DialogueOutcome::SetFlag(flag) => {
                    self.flags.insert(flag);
                }
                DialogueOutcome::ClearFlag(flag) => {
                    self.flags.remove(&flag);
                }
                DialogueOutcome::Transition(screen) => {
                    self.pending_transition = Some(screen);
                }
            }
        }
        log::debug!(
            "dialogue {:?} ended, flags now {:?}",
            dialogue.dialogue_key,
            self.flags
        );
        Some(GameEvent::DialogueEnded { npc: dialogue.npc })
    }

    pub fn take_transition(&mut self) -> Option<Screen> {
        self.pending_transition.take()
    }
}
