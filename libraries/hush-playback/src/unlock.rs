//! One-shot audio unlock gate
//!
//! Some platforms refuse to start audio until the user has interacted with
//! the app. The gate collects hooks and runs them on the first pointer or
//! touch interaction, then forgets them.

use std::fmt;

/// Kind of user interaction that can unlock audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Pointer,
    Touch,
}

type Hook = Box<dyn FnOnce(Interaction) + Send>;

#[derive(Default)]
pub struct UnlockGate {
    unlocked: bool,
    hooks: Vec<Hook>,
}

impl UnlockGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook for the first interaction
    ///
    /// Returns `false` (and drops the hook) if the gate already fired.
    pub fn on_unlock(&mut self, hook: impl FnOnce(Interaction) + Send + 'static) -> bool {
        if self.unlocked {
            return false;
        }
        self.hooks.push(Box::new(hook));
        true
    }

    /// Fire hooks on the first call; later calls do nothing
    pub fn trigger(&mut self, interaction: Interaction) -> bool {
        if self.unlocked {
            return false;
        }
        self.unlocked = true;
        for hook in self.hooks.drain(..) {
            hook(interaction);
        }
        true
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }
}

impl fmt::Debug for UnlockGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnlockGate")
            .field("unlocked", &self.unlocked)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
