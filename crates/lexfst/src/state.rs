// In-memory node representation used while the automaton is being built.

use crate::transition::Transition;

/// One FST node under construction.
///
/// A state on the builder's unfinished stack is still mutable: outputs get
/// pushed into it and transitions get appended as children are frozen. Once
/// popped and frozen it never changes again, and only then is structural
/// equivalence meaningful, since every destination is a fixed address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuilderState {
    pub is_final: bool,
    pub final_output: u64,
    pub transitions: Vec<Transition>,
}

impl BuilderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transition. Labels must arrive in strictly increasing order.
    #[inline]
    pub fn add_transition(&mut self, transition: Transition) {
        debug_assert!(
            self.transitions
                .last()
                .is_none_or(|last| last.label < transition.label),
            "transition labels must be strictly increasing"
        );
        self.transitions.push(transition);
    }

    /// Mark the state as accepting with the given final output.
    #[inline]
    pub fn set_final(&mut self, output: u64) {
        self.is_final = true;
        self.final_output = output;
    }

    /// Structural equivalence: finality, final output and the full
    /// transition sequence (labels, outputs and destinations) all match.
    #[inline]
    pub fn equiv(&self, other: &BuilderState) -> bool {
        self == other
    }

    /// Add `prefix` to every output leaving this state.
    ///
    /// Used when an output shared by a common key prefix shrinks and the
    /// difference has to move one level down.
    pub fn add_output_prefix(&mut self, prefix: u64) {
        if self.is_final {
            self.final_output += prefix;
        }
        for t in &mut self.transitions {
            t.output += prefix;
        }
    }

    /// Reset to an empty, non-final state while keeping the allocation.
    pub fn clear(&mut self) {
        self.is_final = false;
        self.final_output = 0;
        self.transitions.clear();
    }
}
