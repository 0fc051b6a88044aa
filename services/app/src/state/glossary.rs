//! services/app/src/state/glossary.rs
//!
//! Glossary generation state machine: idle → loading → loaded | failed.
//! Regenerating from loaded/failed restarts the cycle.

use doclens_core::domain::GlossaryTerm;
use doclens_core::ports::PortResult;

pub const GLOSSARY_FAILURE_MESSAGE: &str = "Could not generate the glossary. Please try again.";

#[derive(Debug, Default)]
pub enum GlossaryState {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<GlossaryTerm>),
    Failed(String),
}

impl GlossaryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a generation cycle. Returns false while one is already
    /// running.
    pub fn begin(&mut self) -> bool {
        if matches!(self, GlossaryState::Loading) {
            return false;
        }
        *self = GlossaryState::Loading;
        true
    }

    /// Applies the generation result. Ignored unless a cycle is running.
    pub fn finish(&mut self, result: PortResult<Vec<GlossaryTerm>>) {
        if !matches!(self, GlossaryState::Loading) {
            return;
        }
        *self = match result {
            Ok(terms) => GlossaryState::Loaded(terms),
            Err(_) => GlossaryState::Failed(GLOSSARY_FAILURE_MESSAGE.to_string()),
        };
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, GlossaryState::Loading)
    }

    pub fn reset(&mut self) {
        *self = GlossaryState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doclens_core::ports::PortError;

    fn terms() -> Vec<GlossaryTerm> {
        vec![GlossaryTerm {
            term: "embedding".into(),
            definition: "a vector representation of text".into(),
        }]
    }

    #[test]
    fn full_cycle_idle_loading_loaded() {
        let mut state = GlossaryState::new();
        assert!(state.begin());
        assert!(state.is_loading());
        state.finish(Ok(terms()));
        assert!(matches!(state, GlossaryState::Loaded(ref t) if t.len() == 1));
    }

    #[test]
    fn failure_then_regenerate() {
        let mut state = GlossaryState::new();
        state.begin();
        state.finish(Err(PortError::Unexpected("boom".into())));
        assert!(matches!(state, GlossaryState::Failed(_)));

        // Re-invoking from the failed state restarts the cycle.
        assert!(state.begin());
        state.finish(Ok(terms()));
        assert!(matches!(state, GlossaryState::Loaded(_)));
    }

    #[test]
    fn begin_is_rejected_while_loading() {
        let mut state = GlossaryState::new();
        assert!(state.begin());
        assert!(!state.begin());
    }

    #[test]
    fn stale_finish_without_a_running_cycle_is_ignored() {
        let mut state = GlossaryState::new();
        state.finish(Ok(terms()));
        assert!(matches!(state, GlossaryState::Idle));
    }
}
