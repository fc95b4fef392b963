use std::fmt;

use uuid::Uuid;

use crate::domain::{Pattern, SearchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Fetching,
    Classifying,
    Extracting,
    Sanitizing,
    Done,
    Failed,
}

impl fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug)]
pub struct SearchTrace {
    pub id: Uuid,
    phase: SearchPhase,
}

impl SearchTrace {
    pub fn start(pattern: &Pattern) -> Self {
        let trace = SearchTrace {
            id: Uuid::new_v4(),
            phase: SearchPhase::Idle,
        };
        log::info!("[{}] Searching for pattern: {}", trace.id, pattern);
        trace
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    // One fetch per endpoint or browser strategy, so phases loop back.
    pub fn enter(&mut self, next: SearchPhase) {
        if matches!(self.phase, SearchPhase::Done | SearchPhase::Failed) {
            log::warn!(
                "[{}] Ignoring {} after search already finished as {}",
                self.id,
                next,
                self.phase
            );
            return;
        }
        log::debug!("[{}] {} -> {}", self.id, self.phase, next);
        self.phase = next;
    }

    pub fn finish(&mut self, domain_count: usize) {
        self.enter(SearchPhase::Done);
        log::info!("[{}] Found {} available .com domains", self.id, domain_count);
    }

    pub fn fail(&mut self, error: &SearchError) {
        self.enter(SearchPhase::Failed);
        log::error!("[{}] Search failed: {}", self.id, error);
    }
}

#[cfg(test)]
mod tests {
    use super::{SearchPhase, SearchTrace};
    use crate::domain::{Pattern, SearchError};

    #[test]
    fn trace_runs_to_done() {
        let mut trace = SearchTrace::start(&Pattern::parse("ab.").unwrap());
        assert_eq!(trace.phase(), SearchPhase::Idle);
        for phase in [
            SearchPhase::Fetching,
            SearchPhase::Classifying,
            SearchPhase::Extracting,
            SearchPhase::Sanitizing,
            SearchPhase::Fetching,
        ] {
            trace.enter(phase);
            assert_eq!(trace.phase(), phase);
        }
        trace.finish(3);
        assert_eq!(trace.phase(), SearchPhase::Done);
    }

    #[test]
    fn trace_terminal_states_stick() {
        let mut trace = SearchTrace::start(&Pattern::parse("ab.").unwrap());
        trace.enter(SearchPhase::Fetching);
        trace.fail(&SearchError::Transport("boom".to_string()));
        trace.enter(SearchPhase::Classifying);
        assert_eq!(trace.phase(), SearchPhase::Failed);
    }
}
