use serde::{Deserialize, Serialize};

use crate::orchestrator::LifecycleAction;

/// Events reported to an observer during an orchestration.
///
/// Events carry no payload beyond their kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StackEvent {
    /// A matched instance has no order tag; nothing was done.
    IncompleteTagging,
    /// No matched instance has a usable order tag; nothing was done.
    NoOrdering,
    /// A region of a startup tier converged to running.
    TierStartedUp,
    /// A region of a shutdown tier converged to stopped.
    TierShutDown,
    /// A region of a tier did not converge within the poll budget.
    TierTimedOut,
    /// Every tier of a startup has been processed.
    StackStartedUp,
    /// Every tier of a shutdown has been processed.
    StackShutDown,
}

impl StackEvent {
    /// Per-tier success event for `action`.
    pub fn tier_complete(action: LifecycleAction) -> Self {
        match action {
            LifecycleAction::Startup => StackEvent::TierStartedUp,
            LifecycleAction::Shutdown => StackEvent::TierShutDown,
        }
    }

    /// Stack-level success event for `action`.
    pub fn stack_complete(action: LifecycleAction) -> Self {
        match action {
            LifecycleAction::Startup => StackEvent::StackStartedUp,
            LifecycleAction::Shutdown => StackEvent::StackShutDown,
        }
    }

    /// Whether observers should present this as an error.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            StackEvent::IncompleteTagging | StackEvent::NoOrdering | StackEvent::TierTimedOut
        )
    }

    /// Human readable text for display.
    pub fn message(&self) -> &'static str {
        match self {
            StackEvent::IncompleteTagging => {
                "Can not startup or shutdown environment.\nEnsure all tags are in use."
            }
            StackEvent::NoOrdering => "No startup or shutdown tags filled, or all are below 1.",
            StackEvent::TierStartedUp => "Tier startup",
            StackEvent::TierShutDown => "Tier shutdown",
            StackEvent::TierTimedOut => "Tier taking too long, skipping to next",
            StackEvent::StackStartedUp => "Stack startup",
            StackEvent::StackShutDown => "Stack shutdown",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StackEvent::IncompleteTagging => "incomplete_tagging",
            StackEvent::NoOrdering => "no_ordering",
            StackEvent::TierStartedUp => "tier_started_up",
            StackEvent::TierShutDown => "tier_shut_down",
            StackEvent::TierTimedOut => "tier_timed_out",
            StackEvent::StackStartedUp => "stack_started_up",
            StackEvent::StackShutDown => "stack_shut_down",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_specific_events() {
        assert_eq!(
            StackEvent::tier_complete(LifecycleAction::Startup),
            StackEvent::TierStartedUp
        );
        assert_eq!(
            StackEvent::stack_complete(LifecycleAction::Shutdown),
            StackEvent::StackShutDown
        );
    }

    #[test]
    fn test_is_error() {
        assert!(StackEvent::IncompleteTagging.is_error());
        assert!(StackEvent::TierTimedOut.is_error());
        assert!(!StackEvent::StackShutDown.is_error());
    }

    #[test]
    fn test_serialization_tag() {
        let json = serde_json::to_string(&StackEvent::TierTimedOut).unwrap();
        assert_eq!(json, r#"{"type":"tier_timed_out"}"#);

        let parsed: StackEvent = serde_json::from_str(r#"{"type":"no_ordering"}"#).unwrap();
        assert_eq!(parsed, StackEvent::NoOrdering);
    }
}
