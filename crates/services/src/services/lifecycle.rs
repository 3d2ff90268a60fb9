//! Project status/phase state machine.
//!
//! The forward chain is
//! `inquiry → estimating → negotiating → contracted → designing → manufacturing → installing → completed`.
//! Any non-terminal status may move to `cancelled`. `completed` and `cancelled` are terminal.
//! The phase is a function of the status, except for `cancelled`, which keeps whatever phase
//! the project was in when it was cancelled.

use db::models::project::{Project, ProjectPhase, ProjectStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

/// Forward chain in lifecycle order
const CHAIN: [ProjectStatus; 8] = [
    ProjectStatus::Inquiry,
    ProjectStatus::Estimating,
    ProjectStatus::Negotiating,
    ProjectStatus::Contracted,
    ProjectStatus::Designing,
    ProjectStatus::Manufacturing,
    ProjectStatus::Installing,
    ProjectStatus::Completed,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, TS)]
#[error("cannot move project from {from} to {to}")]
pub struct InvalidTransition {
    pub from: ProjectStatus,
    pub to: ProjectStatus,
}

/// What the phase must become after entering a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "phase", rename_all = "snake_case")]
pub enum PhaseTarget {
    Enter(ProjectPhase),
    /// Keep the phase the project already has
    Retain,
}

impl PhaseTarget {
    pub fn resolve(self, current: ProjectPhase) -> ProjectPhase {
        match self {
            PhaseTarget::Enter(phase) => phase,
            PhaseTarget::Retain => current,
        }
    }
}

/// Fixed status → phase bucket table
pub fn phase_for(status: ProjectStatus) -> PhaseTarget {
    match status {
        ProjectStatus::Inquiry
        | ProjectStatus::Estimating
        | ProjectStatus::Negotiating
        | ProjectStatus::Contracted => PhaseTarget::Enter(ProjectPhase::Sales),
        ProjectStatus::Designing => PhaseTarget::Enter(ProjectPhase::Design),
        ProjectStatus::Manufacturing => PhaseTarget::Enter(ProjectPhase::Manufacturing),
        ProjectStatus::Installing | ProjectStatus::Completed => {
            PhaseTarget::Enter(ProjectPhase::Construction)
        }
        ProjectStatus::Cancelled => PhaseTarget::Retain,
    }
}

/// Position in the forward chain; `None` for `cancelled`
pub fn rank(status: ProjectStatus) -> Option<usize> {
    CHAIN.iter().position(|s| *s == status)
}

pub fn successor(status: ProjectStatus) -> Option<ProjectStatus> {
    rank(status).and_then(|i| CHAIN.get(i + 1).copied())
}

pub fn is_terminal(status: ProjectStatus) -> bool {
    matches!(status, ProjectStatus::Completed | ProjectStatus::Cancelled)
}

/// True from `contracted` onward; never for `cancelled`
pub fn is_contracted_or_later(status: ProjectStatus) -> bool {
    match (rank(status), rank(ProjectStatus::Contracted)) {
        (Some(at), Some(contracted)) => at >= contracted,
        _ => false,
    }
}

/// Decide whether `current → requested` is legal without an override.
///
/// Self-transitions always succeed. Pure: the caller applies the resulting phase.
pub fn validate_transition(
    current: ProjectStatus,
    requested: ProjectStatus,
) -> Result<PhaseTarget, InvalidTransition> {
    let invalid = InvalidTransition {
        from: current,
        to: requested,
    };
    if current == requested {
        return Ok(phase_for(current));
    }
    if is_terminal(current) {
        return Err(invalid);
    }
    if requested == ProjectStatus::Cancelled {
        // Cancellation freezes the phase the project is in right now
        return Ok(phase_for(current));
    }
    if successor(current) == Some(requested) {
        Ok(phase_for(requested))
    } else {
        Err(invalid)
    }
}

/// Statuses reachable from `current` in one legal step (excluding staying put)
pub fn allowed_targets(current: ProjectStatus) -> Vec<ProjectStatus> {
    if is_terminal(current) {
        return Vec::new();
    }
    successor(current)
        .into_iter()
        .chain(std::iter::once(ProjectStatus::Cancelled))
        .collect()
}

/// A project's position in the lifecycle with the phase derived wherever possible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Active(ProjectStatus),
    Completed,
    Cancelled { phase: ProjectPhase },
}

impl LifecycleState {
    /// Build from stored fields; the stored phase is only consulted for `cancelled`
    pub fn new(status: ProjectStatus, stored_phase: ProjectPhase) -> Self {
        match status {
            ProjectStatus::Completed => LifecycleState::Completed,
            ProjectStatus::Cancelled => LifecycleState::Cancelled {
                phase: stored_phase,
            },
            other => LifecycleState::Active(other),
        }
    }

    pub fn of(project: &Project) -> Self {
        Self::new(project.status, project.current_phase)
    }

    pub fn status(&self) -> ProjectStatus {
        match self {
            LifecycleState::Active(status) => *status,
            LifecycleState::Completed => ProjectStatus::Completed,
            LifecycleState::Cancelled { .. } => ProjectStatus::Cancelled,
        }
    }

    pub fn phase(&self) -> ProjectPhase {
        match self {
            LifecycleState::Cancelled { phase } => *phase,
            // Active and completed statuses always map to a concrete phase
            other => phase_for(other.status()).resolve(ProjectPhase::Construction),
        }
    }

    /// Follow the transition table
    pub fn advance(&self, requested: ProjectStatus) -> Result<Self, InvalidTransition> {
        let target = validate_transition(self.status(), requested)?;
        Ok(Self::new(requested, target.resolve(self.phase())))
    }

    /// Administrative correction: any target, no table check
    pub fn force(&self, requested: ProjectStatus) -> Self {
        Self::new(requested, phase_for(requested).resolve(self.phase()))
    }
}
