//! Transition tables for every status-governed entity.
//!
//! Each table is the complete set of legal edges; any pair not listed is an
//! invalid transition. Edges marked `Authority::System` can only be taken by
//! the engine itself as a side effect of another transition.

use std::fmt;
use std::str::FromStr;

use crate::engine::Actor;
use crate::models::application::ApplicationStatus;
use crate::models::internship::AssignmentStatus;
use crate::models::interview::InterviewStatus;
use crate::models::job::JobStatus;
use crate::models::student::StudentStatus;
use crate::models::task::TaskStatus;
use crate::models::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Application,
    Job,
    Interview,
    Assignment,
    Student,
    Task,
    Internship,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Application => "application",
            EntityKind::Job => "job",
            EntityKind::Interview => "interview",
            EntityKind::Assignment => "assignment",
            EntityKind::Student => "student",
            EntityKind::Task => "task",
            EntityKind::Internship => "internship",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    Any,
    System,
}

impl Authority {
    pub fn permits(self, actor: &Actor) -> bool {
        match self {
            Authority::Any => true,
            Authority::System => actor.is_system(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Edge<S: 'static> {
    pub from: S,
    pub to: S,
    pub authority: Authority,
}

const fn any<S>(from: S, to: S) -> Edge<S> {
    Edge { from, to, authority: Authority::Any }
}

const fn system<S>(from: S, to: S) -> Edge<S> {
    Edge { from, to, authority: Authority::System }
}

pub trait Lifecycle:
    Copy + Eq + fmt::Debug + fmt::Display + FromStr<Err = UnknownVariant> + Send + Sync + 'static
{
    const KIND: EntityKind;
    const TABLE: &'static str;
    const INITIAL: Self;

    fn states() -> &'static [Self];
    fn edges() -> &'static [Edge<Self>];
    fn label(self) -> &'static str;

    fn can_transition(self, to: Self, actor: &Actor) -> bool {
        Self::edges()
            .iter()
            .any(|e| e.from == self && e.to == to && e.authority.permits(actor))
    }

    fn is_terminal(self) -> bool {
        !Self::edges().iter().any(|e| e.from == self)
    }

    fn targets(self, actor: &Actor) -> Vec<Self> {
        Self::edges()
            .iter()
            .filter(|e| e.from == self && e.authority.permits(actor))
            .map(|e| e.to)
            .collect()
    }
}

use ApplicationStatus as A;
const APPLICATION_EDGES: &[Edge<ApplicationStatus>] = &[
    any(A::Pending, A::UnderReview),
    any(A::Pending, A::Rejected),
    any(A::UnderReview, A::Shortlisted),
    any(A::UnderReview, A::Rejected),
    any(A::Shortlisted, A::Selected),
    any(A::Shortlisted, A::Rejected),
];

use JobStatus as J;
const JOB_EDGES: &[Edge<JobStatus>] = &[
    any(J::Active, J::Inactive),
    any(J::Inactive, J::Active),
    any(J::Active, J::Closed),
    any(J::Inactive, J::Closed),
];

use InterviewStatus as I;
const INTERVIEW_EDGES: &[Edge<InterviewStatus>] = &[
    any(I::Scheduled, I::Completed),
    any(I::Scheduled, I::Cancelled),
    any(I::Scheduled, I::Rescheduled),
    any(I::Rescheduled, I::Scheduled),
];

use AssignmentStatus as G;
const ASSIGNMENT_EDGES: &[Edge<AssignmentStatus>] = &[
    any(G::Assigned, G::Completed),
    any(G::Assigned, G::Cancelled),
];

use TaskStatus as T;
const TASK_EDGES: &[Edge<TaskStatus>] = &[
    any(T::Pending, T::InProgress),
    any(T::Pending, T::Cancelled),
    any(T::InProgress, T::Completed),
    any(T::InProgress, T::Cancelled),
];

use StudentStatus as S;
const STUDENT_EDGES: &[Edge<StudentStatus>] = &[
    any(S::Available, S::Inactive),
    any(S::Inactive, S::Available),
    any(S::Completed, S::Available),
    any(S::Completed, S::Inactive),
    any(S::Selected, S::Completed),
    system(S::Available, S::Applied),
    system(S::Completed, S::Applied),
    system(S::Applied, S::Available),
    system(S::Applied, S::Selected),
    system(S::Available, S::Selected),
    system(S::Selected, S::Available),
];

macro_rules! lifecycle {
    ($ty:ty, $kind:expr, $table:literal, $initial:expr, $edges:expr) => {
        impl Lifecycle for $ty {
            const KIND: EntityKind = $kind;
            const TABLE: &'static str = $table;
            const INITIAL: Self = $initial;

            fn states() -> &'static [Self] {
                <$ty>::ALL
            }

            fn edges() -> &'static [Edge<Self>] {
                $edges
            }

            fn label(self) -> &'static str {
                self.as_str()
            }
        }
    };
}

lifecycle!(ApplicationStatus, EntityKind::Application, "applications", A::Pending, APPLICATION_EDGES);
lifecycle!(JobStatus, EntityKind::Job, "jobs", J::Active, JOB_EDGES);
lifecycle!(InterviewStatus, EntityKind::Interview, "interviews", I::Scheduled, INTERVIEW_EDGES);
lifecycle!(AssignmentStatus, EntityKind::Assignment, "intern_assignments", G::Assigned, ASSIGNMENT_EDGES);
lifecycle!(TaskStatus, EntityKind::Task, "tasks", T::Pending, TASK_EDGES);
lifecycle!(StudentStatus, EntityKind::Student, "students", S::Available, STUDENT_EDGES);

fn verify<L: Lifecycle>() -> Result<usize, String> {
    let edges = L::edges();
    for (i, e) in edges.iter().enumerate() {
        if e.from == e.to {
            return Err(format!("{}: self edge on {}", L::KIND, e.from));
        }
        if edges[..i].iter().any(|p| p.from == e.from && p.to == e.to) {
            return Err(format!("{}: duplicate edge {} -> {}", L::KIND, e.from, e.to));
        }
    }
    for state in L::states() {
        let reachable = *state == L::INITIAL || edges.iter().any(|e| e.to == *state);
        if !reachable {
            return Err(format!("{}: state {} is unreachable", L::KIND, state));
        }
    }
    Ok(edges.len())
}

/// Sanity-checks every table; run once at startup.
pub fn verify_tables() -> Result<usize, String> {
    Ok(verify::<ApplicationStatus>()?
        + verify::<JobStatus>()?
        + verify::<InterviewStatus>()?
        + verify::<AssignmentStatus>()?
        + verify::<TaskStatus>()?
        + verify::<StudentStatus>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::admin::Role;
    use uuid::Uuid;

    fn staff() -> Actor {
        Actor::Staff {
            id: Uuid::new_v4(),
            username: "tester".into(),
            role: Role::Admin,
        }
    }

    fn legal_pairs<L: Lifecycle>(actor: &Actor) -> Vec<(L, L)> {
        let mut out = Vec::new();
        for from in L::states() {
            for to in L::states() {
                if from.can_transition(*to, actor) {
                    out.push((*from, *to));
                }
            }
        }
        out
    }

    #[test]
    fn application_table_is_closed() {
        let legal = legal_pairs::<ApplicationStatus>(&staff());
        assert_eq!(
            legal,
            vec![
                (A::Pending, A::UnderReview),
                (A::Pending, A::Rejected),
                (A::UnderReview, A::Shortlisted),
                (A::UnderReview, A::Rejected),
                (A::Shortlisted, A::Selected),
                (A::Shortlisted, A::Rejected),
            ]
        );
        assert!(!A::Selected.can_transition(A::Pending, &staff()));
        assert!(A::Selected.is_terminal());
        assert!(A::Rejected.is_terminal());
        assert!(!A::Shortlisted.is_terminal());
    }

    #[test]
    fn job_can_pause_and_resume_but_closed_is_final() {
        let actor = staff();
        assert!(J::Active.can_transition(J::Inactive, &actor));
        assert!(J::Inactive.can_transition(J::Active, &actor));
        assert!(J::Inactive.can_transition(J::Closed, &actor));
        assert!(J::Closed.is_terminal());
        assert_eq!(legal_pairs::<JobStatus>(&actor).len(), 4);
    }

    #[test]
    fn rescheduled_interview_only_returns_to_scheduled() {
        let actor = staff();
        assert_eq!(I::Rescheduled.targets(&actor), vec![I::Scheduled]);
        assert!(!I::Rescheduled.can_transition(I::Completed, &actor));
        assert!(I::Completed.is_terminal());
        assert!(I::Cancelled.is_terminal());
    }

    #[test]
    fn assignment_and_task_tables() {
        let actor = staff();
        assert_eq!(G::Assigned.targets(&actor), vec![G::Completed, G::Cancelled]);
        assert!(G::Completed.is_terminal());
        assert!(!T::Pending.can_transition(T::Completed, &actor));
        assert!(T::InProgress.can_transition(T::Completed, &actor));
    }

    #[test]
    fn staff_cannot_take_system_only_student_edges() {
        let actor = staff();
        assert!(!S::Available.can_transition(S::Applied, &actor));
        assert!(S::Available.can_transition(S::Applied, &Actor::System));
        assert!(S::Available.can_transition(S::Inactive, &actor));
        assert!(!S::Applied.can_transition(S::Inactive, &Actor::System));
        assert!(S::Selected.can_transition(S::Available, &Actor::System));
        assert!(!S::Selected.can_transition(S::Available, &actor));
    }

    #[test]
    fn tables_pass_startup_verification() {
        assert_eq!(verify_tables(), Ok(31));
    }

    #[test]
    fn paused_is_accepted_as_inactive() {
        assert_eq!("Paused".parse::<JobStatus>().unwrap(), J::Inactive);
        assert_eq!("under review".parse::<ApplicationStatus>().unwrap(), A::UnderReview);
        assert!("Hired".parse::<ApplicationStatus>().is_err());
    }
}
