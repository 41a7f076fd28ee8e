//! Determinism policies: how a completion event triggers cancellation of
//! peers, and how a fully-settled batch resolves to a final verdict.

use crate::driver::status::CandidateStatus;

/// Selects between non-deterministic first-improvement and a deterministic
/// simulation of strictly sequential submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeterminismPolicy {
    /// First candidate in the batch that reports `BehaviorPresent` wins;
    /// `OutOfResources`/`Critical` on peers are recorded but not fatal.
    Eager,
    /// Results are logically reordered by `successor_id`; the first
    /// non-`BehaviorNotPresent` status in that order determines the verdict.
    Sequential,
}

/// The outcome of a fully-settled batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchVerdict {
    /// `successor_id` of the accepted, improving candidate.
    Improving(usize),
    /// No candidate improved; `out_of_resources` lists ids worth surfacing
    /// in the "no improving successor" message.
    NoImproving { out_of_resources: Vec<usize> },
    /// Sequential-simulating mode stopped at an earlier error before any
    /// `BehaviorPresent` could be accepted, even if one appeared later.
    HaltedOnError { at_successor_id: usize, status: CandidateStatus },
}

impl DeterminismPolicy {
    /// Decide which still-pending peers to cancel in response to one
    /// completion event. `known` holds every status recorded so far,
    /// including this event's own.
    pub fn ids_to_cancel(
        &self,
        completed_id: usize,
        status: CandidateStatus,
        batch_len: usize,
        known: &dyn Fn(usize) -> Option<CandidateStatus>,
    ) -> Vec<usize> {
        match self {
            DeterminismPolicy::Eager => {
                if !status.is_present() {
                    return Vec::new();
                }
                (0..batch_len)
                    .filter(|&id| id != completed_id && known(id).is_none())
                    .collect()
            }
            DeterminismPolicy::Sequential => {
                if status.is_not_present() {
                    return Vec::new();
                }
                ((completed_id + 1)..batch_len)
                    .filter(|&id| known(id).is_none())
                    .collect()
            }
        }
    }

    /// Resolve a fully-settled batch (every id has a terminal status,
    /// `Canceled` included) to a final verdict. `statuses` must be indexed
    /// by `successor_id` (`statuses[i]` is τᵢ's status) and `first_present`
    /// is the id of whichever candidate was *first observed* (in completion
    /// order) to report `BehaviorPresent`, if any — eager mode needs
    /// completion order, sequential mode ignores it in favor of index order.
    pub fn resolve(&self, statuses: &[CandidateStatus], first_present: Option<usize>) -> BatchVerdict {
        match self {
            DeterminismPolicy::Eager => {
                if let Some(id) = first_present {
                    return BatchVerdict::Improving(id);
                }
                let out_of_resources = statuses
                    .iter()
                    .enumerate()
                    .filter(|(_, status)| matches!(status, CandidateStatus::OutOfResources))
                    .map(|(id, _)| id)
                    .collect();
                BatchVerdict::NoImproving { out_of_resources }
            }
            DeterminismPolicy::Sequential => {
                for (id, status) in statuses.iter().enumerate() {
                    if status.is_not_present() || matches!(status, CandidateStatus::Canceled) {
                        continue;
                    }
                    return match status {
                        CandidateStatus::BehaviorPresent => BatchVerdict::Improving(id),
                        CandidateStatus::OutOfResources | CandidateStatus::Critical => {
                            BatchVerdict::HaltedOnError {
                                at_successor_id: id,
                                status: *status,
                            }
                        }
                        CandidateStatus::BehaviorNotPresent | CandidateStatus::Canceled => {
                            unreachable!("filtered above")
                        }
                    };
                }
                BatchVerdict::NoImproving {
                    out_of_resources: Vec::new(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eager_first_improvement_wins_regardless_of_completion_order() {
        let statuses = vec![
            CandidateStatus::BehaviorNotPresent,
            CandidateStatus::BehaviorNotPresent,
            CandidateStatus::BehaviorPresent,
        ];
        let verdict = DeterminismPolicy::Eager.resolve(&statuses, Some(2));
        assert_eq!(verdict, BatchVerdict::Improving(2));
    }

    #[test]
    fn eager_cancels_pending_peers_on_present() {
        let known = |id: usize| if id == 2 { Some(CandidateStatus::BehaviorPresent) } else { None };
        let to_cancel =
            DeterminismPolicy::Eager.ids_to_cancel(2, CandidateStatus::BehaviorPresent, 3, &known);
        let mut sorted = to_cancel;
        sorted.sort();
        assert_eq!(sorted, vec![0, 1]);
    }

    #[test]
    fn eager_does_not_cancel_on_not_present() {
        let known = |_: usize| None;
        let to_cancel = DeterminismPolicy::Eager.ids_to_cancel(
            0,
            CandidateStatus::BehaviorNotPresent,
            3,
            &known,
        );
        assert!(to_cancel.is_empty());
    }

    #[test]
    fn sequential_halts_on_earlier_out_of_resources_despite_later_present() {
        // Submission order: 0=OutOfResources, 1=NotPresent, 2=Present.
        let statuses = vec![
            CandidateStatus::OutOfResources,
            CandidateStatus::BehaviorNotPresent,
            CandidateStatus::BehaviorPresent,
        ];
        let verdict = DeterminismPolicy::Sequential.resolve(&statuses, Some(2));
        assert_eq!(
            verdict,
            BatchVerdict::HaltedOnError {
                at_successor_id: 0,
                status: CandidateStatus::OutOfResources
            }
        );
    }

    #[test]
    fn sequential_accepts_present_when_all_earlier_are_not_present() {
        let statuses = vec![
            CandidateStatus::BehaviorNotPresent,
            CandidateStatus::BehaviorNotPresent,
            CandidateStatus::BehaviorPresent,
        ];
        let verdict = DeterminismPolicy::Sequential.resolve(&statuses, Some(2));
        assert_eq!(verdict, BatchVerdict::Improving(2));
    }

    #[test]
    fn sequential_cancels_all_later_ids_on_non_not_present() {
        let known = |_: usize| None;
        let to_cancel =
            DeterminismPolicy::Sequential.ids_to_cancel(1, CandidateStatus::Critical, 4, &known);
        let mut sorted = to_cancel;
        sorted.sort();
        assert_eq!(sorted, vec![2, 3]);
    }

    #[test]
    fn sequential_all_not_present_is_no_improving() {
        let statuses = vec![CandidateStatus::BehaviorNotPresent; 3];
        let verdict = DeterminismPolicy::Sequential.resolve(&statuses, None);
        assert_eq!(
            verdict,
            BatchVerdict::NoImproving {
                out_of_resources: Vec::new()
            }
        );
    }

    #[test]
    fn eager_no_improving_lists_out_of_resources_ids() {
        let statuses = vec![
            CandidateStatus::OutOfResources,
            CandidateStatus::BehaviorNotPresent,
            CandidateStatus::Critical,
        ];
        let verdict = DeterminismPolicy::Eager.resolve(&statuses, None);
        assert_eq!(
            verdict,
            BatchVerdict::NoImproving {
                out_of_resources: vec![0]
            }
        );
    }
}
