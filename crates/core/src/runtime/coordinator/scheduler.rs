use super::change::DirtySet;
use rescope_api::ProjectId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Per-project position in the rescan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectPhase {
    Idle,
    /// Waiting for the debounce window to close.
    PendingRescan { due: Instant },
    /// A scan is running. `queued` is set when changes arrived meanwhile.
    Scanning { queued: Option<Instant> },
}

#[derive(Debug)]
struct Slot {
    phase: ProjectPhase,
    dirty: DirtySet,
}

/// Debounce and coalescing state for every watched project.
///
/// Pure bookkeeping: callers pass the current time and run the scans themselves.
/// At most one scan per project is in flight; changes during a scan queue exactly one
/// follow-up cycle.
#[derive(Debug)]
pub struct RescanScheduler {
    debounce: Duration,
    slots: HashMap<ProjectId, Slot>,
}

impl RescanScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            slots: HashMap::new(),
        }
    }

    pub fn phase(&self, project: &ProjectId) -> ProjectPhase {
        self.slots
            .get(project)
            .map(|s| s.phase)
            .unwrap_or(ProjectPhase::Idle)
    }

    /// Record a change. Restarts the debounce window.
    pub fn record(&mut self, project: ProjectId, dirty: DirtySet, now: Instant) {
        let due = now + self.debounce;
        let slot = self.slots.entry(project).or_insert(Slot {
            phase: ProjectPhase::Idle,
            dirty: DirtySet::default(),
        });
        slot.dirty.merge(dirty);
        slot.phase = match slot.phase {
            ProjectPhase::Idle | ProjectPhase::PendingRescan { .. } => {
                ProjectPhase::PendingRescan { due }
            }
            ProjectPhase::Scanning { .. } => ProjectPhase::Scanning { queued: Some(due) },
        };
    }

    pub fn has_pending(&self) -> bool {
        self.slots
            .values()
            .any(|s| matches!(s.phase, ProjectPhase::PendingRescan { .. }))
    }

    /// Earliest deadline among pending projects.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots
            .values()
            .filter_map(|s| match s.phase {
                ProjectPhase::PendingRescan { due } => Some(due),
                _ => None,
            })
            .min()
    }

    /// Move every project whose window has closed into `Scanning`, handing out its
    /// accumulated changes. Sorted by project id.
    pub fn take_due(&mut self, now: Instant) -> Vec<(ProjectId, DirtySet)> {
        let mut due: Vec<(ProjectId, DirtySet)> = self
            .slots
            .iter_mut()
            .filter_map(|(id, slot)| match slot.phase {
                ProjectPhase::PendingRescan { due } if due <= now => {
                    slot.phase = ProjectPhase::Scanning { queued: None };
                    Some((id.clone(), std::mem::take(&mut slot.dirty)))
                }
                _ => None,
            })
            .collect();
        due.sort_by(|a, b| a.0.cmp(&b.0));
        due
    }

    /// A scan finished. Queued changes become pending again; otherwise the project idles.
    pub fn complete(&mut self, project: &ProjectId) {
        let Some(slot) = self.slots.get_mut(project) else {
            return;
        };
        match slot.phase {
            ProjectPhase::Scanning {
                queued: Some(due),
            } => slot.phase = ProjectPhase::PendingRescan { due },
            _ => {
                self.slots.remove(project);
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescope_api::{ResourceKey, ResourcePath, ResourceTypeId};

    fn key(path: &str) -> ResourceKey {
        ResourceKey::new(
            ResourceTypeId::from_static("script-python"),
            ResourcePath::new(path),
        )
    }

    #[test]
    fn test_burst_coalesces_into_one_cycle() {
        let mut scheduler = RescanScheduler::new(Duration::from_millis(500));
        let a = ProjectId::new("a");
        let t0 = Instant::now();

        for i in 0..10 {
            scheduler.record(
                a.clone(),
                DirtySet::resource(key(&format!("m{i}"))),
                t0 + Duration::from_millis(i * 10),
            );
        }
        let last = t0 + Duration::from_millis(90);
        assert_eq!(
            scheduler.next_deadline(),
            Some(last + Duration::from_millis(500))
        );

        assert!(scheduler.take_due(last + Duration::from_millis(499)).is_empty());
        let due = scheduler.take_due(last + Duration::from_millis(500));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].1.resources.len(), 10);
        assert!(due[0].1.is_incremental());
        assert_eq!(scheduler.phase(&a), ProjectPhase::Scanning { queued: None });

        scheduler.complete(&a);
        assert_eq!(scheduler.phase(&a), ProjectPhase::Idle);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_changes_during_scan_queue_one_followup() {
        let mut scheduler = RescanScheduler::new(Duration::from_millis(100));
        let a = ProjectId::new("a");
        let t0 = Instant::now();

        scheduler.record(a.clone(), DirtySet::full(), t0);
        let first = scheduler.take_due(t0 + Duration::from_millis(100));
        assert_eq!(first.len(), 1);

        // Two changes while scanning.
        scheduler.record(a.clone(), DirtySet::resource(key("x")), t0 + Duration::from_millis(150));
        scheduler.record(a.clone(), DirtySet::resource(key("y")), t0 + Duration::from_millis(160));
        assert!(!scheduler.has_pending());
        assert!(scheduler.take_due(t0 + Duration::from_secs(10)).is_empty());

        scheduler.complete(&a);
        assert_eq!(
            scheduler.phase(&a),
            ProjectPhase::PendingRescan {
                due: t0 + Duration::from_millis(260)
            }
        );
        let second = scheduler.take_due(t0 + Duration::from_millis(260));
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].1.resources.len(), 2);
        assert!(!second[0].1.full);
    }

    #[test]
    fn test_projects_are_independent() {
        let mut scheduler = RescanScheduler::new(Duration::from_millis(100));
        let t0 = Instant::now();
        scheduler.record(ProjectId::new("b"), DirtySet::full(), t0);
        scheduler.record(ProjectId::new("a"), DirtySet::full(), t0 + Duration::from_millis(50));

        let due = scheduler.take_due(t0 + Duration::from_millis(120));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].0, ProjectId::new("b"));

        let due = scheduler.take_due(t0 + Duration::from_millis(150));
        assert_eq!(due[0].0, ProjectId::new("a"));
    }
}
