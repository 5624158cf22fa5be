use chrono::{DateTime, Local};

use crate::model::{Build, Pipeline, PullRequest, Repository, WorkItem};
use crate::state::{DataCategory, DataSnapshot};

/// A single change to the shared snapshot.
#[derive(Clone, Debug)]
pub enum DataEvent {
    RefreshStarted,
    WorkItemsLoaded { items: Vec<WorkItem> },
    BuildsLoaded { builds: Vec<Build> },
    PipelinesLoaded { pipelines: Vec<Pipeline> },
    RepositoriesLoaded { repositories: Vec<Repository> },
    PullRequestsLoaded { pull_requests: Vec<PullRequest> },
    FetchFailed {
        category: DataCategory,
        message: String,
    },
    RefreshFinished { at: DateTime<Local> },
    /// The cycle died before finishing; nothing was applied.
    RefreshAborted,
}

pub fn reduce(state: &mut DataSnapshot, event: &DataEvent) {
    match event {
        DataEvent::RefreshStarted => {
            state.loading = true;
        }
        DataEvent::WorkItemsLoaded { items } => {
            state.work_items = items.clone();
            state.failed.remove(&DataCategory::WorkItems);
        }
        DataEvent::BuildsLoaded { builds } => {
            state.builds = builds.clone();
            state.failed.remove(&DataCategory::Builds);
        }
        DataEvent::PipelinesLoaded { pipelines } => {
            state.pipelines = pipelines.clone();
            state.failed.remove(&DataCategory::Pipelines);
        }
        DataEvent::RepositoriesLoaded { repositories } => {
            state.repositories = repositories.clone();
            state.failed.remove(&DataCategory::Repositories);
        }
        DataEvent::PullRequestsLoaded { pull_requests } => {
            state.pull_requests = pull_requests.clone();
            state.failed.remove(&DataCategory::PullRequests);
        }
        // Previous data for the category is kept.
        DataEvent::FetchFailed { category, .. } => {
            state.failed.insert(*category);
        }
        DataEvent::RefreshFinished { at } => {
            state.last_refresh = Some(*at);
            state.loading = false;
            state.generation += 1;
        }
        DataEvent::RefreshAborted => {
            state.loading = false;
        }
    }
}

/// Apply a batch of events in order.
pub fn reduce_all<'a, I>(state: &mut DataSnapshot, events: I)
where
    I: IntoIterator<Item = &'a DataEvent>,
{
    for event in events {
        reduce(state, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BuildDefinition;

    fn build(number: &str) -> Build {
        Build {
            build_number: number.into(),
            definition: BuildDefinition {
                name: "ci".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_refresh_lifecycle() {
        let mut state = DataSnapshot::new();
        reduce(&mut state, &DataEvent::RefreshStarted);
        assert!(state.loading);

        let at = Local::now();
        reduce(&mut state, &DataEvent::RefreshFinished { at });
        assert!(!state.loading);
        assert_eq!(state.last_refresh, Some(at));
        assert_eq!(state.generation, 1);
    }

    #[test]
    fn test_aborted_refresh_stops_loading() {
        let mut state = DataSnapshot::new();
        reduce_all(
            &mut state,
            &[DataEvent::RefreshStarted, DataEvent::RefreshAborted],
        );
        assert!(!state.loading);
        assert_eq!(state.last_refresh, None);
        assert_eq!(state.generation, 0);
    }

    #[test]
    fn test_failed_fetch_keeps_previous_value() {
        let mut state = DataSnapshot::new();
        reduce(
            &mut state,
            &DataEvent::BuildsLoaded {
                builds: vec![build("1"), build("2")],
            },
        );

        let events = vec![
            DataEvent::RefreshStarted,
            DataEvent::FetchFailed {
                category: DataCategory::Builds,
                message: "timeout".into(),
            },
            DataEvent::PipelinesLoaded {
                pipelines: vec![Pipeline::default()],
            },
            DataEvent::RefreshFinished { at: Local::now() },
        ];
        reduce_all(&mut state, &events);

        assert_eq!(state.builds.len(), 2);
        assert_eq!(state.pipelines.len(), 1);
        assert!(state.failed.contains(&DataCategory::Builds));
        assert!(state.has_failures());
    }

    #[test]
    fn test_success_clears_failure_marker() {
        let mut state = DataSnapshot::new();
        reduce(
            &mut state,
            &DataEvent::FetchFailed {
                category: DataCategory::WorkItems,
                message: "401".into(),
            },
        );
        reduce(&mut state, &DataEvent::WorkItemsLoaded { items: vec![] });
        assert!(!state.has_failures());
    }
}
