use super::{FatalCause, ProjectRef};
use crate::collect::{RepoFailureCause, paginate};
use crate::facts::{Project, ProjectItem, RepoSpec};
use crate::governor::RateGovernor;
use crate::source::{EntitySource, QuotaResource};
use std::collections::BTreeSet;

const LOG_TARGET: &str = "    detect";

/// What DETECT hands to COLLECT.
#[derive(Debug, Clone)]
pub(super) struct Detection {
    pub project: Project,
    /// Every project that matched the reference, the selected one included.
    pub candidates: Vec<Project>,
    pub items: Vec<ProjectItem>,
    pub repositories: Vec<RepoSpec>,
}

/// Picks the project a reference designates among the owner's projects.
///
/// A single match is selected. Among several, the unique most recently updated one wins;
/// a tie at the top cannot be resolved and is reported with every candidate.
pub(super) fn select_project(target: &ProjectRef, projects: Vec<Project>) -> Result<(Project, Vec<Project>), FatalCause> {
    let mut candidates: Vec<Project> = projects.into_iter().filter(|p| target.matches(p)).collect();
    candidates.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.number.cmp(&b.number)));

    let Some(first) = candidates.first() else {
        return Err(FatalCause::ProjectNotFound { target: target.to_string() });
    };

    let tied = candidates.iter().filter(|p| p.updated_at == first.updated_at).count();
    if tied > 1 {
        return Err(FatalCause::Ambiguous {
            target: target.to_string(),
            candidates: candidates.iter().map(Project::reference).collect(),
        });
    }

    Ok((first.clone(), candidates))
}

/// The repositories a project covers: the ones linked to it plus the ones its items belong to.
pub(super) fn target_repositories(project: &Project, items: &[ProjectItem]) -> Vec<RepoSpec> {
    let linked = project.repositories.iter().map(String::as_str);
    let from_items = items.iter().filter_map(|i| i.repository.as_deref());

    let repositories: BTreeSet<RepoSpec> = linked
        .chain(from_items)
        .filter_map(|name| match RepoSpec::parse(name) {
            Ok(spec) => Some(spec),
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Ignoring unusable repository name '{name}': {e}");
                None
            }
        })
        .collect();

    repositories.into_iter().collect()
}

/// Resolves `target` to a project, its items, and the repositories to collect.
pub(super) async fn detect<S: EntitySource>(
    source: &S,
    governor: &RateGovernor,
    target: &ProjectRef,
    item_limit: u32,
) -> Result<Detection, FatalCause> {
    let owner = target.owner();
    log::info!(target: LOG_TARGET, "Looking for {target}");

    let projects: Vec<Project> = paginate(governor, QuotaResource::GraphQl, owner, u32::MAX, |cursor| source.list_projects(owner, cursor))
        .await
        .map_err(|cause| match cause {
            RepoFailureCause::NotFound => FatalCause::ProjectNotFound { target: target.to_string() },
            other => FatalCause::Api(other),
        })?;
    log::debug!(target: LOG_TARGET, "Owner '{owner}' has {} project(s)", projects.len());

    let (project, candidates) = select_project(target, projects)?;
    let items: Vec<ProjectItem> = paginate(governor, QuotaResource::GraphQl, &project.reference(), item_limit, |cursor| {
        source.list_project_items(&project.owner, project.number, cursor)
    })
    .await
    .map_err(FatalCause::Api)?;

    let repositories = target_repositories(&project, &items);
    if repositories.is_empty() {
        return Err(FatalCause::NoRepositories {
            project: project.reference(),
        });
    }

    Ok(Detection {
        project,
        candidates,
        items,
        repositories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::ProjectItemType;
    use chrono::{DateTime, Utc};

    fn project(number: u64, updated: Option<&str>, repositories: &[&str]) -> Project {
        Project {
            owner: "octo-org".to_string(),
            number,
            title: format!("P{number}"),
            is_closed: false,
            updated_at: updated.map(|s| DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)),
            url: None,
            repositories: repositories.iter().map(|r| (*r).to_string()).collect(),
        }
    }

    fn owner() -> ProjectRef {
        ProjectRef::Owner {
            owner: "octo-org".to_string(),
        }
    }

    #[test]
    fn test_single_candidate_selected() {
        let (selected, candidates) = select_project(&owner(), vec![project(1, None, &[])]).unwrap();
        assert_eq!(selected.number, 1);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_most_recent_candidate_selected() {
        let projects = vec![
            project(1, Some("2024-01-01T00:00:00Z"), &[]),
            project(2, Some("2024-03-01T00:00:00Z"), &[]),
            project(3, None, &[]),
        ];

        let (selected, candidates) = select_project(&owner(), projects).unwrap();
        assert_eq!(selected.number, 2);
        assert_eq!(candidates.len(), 3);
    }

    #[test]
    fn test_equally_recent_candidates_are_ambiguous() {
        let projects = vec![
            project(1, Some("2024-03-01T00:00:00Z"), &[]),
            project(2, Some("2024-03-01T00:00:00Z"), &[]),
            project(3, Some("2023-01-01T00:00:00Z"), &[]),
        ];

        let error = select_project(&owner(), projects).unwrap_err();
        assert!(matches!(
            &error,
            FatalCause::Ambiguous { candidates, .. } if *candidates == ["octo-org#1 (P1)", "octo-org#2 (P2)", "octo-org#3 (P3)"]
        ));
    }

    #[test]
    fn test_no_candidate_is_not_found() {
        let target = ProjectRef::Explicit {
            owner: "octo-org".to_string(),
            number: 9,
        };
        let error = select_project(&target, vec![project(1, None, &[])]).unwrap_err();
        assert!(matches!(error, FatalCause::ProjectNotFound { .. }));
    }

    #[test]
    fn test_repositories_union_sorted_and_deduplicated() {
        let project = project(1, None, &["octo-org/web", "octo-org/api"]);
        let item = |repository: Option<&str>| ProjectItem {
            id: "x".to_string(),
            content_type: ProjectItemType::Issue,
            title: String::new(),
            repository: repository.map(str::to_string),
            number: None,
            status: None,
            url: None,
        };
        let items = [item(Some("octo-org/api")), item(Some("other/lib")), item(None), item(Some("not a repo"))];

        let names: Vec<_> = target_repositories(&project, &items).iter().map(RepoSpec::full_name).collect();
        assert_eq!(names, ["octo-org/api", "octo-org/web", "other/lib"]);
    }
}
