// Read-only listing of executions, used by the `listing` execution mode
use tracing::debug;

use crate::api::ApiClient;
use crate::error::{CleanupError, Result};
use crate::models::{Execution, Scope};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
  pub project: Option<String>,
  pub job_name: Option<String>,
  pub only_running: bool,
}

/// Executions per project that match `filter`. Every returned execution has
/// its `project` filled in, even when the API omitted it.
pub async fn list_executions<A: ApiClient + ?Sized>(
  api: &A,
  filter: &ListingFilter,
) -> Result<Vec<(String, Vec<Execution>)>> {
  let projects = api.list_projects().await?;
  let projects = match &filter.project {
    Some(name) if projects.contains(name) => vec![name.clone()],
    Some(name) => return Err(CleanupError::UnknownProject(name.clone())),
    None => projects,
  };

  let mut listed = Vec::with_capacity(projects.len());
  for project in projects {
    let executions = api
      .list_executions(&project, filter.only_running)
      .await
      .map_err(|e| e.in_scope(&Scope::Project(project.clone())))?;

    let executions: Vec<Execution> = executions
      .into_iter()
      .filter(|execution| match &filter.job_name {
        Some(name) => execution.job_name() == Some(name.as_str()),
        None => true,
      })
      .map(|mut execution| {
        execution.project.get_or_insert_with(|| project.clone());
        execution
      })
      .collect();

    debug!(project = %project, count = executions.len(), "Listed executions");
    listed.push((project, executions));
  }
  Ok(listed)
}
