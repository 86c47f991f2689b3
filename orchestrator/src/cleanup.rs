// Cleanup orchestration: scope resolution, paging, paired deletion, reconciliation
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::config::KeepTime;
use crate::db::DbClient;
use crate::error::{CleanupError, Result};
use crate::interrupt::{InterruptGuard, NeverInterrupt};
use crate::models::{CleanupSummary, DeletedRows, Execution, Scope, WorkflowRefs};
use crate::pagination::{self, PageRange};
use crate::retry::RetryPolicy;

/// Restricts a run to one project, or one job inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFilter {
  pub project: Option<String>,
  pub job: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOptions {
  pub scope_filter: ScopeFilter,
  /// Page through each project's executions directly instead of job by job.
  pub group_by_project: bool,
  /// Total attempts per paired page deletion and per reconciliation.
  pub retries: u32,
  pub backoff: Duration,
  /// Delete `workflow_workflow_step` rows explicitly before their steps.
  pub unoptimized: bool,
}

impl Default for CleanupOptions {
  fn default() -> Self {
    Self {
      scope_filter: ScopeFilter::default(),
      group_by_project: true,
      retries: 5,
      backoff: Duration::from_secs(5),
      unoptimized: false,
    }
  }
}

/// Drives a cleanup run. Every external effect goes through the injected
/// [`ApiClient`] and [`DbClient`].
pub struct Orchestrator<A, D> {
  api: A,
  db: D,
  chunk_size: u64,
  keep_time: KeepTime,
  interrupt: Box<dyn InterruptGuard>,
}

impl<A: ApiClient, D: DbClient> Orchestrator<A, D> {
  pub fn new(api: A, db: D, chunk_size: u64, keep_time: KeepTime) -> Self {
    Self {
      api,
      db,
      chunk_size,
      keep_time,
      interrupt: Box::new(NeverInterrupt),
    }
  }

  pub fn with_interrupt_guard(mut self, guard: impl InterruptGuard + 'static) -> Self {
    self.interrupt = Box::new(guard);
    self
  }

  /// Delete every aged execution in scope together with its workflow rows,
  /// then sweep orphaned workflows once per top-level scope.
  pub async fn clean(&self, options: &CleanupOptions) -> Result<CleanupSummary> {
    let policy = RetryPolicy::new(options.retries, options.backoff);
    let mut summary = CleanupSummary::default();

    for scope in self.top_level_scopes(&options.scope_filter).await? {
      let mut pages_done = 0;
      for unit in self.work_units(&scope, options.group_by_project).await? {
        pages_done += self.clean_scope(&unit, options, &policy, &mut summary).await?;
        summary.scopes += 1;
      }

      self.check_interrupt(&scope, pages_done)?;
      self.reconcile(&scope, options, &policy, &mut summary).await?;
    }

    info!(
      executions_deleted = summary.executions_deleted,
      workflows_deleted = summary.workflows_deleted,
      orphan_workflows_deleted = summary.orphan_workflows_deleted,
      "Statistics: {} old executions deleted.",
      summary.executions_deleted
    );
    Ok(summary)
  }

  async fn top_level_scopes(&self, filter: &ScopeFilter) -> Result<Vec<Scope>> {
    let projects = self.api.list_projects().await?;
    debug!(count = projects.len(), "Listed projects");

    let Some(project) = &filter.project else {
      return Ok(projects.into_iter().map(Scope::Project).collect());
    };
    if !projects.contains(project) {
      return Err(CleanupError::UnknownProject(project.clone()));
    }

    Ok(vec![match &filter.job {
      Some(id) => Scope::Job {
        project: project.clone(),
        id: id.clone(),
      },
      None => Scope::Project(project.clone()),
    }])
  }

  /// Scopes whose listings are paged through for one top-level scope.
  async fn work_units(&self, scope: &Scope, group_by_project: bool) -> Result<Vec<Scope>> {
    match scope {
      Scope::Project(project) if !group_by_project => {
        let jobs = self
          .api
          .list_jobs(project)
          .await
          .map_err(|e| e.in_scope(scope))?;
        debug!(scope = %scope, jobs = jobs.len(), "Cleaning job by job");
        Ok(jobs
          .into_iter()
          .map(|id| Scope::Job {
            project: project.clone(),
            id,
          })
          .collect())
      }
      _ => Ok(vec![scope.clone()]),
    }
  }

  /// Page through one scope's aged executions. Returns the pages visited.
  async fn clean_scope(
    &self,
    scope: &Scope,
    options: &CleanupOptions,
    policy: &RetryPolicy,
    summary: &mut CleanupSummary,
  ) -> Result<u64> {
    let total = self
      .api
      .count_aged_executions(scope)
      .await
      .map_err(|e| e.in_scope(scope))?;
    let pages = pagination::pages(total, self.chunk_size);
    info!(
      scope = %scope,
      total,
      pages,
      "{} Found {} executions older than {}",
      scope,
      total,
      self.keep_time
    );

    let cutoff = self.keep_time.cutoff(Utc::now());
    // Executions left in place keep their listing positions, so later pages
    // start after them.
    let mut skipped: u64 = 0;

    for page in 0..pages {
      self.check_interrupt(scope, page)?;

      let fetched = self
        .api
        .fetch_aged_executions(scope, skipped)
        .await
        .map_err(|e| e.in_scope(scope))?;
      if fetched.is_empty() {
        debug!(scope = %scope, page, "Listing exhausted early");
        return Ok(page);
      }

      let range = PageRange::new(page, self.chunk_size, fetched.len());
      let ids: Vec<i64> = fetched
        .iter()
        .filter(|execution| execution.is_deletable(cutoff))
        .map(|execution| execution.id)
        .collect();
      let kept = fetched.len() - ids.len();
      skipped += kept as u64;

      if kept > 0 {
        log_kept(scope, &fetched, cutoff);
      }
      if ids.is_empty() {
        info!(scope = %scope, page, "{} Nothing deletable in [{}, {})", scope, range.start, range.end);
        continue;
      }

      info!(
        scope = %scope,
        page,
        start = range.start,
        end = range.end,
        "{} Deleting executions [{}, {})",
        scope,
        range.start,
        range.end
      );
      let rows = self.delete_page(scope, page, &ids, options, policy).await?;

      summary.executions_deleted += ids.len() as u64;
      summary.workflows_deleted += rows.workflows;
      summary.workflow_steps_deleted += rows.workflow_steps;
    }
    Ok(pages)
  }

  /// Paired deletion of one page, retried as a unit.
  async fn delete_page(
    &self,
    scope: &Scope,
    page: u64,
    ids: &[i64],
    options: &CleanupOptions,
    policy: &RetryPolicy,
  ) -> Result<DeletedRows> {
    let label = format!("{} page {}", scope, page);
    let mut backoff = policy.start();
    // Once the API half has succeeded the execution rows are gone and no
    // longer resolve, so refs from every attempt are kept.
    let mut refs = WorkflowRefs::default();
    let mut api_done = false;

    loop {
      match self
        .delete_pair(ids, &mut refs, &mut api_done, options.unoptimized)
        .await
      {
        Ok(rows) => return Ok(rows),
        Err(err) => backoff
          .wait(err, &label)
          .await
          .map_err(|source| CleanupError::PageFailed {
            scope: scope.clone(),
            page,
            attempts: backoff.attempts(),
            source: Box::new(source),
          })?,
      }
    }
  }

  /// One attempt of the pair. Once the API half has succeeded it is not sent
  /// again: Rundeck may report ids that are already gone as failures.
  async fn delete_pair(
    &self,
    ids: &[i64],
    refs: &mut WorkflowRefs,
    api_done: &mut bool,
    unoptimized: bool,
  ) -> Result<DeletedRows> {
    refs.merge(self.db.resolve_workflows(ids).await?);

    if !*api_done {
      let outcome = self.api.delete_executions(ids).await?;
      if !outcome.all_successful {
        return Err(CleanupError::PartialDelete {
          failed: outcome.failed_count,
          requested: outcome.request_count,
        });
      }
      *api_done = true;
    }

    self.db.delete_workflows(refs, unoptimized).await
  }

  async fn reconcile(
    &self,
    scope: &Scope,
    options: &CleanupOptions,
    policy: &RetryPolicy,
    summary: &mut CleanupSummary,
  ) -> Result<()> {
    let label = format!("{} orphaned workflows", scope);
    let mut backoff = policy.start();

    let rows = loop {
      match self.reconcile_once(options.unoptimized).await {
        Ok(rows) => break rows,
        Err(err) => backoff
          .wait(err, &label)
          .await
          .map_err(|source| CleanupError::ReconcileFailed {
            scope: scope.clone(),
            source: Box::new(source),
          })?,
      }
    };

    if rows.workflows > 0 || rows.workflow_steps > 0 {
      info!(
        scope = %scope,
        workflows = rows.workflows,
        workflow_steps = rows.workflow_steps,
        "{} Deleted {} orphaned workflows and {} workflow steps",
        scope,
        rows.workflows,
        rows.workflow_steps
      );
    } else {
      debug!(scope = %scope, "No orphaned workflows");
    }
    summary.orphan_workflows_deleted += rows.workflows;
    summary.orphan_workflow_steps_deleted += rows.workflow_steps;
    Ok(())
  }

  async fn reconcile_once(&self, unoptimized: bool) -> Result<DeletedRows> {
    let orphans = self.db.find_orphans(unoptimized).await?;
    if orphans.is_empty() {
      return Ok(DeletedRows::default());
    }
    self.db.delete_orphans(&orphans).await
  }

  fn check_interrupt(&self, scope: &Scope, page: u64) -> Result<()> {
    if self.interrupt.abort_requested() {
      warn!(scope = %scope, page, "Cleanup interrupted by operator");
      return Err(CleanupError::Interrupted {
        scope: scope.clone(),
        page,
      });
    }
    Ok(())
  }
}

fn log_kept(scope: &Scope, fetched: &[Execution], cutoff: chrono::DateTime<Utc>) {
  for execution in fetched.iter().filter(|e| !e.is_deletable(cutoff)) {
    if execution.is_running() {
      debug!(scope = %scope, id = execution.id, "Skipping running execution");
    } else {
      debug!(scope = %scope, id = execution.id, "Skipping execution newer than the retention window");
    }
  }
}
