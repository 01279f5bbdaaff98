// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project/Fork Registry (§4.4): the durable table of projects and their
//! fork lineage, grounded on the teacher's `storage::state` +
//! `listener::mutations` pair — guard the canonical rows behind a
//! `parking_lot::Mutex`, snapshot what's needed, release the lock, then do
//! I/O (provider calls, store writes), and emit a `core::Event` on every
//! change the same way `emit(&ctx.event_bus, Event::…)` does in the
//! teacher's mutation handlers.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod store;

use parking_lot::Mutex;
use scp_core::{emit, now_ms, Event, EventBus, Project, ProjectId, ProjectStatus, UserId};
use scp_provider::{ProviderError, ProviderState, SandboxProvider};
use std::collections::HashMap;
use std::sync::Arc;
use store::{Store, StoreError, StoreSnapshot};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("project {0} not found")]
    NotFound(ProjectId),
    #[error("project {0} has no sandbox to operate on")]
    NoSandbox(ProjectId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

pub struct Registry {
    store: Arc<dyn Store>,
    provider: Arc<dyn SandboxProvider>,
    events: EventBus,
    projects: Arc<Mutex<HashMap<ProjectId, Project>>>,
}

impl Registry {
    pub fn new(
        store: Arc<dyn Store>,
        provider: Arc<dyn SandboxProvider>,
        events: EventBus,
    ) -> Result<Self, RegistryError> {
        let snapshot = store.load()?;
        let projects = snapshot.projects.into_iter().map(|p| (p.id, p)).collect();
        Ok(Self { store, provider, events, projects: Arc::new(Mutex::new(projects)) })
    }

    fn snapshot_and_persist(&self) -> Result<(), RegistryError> {
        let projects: Vec<Project> = self.projects.lock().values().cloned().collect();
        let mut snapshot = self.store.load().unwrap_or_default();
        snapshot.projects = projects;
        self.store.save(&snapshot)?;
        Ok(())
    }

    pub fn get(&self, project_id: ProjectId) -> Option<Project> {
        self.projects.lock().get(&project_id).cloned()
    }

    /// The provider backing this registry, for callers (the Client Gateway)
    /// that need provider-level operations outside the project lifecycle
    /// (port previews, VS Code URLs, SSH access).
    pub fn provider(&self) -> Arc<dyn SandboxProvider> {
        Arc::clone(&self.provider)
    }

    /// Every project currently known to the registry, for the operator
    /// admin socket's `list_projects` query.
    pub fn list(&self) -> Vec<Project> {
        self.projects.lock().values().cloned().collect()
    }

    /// Create a new, as-yet-unprovisioned project row.
    pub fn create(
        &self,
        user_id: UserId,
        name: impl Into<String>,
        agent_type: impl Into<String>,
        git_repo: Option<String>,
    ) -> Result<Project, RegistryError> {
        let now = now_ms();
        let project = Project {
            id: ProjectId::new(),
            user_id,
            name: name.into(),
            sandbox_id: None,
            status: ProjectStatus::Creating,
            status_error: None,
            agent_type: agent_type.into(),
            git_repo,
            forked_from_id: None,
            branch_name: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        self.projects.lock().insert(project.id, project.clone());
        self.snapshot_and_persist()?;
        emit(&self.events, Event::ProjectCreated { project: project.clone() });
        Ok(project)
    }

    /// Provision (or reconnect) the sandbox backing a project. Leaves the
    /// project in `Creating` until the caller separately reconciles status —
    /// reconciliation alone never exits `Creating`.
    pub async fn start_or_provision_sandbox(
        &self,
        project_id: ProjectId,
        snapshot_name: &str,
    ) -> Result<Project, RegistryError> {
        let project = self.get(project_id).ok_or(RegistryError::NotFound(project_id))?;

        let sandbox_id = match project.sandbox_id {
            Some(id) => {
                self.provider.reconnect_sandbox(id, &project.name).await?;
                id
            }
            None => {
                self.provider
                    .create_sandbox(snapshot_name, &project.name, project.git_repo.as_deref())
                    .await?
            }
        };

        let updated = self.update(project_id, |p| {
            p.sandbox_id = Some(sandbox_id);
            p.status = ProjectStatus::Starting;
        })?;
        Ok(updated)
    }

    /// Poll the provider and mirror its state onto the project row, per the
    /// fixed §4.1 mapping table. Never moves a project out of `Creating` —
    /// that transition only happens via [`Registry::start_or_provision_sandbox`].
    pub async fn reconcile_sandbox_status(&self, project_id: ProjectId) -> Result<Project, RegistryError> {
        let project = self.get(project_id).ok_or(RegistryError::NotFound(project_id))?;
        if project.status == ProjectStatus::Creating {
            return Ok(project);
        }
        let sandbox_id = project.sandbox_id.ok_or(RegistryError::NoSandbox(project_id))?;

        let state = self.provider.get_sandbox_state(sandbox_id).await?;
        let status = state.to_project_status();

        self.update(project_id, |p| {
            p.status = status;
            p.status_error = None;
        })
    }

    pub fn mark_error(&self, project_id: ProjectId, message: impl Into<String>) -> Result<Project, RegistryError> {
        let message = message.into();
        self.update(project_id, move |p| {
            p.status = ProjectStatus::Error;
            p.status_error = Some(message.clone());
        })
    }

    fn update(
        &self,
        project_id: ProjectId,
        f: impl FnOnce(&mut Project),
    ) -> Result<Project, RegistryError> {
        let updated = {
            let mut guard = self.projects.lock();
            let project = guard.get_mut(&project_id).ok_or(RegistryError::NotFound(project_id))?;
            f(project);
            project.updated_at = now_ms();
            project.clone()
        };
        self.snapshot_and_persist()?;
        emit(&self.events, Event::ProjectUpdated { project: updated.clone() });
        Ok(updated)
    }

    /// Fork `src_id`'s sandbox onto a new branch. Fork chains always
    /// collapse: the new project's `forked_from_id` is the family root, not
    /// `src_id`, so the family never grows more than one level deep.
    pub async fn fork_project(
        &self,
        src_id: ProjectId,
        branch: impl Into<String>,
    ) -> Result<Project, RegistryError> {
        let branch = branch.into();
        let src = self.get(src_id).ok_or(RegistryError::NotFound(src_id))?;
        let src_sandbox = src.sandbox_id.ok_or(RegistryError::NoSandbox(src_id))?;
        let root_id = src.slug_source_id();

        let new_sandbox = self.provider.fork_sandbox(src_sandbox, &branch, &src.name).await?;

        let now = now_ms();
        let forked = Project {
            id: ProjectId::new(),
            user_id: src.user_id,
            name: src.name.clone(),
            sandbox_id: Some(new_sandbox),
            status: ProjectStatus::Starting,
            status_error: None,
            agent_type: src.agent_type.clone(),
            git_repo: src.git_repo.clone(),
            forked_from_id: Some(root_id),
            branch_name: Some(branch),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        self.projects.lock().insert(forked.id, forked.clone());
        self.snapshot_and_persist()?;
        emit(&self.events, Event::ProjectCreated { project: forked.clone() });
        Ok(forked)
    }

    /// Every project sharing `project_id`'s fork root, including
    /// tombstones, ordered by creation time (root first).
    pub fn find_fork_family(&self, project_id: ProjectId) -> Vec<Project> {
        let guard = self.projects.lock();
        let Some(anchor) = guard.get(&project_id) else { return Vec::new() };
        let root_id = anchor.slug_source_id();

        let mut family: Vec<Project> = guard
            .values()
            .filter(|p| p.id == root_id || p.forked_from_id == Some(root_id))
            .cloned()
            .collect();
        family.sort_by_key(|p| p.created_at);
        family
    }

    /// Remove a project. Captures the fork family's sandbox ids before
    /// attempting deletion; if the provider refuses because dependents
    /// still exist, stops the sandbox and tombstones the row instead of
    /// deleting it outright, then sweeps the family for any member whose
    /// sandbox can now be fully deleted.
    pub async fn remove(&self, project_id: ProjectId) -> Result<(), RegistryError> {
        let project = self.get(project_id).ok_or(RegistryError::NotFound(project_id))?;
        let family_before = self.find_fork_family(project_id);

        let Some(sandbox_id) = project.sandbox_id else {
            self.projects.lock().remove(&project_id);
            self.snapshot_and_persist()?;
            emit(&self.events, Event::ProjectDeleted { project_id });
            return Ok(());
        };

        match self.provider.delete_sandbox(sandbox_id).await {
            Ok(()) => {
                self.projects.lock().remove(&project_id);
                self.snapshot_and_persist()?;
                emit(&self.events, Event::ProjectDeleted { project_id });
                self.sweep_orphans(&family_before).await?;
            }
            Err(ProviderError::HasDependents) => {
                self.provider.stop_sandbox(sandbox_id).await?;
                self.update(project_id, |p| p.deleted_at = Some(now_ms()))?;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// After a successful delete, check whether any tombstoned family member
    /// that was only being kept alive for dependents can now be deleted too.
    /// Only attempts a delete when the current, live registry state shows no
    /// remaining non-tombstoned project pointing at that sandbox — `family`
    /// is a snapshot taken before this round's removal, so a member that
    /// still has live siblings sharing its sandbox is left untouched rather
    /// than issuing a delete the provider would just refuse.
    async fn sweep_orphans(&self, family: &[Project]) -> Result<(), RegistryError> {
        for member in family {
            if !member.is_tombstone() {
                continue;
            }
            let Some(sandbox_id) = member.sandbox_id else { continue };

            let still_referenced = self
                .projects
                .lock()
                .values()
                .any(|p| !p.is_tombstone() && p.sandbox_id == Some(sandbox_id));
            if still_referenced {
                continue;
            }

            if self.provider.delete_sandbox(sandbox_id).await.is_ok() {
                self.projects.lock().remove(&member.id);
                self.snapshot_and_persist()?;
                emit(&self.events, Event::ProjectDeleted { project_id: member.id });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
