//! Project lookup and key checks.
//!
//! # Data Flow
//! ```text
//! [[projects]] config
//!     → ProjectStore::from_config (compile origin policies once)
//!     → RelayState snapshot (swapped on reload)
//!     → authorize(project_id, key) per request
//! ```
//!
//! # Design Decisions
//! - The store is immutable; reloads build a new one
//! - A missing key is distinguished from a wrong one (401 vs 403)

pub mod auth;

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::config::ProjectConfig;
use crate::origin::OriginPolicy;

pub use auth::{public_key, X_SENTRY_AUTH};

/// What the relay knows about one project.
#[derive(Debug, Clone)]
pub struct ProjectState {
    pub project_id: u64,
    pub public_keys: HashSet<String>,
    pub origins: OriginPolicy,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no public key supplied")]
    MissingKey,

    #[error("unknown project {0}")]
    UnknownProject(u64),

    #[error("public key not valid for project {0}")]
    InvalidKey(u64),
}

#[derive(Debug, Clone, Default)]
pub struct ProjectStore {
    projects: HashMap<u64, ProjectState>,
}

impl ProjectStore {
    pub fn from_config(projects: &[ProjectConfig]) -> Self {
        let projects = projects
            .iter()
            .map(|project| {
                let state = ProjectState {
                    project_id: project.project_id,
                    public_keys: project.public_keys.iter().cloned().collect(),
                    origins: OriginPolicy::new(&project.allowed_domains),
                };
                (project.project_id, state)
            })
            .collect();
        Self { projects }
    }

    pub fn get(&self, project_id: u64) -> Option<&ProjectState> {
        self.projects.get(&project_id)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Resolve the project and check that `key` belongs to it.
    pub fn authorize(&self, project_id: u64, key: Option<&str>) -> Result<&ProjectState, AuthError> {
        let key = key.ok_or(AuthError::MissingKey)?;
        let project = self
            .get(project_id)
            .ok_or(AuthError::UnknownProject(project_id))?;
        if project.public_keys.contains(key) {
            Ok(project)
        } else {
            Err(AuthError::InvalidKey(project_id))
        }
    }
}
