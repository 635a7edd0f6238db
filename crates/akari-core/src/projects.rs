use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::social::normalize_handle;
use crate::ConfigError;

/// A tracked project as declared in `config/projects.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    /// X handle of the project's official account. Optional: the engine can
    /// discover it once when absent.
    #[serde(default)]
    pub x_handle: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl ProjectConfig {
    /// Generate a URL-safe slug from the project name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else if c == ' ' {
                    '-'
                } else {
                    '\0'
                }
            })
            .filter(|&c| c != '\0')
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// The configured handle in normalized form, or `None` when blank.
    #[must_use]
    pub fn normalized_handle(&self) -> Option<String> {
        self.x_handle
            .as_deref()
            .map(normalize_handle)
            .filter(|h| !h.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct ProjectsFile {
    pub projects: Vec<ProjectConfig>,
}

/// Load and validate the project directory from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_projects(path: &Path) -> Result<ProjectsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProjectsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: ProjectsFile = serde_yaml::from_str(&content)?;
    validate_projects(&file)?;
    Ok(file)
}

fn validate_projects(file: &ProjectsFile) -> Result<(), ConfigError> {
    let mut seen_slugs = HashSet::new();
    let mut seen_handles = HashSet::new();

    for project in &file.projects {
        if project.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "project name must be non-empty".to_string(),
            ));
        }

        let slug = project.slug();
        if slug.is_empty() {
            return Err(ConfigError::Validation(format!(
                "project '{}' produces an empty slug",
                project.name
            )));
        }
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate project slug: '{}' (from project '{}')",
                slug, project.name
            )));
        }

        if let Some(handle) = project.normalized_handle() {
            if !seen_handles.insert(handle.clone()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate project handle: '@{handle}'"
                )));
            }
        }
    }

    Ok(())
}
