use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Selects one or more versions for `start`, `stop` or `delete`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionsSelectionConfiguration {
    pub versions: Vec<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl VersionsSelectionConfiguration {
    pub fn new<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            versions: versions.into_iter().map(Into::into).collect(),
            service: None,
            project_id: None,
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }
}

/// Parameters for `app versions list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionsListConfiguration {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub hide_no_traffic: Option<bool>,
}

impl VersionsListConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_hide_no_traffic(mut self, hide: bool) -> Self {
        self.hide_no_traffic = Some(hide);
        self
    }
}

/// Settings applied to every gcloud invocation made by a runner.
///
/// Every field is optional; an unset field adds nothing to the command line
/// or the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GcloudRunOptions {
    pub metrics_environment: Option<String>,
    pub metrics_environment_version: Option<String>,
    pub credential_file: Option<PathBuf>,
    pub flags_files: Vec<PathBuf>,
    pub output_format: Option<String>,
    pub show_structured_logs: Option<String>,
    pub verbosity: Option<String>,
}

impl GcloudRunOptions {
    /// Overlays `other` on top of `self`: fields set in `other` win, flags
    /// files are replaced only when `other` lists some.
    pub fn merge(mut self, other: GcloudRunOptions) -> Self {
        if other.metrics_environment.is_some() {
            self.metrics_environment = other.metrics_environment;
        }
        if other.metrics_environment_version.is_some() {
            self.metrics_environment_version = other.metrics_environment_version;
        }
        if other.credential_file.is_some() {
            self.credential_file = other.credential_file;
        }
        if !other.flags_files.is_empty() {
            self.flags_files = other.flags_files;
        }
        if other.output_format.is_some() {
            self.output_format = other.output_format;
        }
        if other.show_structured_logs.is_some() {
            self.show_structured_logs = other.show_structured_logs;
        }
        if other.verbosity.is_some() {
            self.verbosity = other.verbosity;
        }
        self
    }
}
