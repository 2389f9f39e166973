use crate::args;
use crate::handler::ProcessHandler;
use crate::process::ProcessSpawner;
use crate::runner::GcloudRunner;
use crate::sdk::SdkValidator;
use gaeops_core::{
    AppEngineError, Result, VersionsListConfiguration, VersionsSelectionConfiguration,
};
use tracing::info;

/// `gcloud app versions` operations.
///
/// Every operation fails with [`AppEngineError::CloudSdk`] when the SDK is
/// missing or too old, before anything is spawned.
pub struct Versions<V, S, H> {
    runner: GcloudRunner<V, S, H>,
}

impl<V, S, H> Versions<V, S, H>
where
    V: SdkValidator,
    S: ProcessSpawner,
    H: ProcessHandler<S::Process>,
{
    pub fn new(runner: GcloudRunner<V, S, H>) -> Self {
        Self { runner }
    }

    /// Starts serving the selected versions.
    pub fn start(&self, configuration: &VersionsSelectionConfiguration) -> Result<()> {
        self.execute(start_arguments(configuration)?)
    }

    /// Stops serving the selected versions.
    pub fn stop(&self, configuration: &VersionsSelectionConfiguration) -> Result<()> {
        self.execute(stop_arguments(configuration)?)
    }

    /// Deletes the selected versions.
    pub fn delete(&self, configuration: &VersionsSelectionConfiguration) -> Result<()> {
        self.execute(delete_arguments(configuration)?)
    }

    /// Lists the versions of one service, or of every service when none is set.
    pub fn list(&self, configuration: &VersionsListConfiguration) -> Result<()> {
        self.execute(list_arguments(configuration))
    }

    fn execute(&self, arguments: Vec<String>) -> Result<()> {
        info!(arguments = ?arguments, "Running app versions command");
        self.runner.run(&arguments, None)
    }
}

fn base_arguments(subcommand: &str) -> Vec<String> {
    vec!["app".to_string(), "versions".to_string(), subcommand.to_string()]
}

fn selection_arguments(
    subcommand: &str,
    configuration: &VersionsSelectionConfiguration,
) -> Result<Vec<String>> {
    if configuration.versions.is_empty() {
        return Err(AppEngineError::InvalidConfiguration(format!(
            "at least one version is required for 'app versions {}'",
            subcommand
        )));
    }

    let mut arguments = base_arguments(subcommand);
    arguments.extend(configuration.versions.iter().cloned());
    arguments.extend(args::string_flag("service", configuration.service.as_deref()));
    arguments.extend(args::string_flag("project", configuration.project_id.as_deref()));
    Ok(arguments)
}

pub fn start_arguments(configuration: &VersionsSelectionConfiguration) -> Result<Vec<String>> {
    selection_arguments("start", configuration)
}

pub fn stop_arguments(configuration: &VersionsSelectionConfiguration) -> Result<Vec<String>> {
    selection_arguments("stop", configuration)
}

pub fn delete_arguments(configuration: &VersionsSelectionConfiguration) -> Result<Vec<String>> {
    selection_arguments("delete", configuration)
}

pub fn list_arguments(configuration: &VersionsListConfiguration) -> Vec<String> {
    let mut arguments = base_arguments("list");
    arguments.extend(args::string_flag("service", configuration.service.as_deref()));
    arguments.extend(args::string_flag("project", configuration.project_id.as_deref()));
    arguments.extend(args::bool_flag("hide-no-traffic", configuration.hide_no_traffic));
    arguments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::test_support::*;
    use crate::runner::GcloudRunnerFactory;
    use gaeops_core::{CloudSdkError, GcloudRunOptions};
    use std::sync::Arc;

    fn create_test_versions(
        sdk: FakeSdk,
    ) -> (
        Versions<FakeSdk, EchoSpawner, Arc<RecordingHandler>>,
        Arc<RecordingHandler>,
    ) {
        let handler = RecordingHandler::shared();
        let runner = GcloudRunnerFactory::with_spawner(EchoSpawner::default()).new_runner(
            sdk,
            GcloudRunOptions::default(),
            Arc::clone(&handler),
        );
        (Versions::new(runner), handler)
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_start_arguments_versions_only() {
        let config = VersionsSelectionConfiguration::new(["v1", "v2"]);
        assert_eq!(
            start_arguments(&config).unwrap(),
            strings(&["app", "versions", "start", "v1", "v2"])
        );
    }

    #[test]
    fn test_selection_arguments_with_flags() {
        let config = VersionsSelectionConfiguration::new(["v1"])
            .with_service("default")
            .with_project_id("my-project");
        let expected_tail = strings(&["v1", "--service", "default", "--project", "my-project"]);

        for (subcommand, arguments) in [
            ("start", start_arguments(&config).unwrap()),
            ("stop", stop_arguments(&config).unwrap()),
            ("delete", delete_arguments(&config).unwrap()),
        ] {
            assert_eq!(arguments[..3], strings(&["app", "versions", subcommand])[..]);
            assert_eq!(arguments[3..], expected_tail[..]);
        }
    }

    #[test]
    fn test_selection_arguments_project_without_service() {
        let config = VersionsSelectionConfiguration::new(["v1"]).with_project_id("my-project");
        assert_eq!(
            stop_arguments(&config).unwrap(),
            strings(&["app", "versions", "stop", "v1", "--project", "my-project"])
        );
    }

    #[test]
    fn test_selection_requires_versions() {
        let config = VersionsSelectionConfiguration::new(Vec::<String>::new());
        assert!(matches!(
            delete_arguments(&config),
            Err(AppEngineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_list_arguments_example() {
        let config = VersionsListConfiguration::new()
            .with_service("default")
            .with_hide_no_traffic(true);
        assert_eq!(
            list_arguments(&config),
            strings(&["app", "versions", "list", "--service", "default", "--hide-no-traffic", "true"])
        );
    }

    #[test]
    fn test_list_arguments_flag_order() {
        let config = VersionsListConfiguration::new()
            .with_service("api")
            .with_project_id("my-project")
            .with_hide_no_traffic(false);
        assert_eq!(
            list_arguments(&config),
            strings(&[
                "app",
                "versions",
                "list",
                "--service",
                "api",
                "--project",
                "my-project",
                "--hide-no-traffic",
                "false",
            ])
        );
    }

    #[test]
    fn test_list_arguments_empty() {
        assert_eq!(
            list_arguments(&VersionsListConfiguration::default()),
            strings(&["app", "versions", "list"])
        );
    }

    #[test]
    fn test_start_runs_gcloud() {
        let (versions, handler) = create_test_versions(FakeSdk::Valid);
        versions
            .start(&VersionsSelectionConfiguration::new(["v1", "v2"]))
            .unwrap();

        let recorded = handler.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(
            recorded[0].command,
            strings(&[TEST_GCLOUD, "app", "versions", "start", "v1", "v2"])
        );
        assert_eq!(recorded[0].working_directory, None);
    }

    #[test]
    fn test_empty_selection_spawns_nothing() {
        let (versions, handler) = create_test_versions(FakeSdk::Valid);
        let config = VersionsSelectionConfiguration::new(Vec::<String>::new());

        assert!(versions.start(&config).is_err());
        assert!(versions.stop(&config).is_err());
        assert!(versions.delete(&config).is_err());
        assert!(handler.recorded().is_empty());
    }

    #[test]
    fn test_validation_precedes_sdk_check() {
        let (versions, _) = create_test_versions(FakeSdk::NotFound);
        let err = versions
            .stop(&VersionsSelectionConfiguration::new(Vec::<String>::new()))
            .unwrap_err();
        assert!(matches!(err, AppEngineError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_list_reports_missing_sdk() {
        let (versions, handler) = create_test_versions(FakeSdk::NotFound);
        let err = versions.list(&VersionsListConfiguration::new()).unwrap_err();
        assert!(matches!(err, AppEngineError::CloudSdk(CloudSdkError::NotFound(_))));
        assert!(handler.recorded().is_empty());
    }

    #[test]
    fn test_delete_and_list_run_in_sequence() {
        let (versions, handler) = create_test_versions(FakeSdk::Valid);
        versions
            .delete(&VersionsSelectionConfiguration::new(["old"]).with_service("worker"))
            .unwrap();
        versions
            .list(&VersionsListConfiguration::new().with_service("worker"))
            .unwrap();

        let recorded = handler.recorded();
        assert_eq!(
            recorded[0].command,
            strings(&[TEST_GCLOUD, "app", "versions", "delete", "old", "--service", "worker"])
        );
        assert_eq!(
            recorded[1].command,
            strings(&[TEST_GCLOUD, "app", "versions", "list", "--service", "worker"])
        );
    }
}
