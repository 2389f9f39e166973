use crate::args;
use crate::handler::ProcessHandler;
use crate::process::{ProcessSpawner, SpawnRequest, StdProcessSpawner};
use crate::sdk::SdkValidator;
use gaeops_core::{GcloudRunOptions, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const ENV_APP_USE_GSUTIL: &str = "CLOUDSDK_APP_USE_GSUTIL";
pub const ENV_METRICS_ENVIRONMENT: &str = "CLOUDSDK_METRICS_ENVIRONMENT";
pub const ENV_METRICS_ENVIRONMENT_VERSION: &str = "CLOUDSDK_METRICS_ENVIRONMENT_VERSION";
pub const ENV_SHOW_STRUCTURED_LOGS: &str = "CLOUDSDK_CORE_SHOW_STRUCTURED_LOGS";
pub const ENV_NUM_FILE_UPLOAD_PROCESSES: &str = "CLOUDSDK_APP_NUM_FILE_UPLOAD_PROCESSES";
pub const ENV_DISABLE_PROMPTS: &str = "CLOUDSDK_CORE_DISABLE_PROMPTS";

/// Runs gcloud with a fixed set of global options.
pub struct GcloudRunner<V, S, H> {
    sdk: V,
    options: GcloudRunOptions,
    spawner: S,
    handler: H,
}

impl<V, S, H> GcloudRunner<V, S, H>
where
    V: SdkValidator,
    S: ProcessSpawner,
    H: ProcessHandler<S::Process>,
{
    pub fn new(sdk: V, options: GcloudRunOptions, spawner: S, handler: H) -> Self {
        Self {
            sdk,
            options,
            spawner,
            handler,
        }
    }

    pub fn options(&self) -> &GcloudRunOptions {
        &self.options
    }

    /// Launch gcloud with `arguments` and hand the process to the handler.
    ///
    /// With no `working_directory` the child inherits ours.
    pub fn run(&self, arguments: &[String], working_directory: Option<&Path>) -> Result<()> {
        let invocation_id = Uuid::new_v4();

        if let Err(e) = self.sdk.validate() {
            warn!(invocation_id = %invocation_id, error = %e, "Cloud SDK validation failed");
            return Err(e.into());
        }

        let request = SpawnRequest {
            command: self.build_command(arguments),
            working_directory: working_directory.map(Path::to_path_buf),
            env: self.environment(),
        };

        info!(
            invocation_id = %invocation_id,
            command = %request.display_command(),
            "Submitting gcloud command"
        );

        let process = self.spawner.spawn(&request)?;
        self.handler.handle_process(process)?;

        debug!(invocation_id = %invocation_id, "gcloud command completed");
        Ok(())
    }

    /// Full command line: gcloud path, `arguments`, then the global flags.
    pub fn build_command(&self, arguments: &[String]) -> Vec<String> {
        let gcloud = absolute(self.sdk.gcloud_path());

        let mut command = vec![gcloud.to_string_lossy().into_owned()];
        command.extend_from_slice(arguments);
        command.extend(args::string_flag("format", self.options.output_format.as_deref()));
        command.extend(args::string_flag("verbosity", self.options.verbosity.as_deref()));
        command.extend(args::path_flag(
            "credential-file-override",
            self.options.credential_file.as_deref(),
        ));
        for flags_file in &self.options.flags_files {
            command.extend(args::path_flag("flags-file", Some(flags_file)));
        }
        command
    }

    /// Variables layered over the inherited environment of every invocation.
    pub fn environment(&self) -> HashMap<String, String> {
        self.environment_for_os(std::env::consts::OS)
    }

    fn environment_for_os(&self, os: &str) -> HashMap<String, String> {
        let mut env = HashMap::new();
        if self.options.credential_file.is_some() {
            env.insert(ENV_APP_USE_GSUTIL.to_string(), "0".to_string());
        }
        if let Some(metrics_environment) = &self.options.metrics_environment {
            env.insert(ENV_METRICS_ENVIRONMENT.to_string(), metrics_environment.clone());
        }
        if let Some(version) = &self.options.metrics_environment_version {
            env.insert(ENV_METRICS_ENVIRONMENT_VERSION.to_string(), version.clone());
        }
        if let Some(show) = &self.options.show_structured_logs {
            env.insert(ENV_SHOW_STRUCTURED_LOGS.to_string(), show.clone());
        }
        // Parallel uploads drop the IDE-provided credentials on Windows.
        if os == "windows" {
            env.insert(ENV_NUM_FILE_UPLOAD_PROCESSES.to_string(), "1".to_string());
        }
        env.insert(ENV_DISABLE_PROMPTS.to_string(), "1".to_string());
        env
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

/// Builds runners that share one process spawner.
#[derive(Debug, Clone, Default)]
pub struct GcloudRunnerFactory<S = StdProcessSpawner> {
    spawner: S,
}

impl GcloudRunnerFactory<StdProcessSpawner> {
    pub fn new() -> Self {
        Self::with_spawner(StdProcessSpawner::new())
    }
}

impl<S> GcloudRunnerFactory<S> {
    pub fn with_spawner(spawner: S) -> Self {
        Self { spawner }
    }
}

impl<S: ProcessSpawner + Clone> GcloudRunnerFactory<S> {
    pub fn new_runner<V, H>(
        &self,
        sdk: V,
        options: GcloudRunOptions,
        handler: H,
    ) -> GcloudRunner<V, S, H>
    where
        V: SdkValidator,
        H: ProcessHandler<S::Process>,
    {
        GcloudRunner::new(sdk, options, self.spawner.clone(), handler)
    }
}
