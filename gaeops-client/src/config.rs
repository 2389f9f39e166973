use gaeops_core::GcloudRunOptions;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Reads global gcloud options from a TOML file.
///
/// ```toml
/// output_format = "json"
/// verbosity = "info"
/// credential_file = "/secrets/deployer.json"
/// flags_files = ["/etc/gaeops/common.yaml"]
/// ```
pub fn load_run_options(path: &Path) -> anyhow::Result<GcloudRunOptions> {
    let content = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file at {}: {}", path.display(), e))?;
    let options = parse_run_options(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file at {}: {}", path.display(), e))?;
    debug!(path = %path.display(), "Loaded gcloud options from config file");
    Ok(options)
}

pub fn parse_run_options(content: &str) -> Result<GcloudRunOptions, toml::de::Error> {
    toml::from_str(content)
}

/// File options (if any) overlaid with the ones given on the command line.
pub fn resolve_run_options(
    config: Option<&Path>,
    command_line: GcloudRunOptions,
) -> anyhow::Result<GcloudRunOptions> {
    let base = match config {
        Some(path) => load_run_options(path)?,
        None => GcloudRunOptions::default(),
    };
    Ok(base.merge(command_line))
}
