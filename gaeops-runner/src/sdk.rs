use gaeops_core::CloudSdkError;
use semver::Version;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Oldest Cloud SDK release whose `app versions` surface we drive.
pub const MINIMUM_VERSION: &str = "296.0.0";

const VERSION_FILE_NAME: &str = "VERSION";

#[cfg(windows)]
const GCLOUD_EXECUTABLE: &str = "gcloud.cmd";
#[cfg(not(windows))]
const GCLOUD_EXECUTABLE: &str = "gcloud";

/// Checks an SDK installation and reports where its gcloud binary lives.
pub trait SdkValidator {
    fn validate(&self) -> Result<(), CloudSdkError>;

    fn gcloud_path(&self) -> PathBuf;
}

/// A Cloud SDK installation rooted at its home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudSdk {
    home: PathBuf,
}

impl CloudSdk {
    pub fn new<P: AsRef<Path>>(home: P) -> Self {
        Self {
            home: home.as_ref().to_path_buf(),
        }
    }

    /// Finds the SDK by looking up `gcloud` on `PATH`.
    pub fn discover() -> Result<Self, CloudSdkError> {
        let gcloud = which::which("gcloud").map_err(|e| {
            CloudSdkError::NotFound(format!("gcloud was not found on PATH: {}", e))
        })?;
        let gcloud = gcloud.canonicalize().unwrap_or(gcloud);
        Self::from_gcloud_path(&gcloud)
    }

    /// Derives the SDK home from `<home>/bin/gcloud`.
    pub fn from_gcloud_path(gcloud: &Path) -> Result<Self, CloudSdkError> {
        let home = gcloud
            .parent()
            .and_then(Path::parent)
            .ok_or_else(|| {
                CloudSdkError::NotFound(format!(
                    "cannot determine Cloud SDK home from {}",
                    gcloud.display()
                ))
            })?;
        debug!(home = %home.display(), "Discovered Cloud SDK home");
        Ok(Self::new(home))
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Installed version, read from the `VERSION` file at the SDK root.
    pub fn version(&self) -> Result<Version, CloudSdkError> {
        let path = self.home.join(VERSION_FILE_NAME);
        let contents = fs::read_to_string(&path).map_err(|e| {
            CloudSdkError::VersionFile(format!("cannot read {}: {}", path.display(), e))
        })?;
        let raw = contents.trim();
        Version::parse(raw).map_err(|e| {
            CloudSdkError::VersionFile(format!(
                "cannot parse version '{}' from {}: {}",
                raw,
                path.display(),
                e
            ))
        })
    }
}

impl SdkValidator for CloudSdk {
    fn validate(&self) -> Result<(), CloudSdkError> {
        if !self.home.is_dir() {
            return Err(CloudSdkError::NotFound(format!(
                "Cloud SDK home {} is not a directory",
                self.home.display()
            )));
        }

        let gcloud = self.gcloud_path();
        if !gcloud.is_file() {
            return Err(CloudSdkError::NotFound(format!(
                "gcloud binary not found at {}",
                gcloud.display()
            )));
        }

        let installed = self.version()?;
        // MINIMUM_VERSION is a literal, checked by test_minimum_version_is_valid_semver.
        let required = Version::parse(MINIMUM_VERSION)
            .map_err(|e| CloudSdkError::VersionFile(e.to_string()))?;
        if installed < required {
            return Err(CloudSdkError::OutOfDate {
                installed: installed.to_string(),
                required: required.to_string(),
            });
        }

        debug!(version = %installed, "Cloud SDK validated");
        Ok(())
    }

    fn gcloud_path(&self) -> PathBuf {
        self.home.join("bin").join(GCLOUD_EXECUTABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_sdk(version: Option<&str>) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("bin")).unwrap();
        fs::write(dir.path().join("bin").join(GCLOUD_EXECUTABLE), "").unwrap();
        if let Some(version) = version {
            fs::write(dir.path().join(VERSION_FILE_NAME), version).unwrap();
        }
        dir
    }

    #[test]
    fn test_minimum_version_is_valid_semver() {
        assert!(Version::parse(MINIMUM_VERSION).is_ok());
    }

    #[test]
    fn test_gcloud_path_under_bin() {
        let sdk = CloudSdk::new("/opt/google-cloud-sdk");
        assert_eq!(
            sdk.gcloud_path(),
            PathBuf::from("/opt/google-cloud-sdk").join("bin").join(GCLOUD_EXECUTABLE)
        );
    }

    #[test]
    fn test_from_gcloud_path() {
        let sdk = CloudSdk::from_gcloud_path(Path::new("/opt/sdk/bin/gcloud")).unwrap();
        assert_eq!(sdk.home(), Path::new("/opt/sdk"));
    }

    #[test]
    fn test_from_gcloud_path_without_parent() {
        let err = CloudSdk::from_gcloud_path(Path::new("gcloud")).unwrap_err();
        assert!(matches!(err, CloudSdkError::NotFound(_)));
    }

    #[test]
    fn test_validate_current_sdk() {
        let dir = create_test_sdk(Some("300.0.0\n"));
        let sdk = CloudSdk::new(dir.path());
        assert!(sdk.validate().is_ok());
        assert_eq!(sdk.version().unwrap(), Version::new(300, 0, 0));
    }

    #[test]
    fn test_validate_missing_home() {
        let dir = TempDir::new().unwrap();
        let sdk = CloudSdk::new(dir.path().join("missing"));
        assert!(matches!(sdk.validate(), Err(CloudSdkError::NotFound(_))));
    }

    #[test]
    fn test_validate_missing_gcloud() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(VERSION_FILE_NAME), "300.0.0").unwrap();
        let sdk = CloudSdk::new(dir.path());
        assert!(matches!(sdk.validate(), Err(CloudSdkError::NotFound(_))));
    }

    #[test]
    fn test_validate_missing_version_file() {
        let dir = create_test_sdk(None);
        let sdk = CloudSdk::new(dir.path());
        assert!(matches!(sdk.validate(), Err(CloudSdkError::VersionFile(_))));
    }

    #[test]
    fn test_validate_unparsable_version_file() {
        let dir = create_test_sdk(Some("not-a-version"));
        let sdk = CloudSdk::new(dir.path());
        assert!(matches!(sdk.validate(), Err(CloudSdkError::VersionFile(_))));
    }

    #[test]
    fn test_validate_out_of_date() {
        let dir = create_test_sdk(Some("250.0.0"));
        let sdk = CloudSdk::new(dir.path());
        match sdk.validate() {
            Err(CloudSdkError::OutOfDate { installed, required }) => {
                assert_eq!(installed, "250.0.0");
                assert_eq!(required, MINIMUM_VERSION);
            }
            other => panic!("expected OutOfDate, got {:?}", other),
        }
    }
}
