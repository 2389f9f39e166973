pub mod args;
pub mod handler;
pub mod process;
pub mod runner;
pub mod sdk;
pub mod versions;

pub use handler::{
    CapturedOutput, CapturingProcessHandler, LineListener, OutputStream, ProcessHandler,
    StreamingProcessHandler, TracingLineListener,
};
pub use process::{ProcessSpawner, SpawnRequest, StdProcessSpawner};
pub use runner::{GcloudRunner, GcloudRunnerFactory};
pub use sdk::{CloudSdk, SdkValidator, MINIMUM_VERSION};
pub use versions::Versions;
