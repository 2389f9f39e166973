// Process spawning for gcloud invocations.
// The runner only talks to the `ProcessSpawner` trait, so tests can swap in a fake.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

/// Everything needed to launch one gcloud process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Binary path followed by its arguments.
    pub command: Vec<String>,
    /// `None` inherits the current working directory.
    pub working_directory: Option<PathBuf>,
    /// Variables layered over the inherited environment.
    pub env: HashMap<String, String>,
}

impl SpawnRequest {
    pub fn display_command(&self) -> String {
        self.command.join(" ")
    }
}

pub trait ProcessSpawner {
    type Process;

    fn spawn(&self, request: &SpawnRequest) -> io::Result<Self::Process>;
}

/// Spawns real OS processes with piped stdout and stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdProcessSpawner;

impl StdProcessSpawner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessSpawner for StdProcessSpawner {
    type Process = Child;

    fn spawn(&self, request: &SpawnRequest) -> io::Result<Child> {
        let (program, args) = request
            .command
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

        let mut command = Command::new(program);
        command
            .args(args)
            .envs(&request.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &request.working_directory {
            command.current_dir(dir);
        }
        command.spawn()
    }
}
