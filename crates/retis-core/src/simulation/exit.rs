use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the file that requests a soft exit when it appears in the execution directory.
pub const EXIT_FILE: &str = "EXIT";

/// Tracks whether the simulation has been asked to stop at the next safe point.
#[derive(Debug, Clone)]
pub struct SoftExit {
    exe_path: PathBuf,
    requested: bool,
}

impl SoftExit {
    pub fn new(exe_path: &Path) -> Self {
        Self {
            exe_path: exe_path.to_path_buf(),
            requested: false,
        }
    }

    pub fn request(&mut self) {
        self.requested = true;
    }

    pub fn exit_file(&self) -> PathBuf {
        self.exe_path.join(EXIT_FILE)
    }

    pub fn is_requested(&self) -> bool {
        if self.requested {
            return true;
        }
        let exit_file = self.exit_file();
        if exit_file.is_file() {
            info!(path = %exit_file.display(), "Found exit file; stopping at the next safe point.");
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn exit_is_not_requested_by_default() {
        let dir = tempdir().unwrap();
        assert!(!SoftExit::new(dir.path()).is_requested());
    }

    #[test]
    fn exit_file_requests_exit() {
        let dir = tempdir().unwrap();
        let exit = SoftExit::new(dir.path());
        std::fs::write(exit.exit_file(), "").unwrap();
        assert!(exit.is_requested());
    }

    #[test]
    fn explicit_request_is_remembered() {
        let dir = tempdir().unwrap();
        let mut exit = SoftExit::new(dir.path());
        exit.request();
        assert!(exit.is_requested());
    }
}
