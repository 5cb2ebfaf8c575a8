use crate::error::StatusError;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Returns true when the leading arguments of `candidate` equal `expected`.
pub fn matches<S: AsRef<str>>(expected: &[&str], candidate: &[S]) -> bool {
    candidate.len() >= expected.len()
        && expected
            .iter()
            .zip(candidate)
            .all(|(e, c)| *e == c.as_ref())
}

/// Command lines of the processes running when the table was loaded.
#[derive(Clone, Debug, Default)]
pub struct ProcessTable {
    cmdlines: Vec<Vec<String>>,
}

impl ProcessTable {
    pub fn from_cmdlines(cmdlines: Vec<Vec<String>>) -> Self {
        Self { cmdlines }
    }

    /// Reads the argument vectors of all processes from `/proc`.
    pub fn load() -> Result<Self, StatusError> {
        Self::load_from(Path::new("/proc"))
    }

    fn load_from(proc_root: &Path) -> Result<Self, StatusError> {
        let entries = fs::read_dir(proc_root).map_err(StatusError::ProcessInspection)?;
        let mut cmdlines = Vec::new();

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(pid) = name.to_str().filter(|n| n.bytes().all(|b| b.is_ascii_digit())) else {
                continue;
            };
            // The process may have exited since the directory was listed.
            let raw = match fs::read(entry.path().join("cmdline")) {
                Ok(raw) => raw,
                Err(e) => {
                    debug!("Error getting CLI arguments of process {}: {}", pid, e);
                    continue;
                }
            };
            // Kernel threads have no arguments.
            if raw.is_empty() {
                continue;
            }
            // Each argument ends with a NUL; empty arguments keep their position.
            let args: Vec<String> = raw
                .strip_suffix(&[0])
                .unwrap_or(&raw)
                .split(|b| *b == 0)
                .map(|arg| String::from_utf8_lossy(arg).into_owned())
                .collect();
            cmdlines.push(args);
        }

        Ok(Self::from_cmdlines(cmdlines))
    }

    pub fn contains(&self, expected: &[&str]) -> bool {
        self.cmdlines.iter().any(|cmd| matches(expected, cmd))
    }
}
