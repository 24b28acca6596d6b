use std::{fs::OpenOptions, io::Write, path::Path};

use tracing::warn;

use crate::trace::trace::SessionEvent;

/// Appends session events to a JSONL file.
///
/// Logging never fails the caller: an unopenable file disables the log, a
/// failed write is reported and dropped.
pub struct EventLogger {
    file: Option<std::fs::File>,
}

impl EventLogger {
    pub fn new(path: &Path) -> Self {
        let file = OpenOptions::new().create(true).append(true).open(path);

        match file {
            Ok(f) => Self { file: Some(f) },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not open event log");
                Self { file: None }
            }
        }
    }

    /// A logger that records nothing.
    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    pub fn log(&mut self, event: &SessionEvent) {
        let Some(file) = self.file.as_mut() else {
            return;
        };

        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                warn!(error = %e, "failed to serialize session event");
                return;
            }
        };

        if let Err(e) = writeln!(file, "{}", json) {
            warn!(error = %e, "failed to write session event");
        }
    }
}
