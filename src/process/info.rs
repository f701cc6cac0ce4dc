//! Live process records.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};

/// Lifecycle status of a tracked process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    /// The process has been spawned and not yet reaped.
    #[default]
    Running,
    /// The process exited, was terminated, or was cleaned up.
    Completed,
}

impl ProcessStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessStatus::Completed)
    }
}

/// Metadata for a spawned child process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessInfo {
    /// OS process identifier.
    pub pid: u32,
    /// Command line the process was started with.
    pub command: String,
    /// Wall-clock spawn time.
    #[serde(serialize_with = "serialize_unix_seconds")]
    pub start_time: SystemTime,
    /// Current status.
    pub status: ProcessStatus,
}

impl ProcessInfo {
    /// Create a running record started now.
    pub fn new(pid: u32, command: impl Into<String>) -> Self {
        Self {
            pid,
            command: command.into(),
            start_time: SystemTime::now(),
            status: ProcessStatus::Running,
        }
    }

    /// Seconds since the process was started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .elapsed()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// Convert a wall-clock time to fractional Unix seconds.
pub fn unix_seconds(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

pub(crate) fn serialize_unix_seconds<S: Serializer>(
    time: &SystemTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(unix_seconds(*time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_is_running() {
        let info = ProcessInfo::new(100, "nmap -sV host");
        assert_eq!(info.pid, 100);
        assert_eq!(info.command, "nmap -sV host");
        assert_eq!(info.status, ProcessStatus::Running);
        assert!(!info.status.is_terminal());
    }

    #[test]
    fn test_unix_seconds() {
        let t = UNIX_EPOCH + Duration::from_millis(1_500);
        assert_eq!(unix_seconds(t), 1.5);
    }

    #[test]
    fn test_serialization() {
        let mut info = ProcessInfo::new(7, "sleep 1");
        info.start_time = UNIX_EPOCH + Duration::from_secs(10);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["pid"], 7);
        assert_eq!(json["command"], "sleep 1");
        assert_eq!(json["start_time"], 10.0);
        assert_eq!(json["status"], "running");
    }
}
