//! Registry of live child processes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use serde::Serialize;
use tracing::debug;

use super::info::{serialize_unix_seconds, ProcessInfo, ProcessStatus};

/// Proof of a single registration.
///
/// The generation distinguishes two processes that were given the same
/// PID by the OS, so unregistering through a stale ticket never removes
/// the newer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessTicket {
    pid: u32,
    generation: u64,
}

impl ProcessTicket {
    /// PID this ticket was issued for.
    pub fn pid(&self) -> u32 {
        self.pid
    }
}

/// Point-in-time overview of the registry.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// Number of live processes.
    pub active_processes: usize,
    /// Snapshot of every live process.
    pub processes: Vec<ProcessInfo>,
    /// When the snapshot was taken.
    #[serde(serialize_with = "serialize_unix_seconds")]
    pub timestamp: SystemTime,
}

#[derive(Debug)]
struct Entry {
    info: ProcessInfo,
    generation: u64,
}

/// Thread-safe mapping from PID to live process metadata.
///
/// Only running processes are ever stored; an entry is marked completed
/// and removed in the same critical section.
pub struct ProcessRegistry {
    entries: RwLock<HashMap<u32, Entry>>,
    next_generation: AtomicU64,
}

impl ProcessRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<u32, Entry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<u32, Entry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a freshly spawned process as running.
    pub fn register(&self, pid: u32, command: &str) -> ProcessTicket {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let entry = Entry {
            info: ProcessInfo::new(pid, command),
            generation,
        };

        if let Some(stale) = self.write().insert(pid, entry) {
            debug!(pid, stale_command = %stale.info.command, "replaced stale registry entry");
        }
        debug!(pid, command, "registered process");

        ProcessTicket { pid, generation }
    }

    /// Mark the ticket's process completed and remove it.
    ///
    /// Returns the final record, or `None` if the entry was already removed
    /// or now belongs to a newer process with the same PID.
    pub fn unregister(&self, ticket: &ProcessTicket) -> Option<ProcessInfo> {
        let mut entries = self.write();
        if entries.get(&ticket.pid)?.generation != ticket.generation {
            return None;
        }
        let mut entry = entries.remove(&ticket.pid)?;
        drop(entries);

        entry.info.status = ProcessStatus::Completed;
        debug!(pid = ticket.pid, "unregistered process");
        Some(entry.info)
    }

    /// Get the current ticket for a registered PID.
    pub fn ticket(&self, pid: u32) -> Option<ProcessTicket> {
        self.read().get(&pid).map(|entry| ProcessTicket {
            pid,
            generation: entry.generation,
        })
    }

    /// Get a copy of the record for `pid`.
    pub fn get(&self, pid: u32) -> Option<ProcessInfo> {
        self.read().get(&pid).map(|entry| entry.info.clone())
    }

    /// Snapshot every live process, oldest first.
    pub fn list(&self) -> Vec<ProcessInfo> {
        let mut processes: Vec<ProcessInfo> =
            self.read().values().map(|entry| entry.info.clone()).collect();
        processes.sort_by_key(|info| info.start_time);
        processes
    }

    /// Snapshot the tickets of every live process.
    pub fn tickets(&self) -> Vec<ProcessTicket> {
        self.read()
            .iter()
            .map(|(&pid, entry)| ProcessTicket {
                pid,
                generation: entry.generation,
            })
            .collect()
    }

    /// Build a dashboard snapshot.
    pub fn dashboard(&self) -> Dashboard {
        let processes = self.list();
        Dashboard {
            active_processes: processes.len(),
            processes,
            timestamp: SystemTime::now(),
        }
    }

    /// Number of live processes.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check whether no process is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let registry = ProcessRegistry::new();
        let ticket = registry.register(100, "sleep 10");

        assert_eq!(ticket.pid(), 100);
        let info = registry.get(100).unwrap();
        assert_eq!(info.command, "sleep 10");
        assert_eq!(info.status, ProcessStatus::Running);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let registry = ProcessRegistry::new();
        assert!(registry.get(999_999).is_none());
        assert!(registry.ticket(999_999).is_none());
    }

    #[test]
    fn test_unregister_marks_completed_and_removes() {
        let registry = ProcessRegistry::new();
        let ticket = registry.register(100, "echo hi");

        let info = registry.unregister(&ticket).unwrap();
        assert_eq!(info.status, ProcessStatus::Completed);
        assert!(registry.get(100).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_twice_is_noop() {
        let registry = ProcessRegistry::new();
        let ticket = registry.register(100, "echo hi");

        assert!(registry.unregister(&ticket).is_some());
        assert!(registry.unregister(&ticket).is_none());
    }

    #[test]
    fn test_stale_ticket_does_not_remove_reused_pid() {
        let registry = ProcessRegistry::new();
        let old = registry.register(100, "first");
        let new = registry.register(100, "second");

        assert!(registry.unregister(&old).is_none());
        assert_eq!(registry.get(100).unwrap().command, "second");

        assert!(registry.unregister(&new).is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_is_a_copy() {
        let registry = ProcessRegistry::new();
        registry.register(1, "a");
        registry.register(2, "b");

        let mut snapshot = registry.list();
        assert_eq!(snapshot.len(), 2);
        snapshot[0].command.push_str("-mutated");
        snapshot.clear();

        assert_eq!(registry.len(), 2);
        assert!(registry.list().iter().all(|p| !p.command.ends_with("-mutated")));
    }

    #[test]
    fn test_never_lists_completed() {
        let registry = ProcessRegistry::new();
        let a = registry.register(1, "a");
        registry.register(2, "b");
        registry.unregister(&a);

        assert!(registry
            .list()
            .iter()
            .all(|p| p.status == ProcessStatus::Running));
    }

    #[test]
    fn test_dashboard() {
        let registry = ProcessRegistry::new();
        registry.register(1, "a");
        registry.register(2, "b");

        let dashboard = registry.dashboard();
        assert_eq!(dashboard.active_processes, 2);
        assert_eq!(dashboard.processes.len(), 2);

        let json = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(json["active_processes"], 2);
        assert!(json["timestamp"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_tickets_snapshot() {
        let registry = ProcessRegistry::new();
        let a = registry.register(1, "a");
        let b = registry.register(2, "b");

        let tickets = registry.tickets();
        assert_eq!(tickets.len(), 2);
        assert!(tickets.contains(&a));
        assert!(tickets.contains(&b));
    }

    #[test]
    fn test_concurrent_register_unregister() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(ProcessRegistry::new());
        let mut handles = vec![];

        for pid in 0..100u32 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                let ticket = registry.register(pid, "work");
                if pid % 2 == 0 {
                    registry.unregister(&ticket);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 50);
    }
}
