//! Pending-request table.
//!
//! Maps a command identifier to the callers waiting for its reply. There is
//! at most one entry per identifier: a second registration while a reply is
//! outstanding joins the existing entry, and every joined waiter observes the
//! same outcome. An entry is removed at the moment it is resolved or failed,
//! so the next registration starts a fresh one.
//!
//! One mutex guards the whole table. It is never held across an await.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use cobot_frame::{Command, FramingError};
use tokio::sync::oneshot;
use tracing::trace;

use crate::error::{ClientError, Result};

#[derive(Debug, Clone)]
enum Failure {
    Framing(FramingError),
    Disconnected,
}

type Outcome = std::result::Result<Bytes, Failure>;

#[derive(Default)]
struct Table {
    slots: HashMap<u8, Vec<oneshot::Sender<Outcome>>>,
    closed: bool,
}

/// Shared correlation table between callers and the reader loop.
#[derive(Clone, Default)]
pub struct PendingTable {
    inner: Arc<Mutex<Table>>,
}

/// A registered expectation. Await it with [`PendingResponse::wait`].
///
/// Dropping it abandons this caller's interest without disturbing other
/// callers joined to the same entry.
#[derive(Debug)]
pub struct PendingResponse {
    command: Command,
    rx: oneshot::Receiver<Outcome>,
}

impl PendingResponse {
    /// The command this expectation waits on.
    pub fn command(&self) -> Command {
        self.command
    }

    /// Wait for the reader loop to resolve or fail the entry.
    pub async fn wait(self) -> Result<Bytes> {
        match self.rx.await {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(Failure::Framing(source))) => Err(ClientError::Framing {
                command: self.command,
                source,
            }),
            Ok(Err(Failure::Disconnected)) => Err(ClientError::Disconnected(self.command)),
            Err(_) => Err(ClientError::Cancelled(self.command)),
        }
    }
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in the next reply for `command`.
    ///
    /// Joins the outstanding entry if there is one. Once the table has been
    /// closed the returned expectation fails immediately with
    /// [`ClientError::Disconnected`].
    pub fn register(&self, command: Command) -> PendingResponse {
        let (tx, rx) = oneshot::channel();
        let mut table = self.lock();
        if table.closed {
            let _ = tx.send(Err(Failure::Disconnected));
        } else {
            let waiters = table.slots.entry(command.id()).or_default();
            waiters.retain(|waiter| !waiter.is_closed());
            let joined = !waiters.is_empty();
            waiters.push(tx);
            trace!(%command, joined, "expectation registered");
        }
        PendingResponse { command, rx }
    }

    /// Complete the entry for `command` with a payload.
    ///
    /// Returns `false` when nobody is waiting (unsolicited or stale reply).
    pub fn resolve(&self, command: u8, payload: Bytes) -> bool {
        self.complete(command, Ok(payload))
    }

    /// Fail the entry for `command` with a framing error.
    ///
    /// Returns `false` when nobody is waiting.
    pub fn fail(&self, command: u8, error: FramingError) -> bool {
        self.complete(command, Err(Failure::Framing(error)))
    }

    /// Drop the entry for `command`; its waiters observe
    /// [`ClientError::Cancelled`].
    pub fn cancel(&self, command: Command) -> bool {
        let removed = self.lock().slots.remove(&command.id()).is_some();
        if removed {
            trace!(%command, "expectation cancelled");
        }
        removed
    }

    /// Fail every entry with [`ClientError::Disconnected`] and refuse new
    /// registrations. Returns the number of entries failed.
    pub fn fail_all(&self) -> usize {
        let mut table = self.lock();
        table.closed = true;
        let count = table.slots.len();
        for (_, waiters) in table.slots.drain() {
            for waiter in waiters {
                let _ = waiter.send(Err(Failure::Disconnected));
            }
        }
        count
    }

    /// Whether the table has been closed by the reader loop.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Whether a caller is currently waiting on `command`.
    pub fn is_pending(&self, command: Command) -> bool {
        self.lock()
            .slots
            .get(&command.id())
            .is_some_and(|waiters| has_live_waiter(waiters))
    }

    /// Number of command identifiers with at least one live waiter.
    ///
    /// Entries whose callers all gave up (timed out or dropped) are not
    /// counted; they are pruned by the next register or reply.
    pub fn len(&self) -> usize {
        self.lock()
            .slots
            .values()
            .filter(|waiters| has_live_waiter(waiters))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn complete(&self, command: u8, outcome: Outcome) -> bool {
        let mut table = self.lock();
        let Some(waiters) = table.slots.remove(&command) else {
            return false;
        };
        let mut delivered = false;
        for waiter in waiters {
            delivered |= waiter.send(outcome.clone()).is_ok();
        }
        delivered
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        // The table holds no invariants a panicking holder could break.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn has_live_waiter(waiters: &[oneshot::Sender<Outcome>]) -> bool {
    waiters.iter().any(|waiter| !waiter.is_closed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_completes_and_removes_entry() {
        let table = PendingTable::new();
        let response = table.register(Command::GetAngles);
        assert!(table.is_pending(Command::GetAngles));
        assert_eq!(table.len(), 1);

        assert!(table.resolve(0x20, Bytes::from_static(&[1, 2])));
        assert!(table.is_empty());

        let payload = response.wait().await.unwrap();
        assert_eq!(payload.as_ref(), &[1, 2]);
    }

    #[tokio::test]
    async fn second_registration_joins_existing_entry() {
        let table = PendingTable::new();
        let first = table.register(Command::IsPowerOn);
        let second = table.register(Command::IsPowerOn);
        assert_eq!(table.len(), 1);

        assert!(table.resolve(0x12, Bytes::from_static(&[1])));
        assert!(!table.resolve(0x12, Bytes::from_static(&[0])));

        assert_eq!(first.wait().await.unwrap().as_ref(), &[1]);
        assert_eq!(second.wait().await.unwrap().as_ref(), &[1]);
    }

    #[tokio::test]
    async fn resolved_entry_is_not_reused() {
        let table = PendingTable::new();
        let first = table.register(Command::IsMoving);
        table.resolve(0x2B, Bytes::from_static(&[0]));

        let second = table.register(Command::IsMoving);
        table.resolve(0x2B, Bytes::from_static(&[1]));

        assert_eq!(first.wait().await.unwrap().as_ref(), &[0]);
        assert_eq!(second.wait().await.unwrap().as_ref(), &[1]);
    }

    #[test]
    fn resolve_without_entry_is_noop() {
        let table = PendingTable::new();
        assert!(!table.resolve(0x20, Bytes::new()));
        assert!(!table.fail(0x20, FramingError::InvalidFooter { found: 0 }));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn fail_delivers_framing_error() {
        let table = PendingTable::new();
        let response = table.register(Command::GetAngles);
        assert!(table.fail(0x20, FramingError::InvalidFooter { found: 0x11 }));

        let err = response.wait().await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Framing {
                command: Command::GetAngles,
                source: FramingError::InvalidFooter { found: 0x11 },
            }
        ));
    }

    #[tokio::test]
    async fn cancel_wakes_waiters() {
        let table = PendingTable::new();
        let response = table.register(Command::GetCoords);
        assert!(table.cancel(Command::GetCoords));
        assert!(!table.cancel(Command::GetCoords));

        let err = response.wait().await.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled(Command::GetCoords)));
    }

    #[tokio::test]
    async fn fail_all_fails_everything_and_rejects_new_waiters() {
        let table = PendingTable::new();
        let angles = table.register(Command::GetAngles);
        let power = table.register(Command::IsPowerOn);
        assert_eq!(table.fail_all(), 2);
        assert!(table.is_closed());

        assert!(matches!(
            angles.wait().await.unwrap_err(),
            ClientError::Disconnected(Command::GetAngles)
        ));
        assert!(matches!(
            power.wait().await.unwrap_err(),
            ClientError::Disconnected(Command::IsPowerOn)
        ));

        let late = table.register(Command::IsMoving);
        assert!(table.is_empty());
        assert!(matches!(
            late.wait().await.unwrap_err(),
            ClientError::Disconnected(Command::IsMoving)
        ));
    }

    #[tokio::test]
    async fn dropped_waiter_does_not_block_others() {
        let table = PendingTable::new();
        let abandoned = table.register(Command::GetAngles);
        drop(abandoned);
        assert!(!table.is_pending(Command::GetAngles));
        assert_eq!(table.len(), 0);
        assert!(table.is_empty());

        let live = table.register(Command::GetAngles);
        assert_eq!(table.len(), 1);
        table.resolve(0x20, Bytes::from_static(&[9]));
        assert_eq!(live.wait().await.unwrap().as_ref(), &[9]);
    }

    #[test]
    fn reply_for_abandoned_entry_is_not_delivered() {
        let table = PendingTable::new();
        drop(table.register(Command::IsPowerOn));
        drop(table.register(Command::IsPowerOn));

        assert!(!table.resolve(0x12, Bytes::from_static(&[1])));
        assert!(!table.fail(0x12, FramingError::InvalidFooter { found: 0 }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_share_one_entry() {
        let table = PendingTable::new();
        let mut tasks = Vec::new();
        for _ in 0..32 {
            let table = table.clone();
            tasks.push(tokio::spawn(
                async move { table.register(Command::IsMoving) },
            ));
        }
        let mut responses = Vec::new();
        for task in tasks {
            responses.push(task.await.unwrap());
        }
        assert_eq!(table.len(), 1);

        assert!(table.resolve(0x2B, Bytes::from_static(&[1])));
        for response in responses {
            assert_eq!(response.wait().await.unwrap().as_ref(), &[1]);
        }
    }
}
