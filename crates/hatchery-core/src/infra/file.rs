use super::{Endpoint, FILE_SCHEME, InfraError, now_millis};
use crate::{
    Error,
    ids::{Identity, InstanceRef, LogicRef, RegistryRef},
    ledger::{Command, Ledger, LedgerError, Receipt, Transaction},
    log,
    log::Topic,
    logic::LogicCatalog,
    model::{Blueprint, InstanceState, RegistryState},
};
use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind as IoErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

const LOCK_POLL: Duration = Duration::from_millis(10);

///
/// FileEndpoint
///
/// A ledger persisted as a write-ahead journal: one JSON [`Transaction`] per
/// line. Opening replays the journal. Each submit takes `<journal>.lock`,
/// catches up with lines other writers appended, writes the new transaction,
/// then applies it. If the lock cannot be taken within the confirmation
/// window the submit fails as a transient error.
///

pub struct FileEndpoint {
    path: PathBuf,
    confirmation_timeout: Duration,
    ledger: Ledger,
    offset: u64,
    lines: usize,
}

impl FileEndpoint {
    /// Open an endpoint from a `file://` URL.
    pub fn from_url(
        url: &str,
        catalog: LogicCatalog,
        confirmation_timeout: Duration,
    ) -> Result<Self, Error> {
        let path = parse_url(url)?;

        Self::open(path, catalog, confirmation_timeout)
    }

    /// Open (or lazily create) the journal at `path` and replay it.
    pub fn open(
        path: impl Into<PathBuf>,
        catalog: LogicCatalog,
        confirmation_timeout: Duration,
    ) -> Result<Self, Error> {
        let mut endpoint = Self {
            path: path.into(),
            confirmation_timeout,
            ledger: Ledger::new(catalog),
            offset: 0,
            lines: 0,
        };
        endpoint.catch_up()?;

        log!(
            Topic::Ledger,
            Info,
            "opened journal {} at seq {}",
            endpoint.path.display(),
            endpoint.ledger.head()
        );

        Ok(endpoint)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Apply every complete line appended since the last read.
    pub fn catch_up(&mut self) -> Result<(), Error> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == IoErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(InfraError::io(&self.path, err).into()),
        };

        let mut buf = Vec::new();
        file.seek(SeekFrom::Start(self.offset))
            .and_then(|_| file.read_to_end(&mut buf))
            .map_err(|err| InfraError::io(&self.path, err))?;

        // a trailing partial line belongs to a writer that has not finished
        let complete = buf.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);

        for raw in buf[..complete].split_inclusive(|&b| b == b'\n') {
            self.lines += 1;
            let line = std::str::from_utf8(raw).map_err(|err| self.corrupt(err.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }

            let tx: Transaction =
                serde_json::from_str(line).map_err(|err| self.corrupt(err.to_string()))?;
            if let Err(err) = self.ledger.submit(tx) {
                if matches!(err, Error::LedgerError(LedgerError::OutOfOrder { .. })) {
                    return Err(self.corrupt(err.to_string()));
                }
            }
        }
        self.offset += complete as u64;

        Ok(())
    }

    fn append(&mut self, tx: &Transaction) -> Result<(), Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| InfraError::io(parent, err))?;
        }

        let mut line = serde_json::to_string(tx).map_err(|err| self.corrupt(err.to_string()))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| InfraError::io(&self.path, err))?;
        file.write_all(line.as_bytes())
            .and_then(|()| file.sync_data())
            .map_err(|err| InfraError::io(&self.path, err))?;

        self.offset += line.len() as u64;
        self.lines += 1;

        Ok(())
    }

    fn corrupt(&self, reason: String) -> Error {
        InfraError::CorruptJournal {
            path: self.path.clone(),
            line: self.lines,
            reason,
        }
        .into()
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".lock");

        PathBuf::from(name)
    }
}

impl Endpoint for FileEndpoint {
    fn submit(&mut self, caller: Identity, command: Command) -> Result<Receipt, Error> {
        let _lock = JournalLock::acquire(self.lock_path(), self.confirmation_timeout)?;

        self.catch_up()?;
        let tx = self.ledger.transaction(caller, now_millis(), command);
        self.append(&tx)?;

        self.ledger.submit(tx)
    }

    fn blueprint(&self, address: LogicRef) -> Result<Blueprint, Error> {
        self.ledger.blueprint(address).cloned()
    }

    fn registry(&self, address: RegistryRef) -> Result<RegistryState, Error> {
        self.ledger.registry(address).cloned()
    }

    fn instance(&self, address: InstanceRef) -> Result<InstanceState, Error> {
        self.ledger.instance(address).cloned()
    }
}

///
/// JournalLock
///
/// Exclusive advisory lock on `<journal>.lock`. The lock file itself stays on
/// disk; the OS drops the lock when the handle closes, including when the
/// holding process dies mid-submit.
///

struct JournalLock {
    file: File,
}

impl JournalLock {
    fn acquire(path: PathBuf, timeout: Duration) -> Result<Self, Error> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| InfraError::io(parent, err))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|err| InfraError::io(&path, err))?;

        let started = Instant::now();
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => return Ok(Self { file }),
                Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
                    let waited = started.elapsed();
                    if waited >= timeout {
                        log!(
                            Topic::Ledger,
                            Warn,
                            "journal lock {} still held after {}ms",
                            path.display(),
                            waited.as_millis()
                        );

                        return Err(InfraError::ConfirmationTimeout {
                            waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                            path,
                        }
                        .into());
                    }
                    thread::sleep(LOCK_POLL.min(timeout.saturating_sub(waited)));
                }
                Err(err) => return Err(InfraError::io(path, err).into()),
            }
        }
    }
}

impl Drop for JournalLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Journal path named by a `file://` URL.
pub fn parse_url(url: &str) -> Result<PathBuf, InfraError> {
    match url.strip_prefix(FILE_SCHEME) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => Err(InfraError::UnsupportedEndpoint(url.to_string())),
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, ledger::Outcome, model::BlueprintCode, test::p};

    fn deploy(endpoint: &mut FileEndpoint, version: u32) -> LogicRef {
        let receipt = endpoint
            .submit(
                p(1),
                Command::DeployBlueprint {
                    code: BlueprintCode::new("collection", version),
                },
            )
            .expect("deploy");

        match receipt.outcome {
            Outcome::BlueprintDeployed(address) => address,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn only_file_urls_are_served() {
        assert_eq!(
            parse_url("file://.hatchery/local.jsonl").expect("file url"),
            PathBuf::from(".hatchery/local.jsonl")
        );

        for url in ["https://mainnet.example", "file://", "local.jsonl"] {
            let err = parse_url(url).expect_err("unsupported");
            assert_eq!(err.kind(), ErrorKind::Config);
        }
    }

    #[test]
    fn reopening_replays_the_journal() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("ledgers/local.jsonl");

        let mut endpoint =
            FileEndpoint::open(&path, LogicCatalog::builtin(), Duration::from_secs(1))
                .expect("open");
        let first = deploy(&mut endpoint, 1);
        let second = deploy(&mut endpoint, 2);
        let before = endpoint.ledger().snapshot();
        drop(endpoint);

        let reopened = FileEndpoint::open(&path, LogicCatalog::builtin(), Duration::from_secs(1))
            .expect("reopen");

        assert_eq!(reopened.ledger().snapshot(), before);
        assert_eq!(reopened.blueprint(first).expect("first").version, 1);
        assert_eq!(reopened.blueprint(second).expect("second").version, 2);
    }

    #[test]
    fn two_handles_see_each_others_writes() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("shared.jsonl");
        let timeout = Duration::from_secs(1);

        let mut a = FileEndpoint::open(&path, LogicCatalog::builtin(), timeout).expect("open a");
        let mut b = FileEndpoint::open(&path, LogicCatalog::builtin(), timeout).expect("open b");

        deploy(&mut a, 1);
        deploy(&mut b, 1);
        a.catch_up().expect("catch up");

        assert_eq!(a.ledger().head(), 2);
        assert_eq!(a.ledger().snapshot(), b.ledger().snapshot());
    }

    #[test]
    fn held_lock_times_out_as_transient() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("busy.jsonl");

        let mut endpoint =
            FileEndpoint::open(&path, LogicCatalog::builtin(), Duration::from_millis(30))
                .expect("open");
        let held = JournalLock::acquire(endpoint.lock_path(), Duration::ZERO).expect("lock");

        let err = endpoint
            .submit(
                p(1),
                Command::DeployBlueprint {
                    code: BlueprintCode::new("collection", 1),
                },
            )
            .expect_err("lock held");
        assert!(err.is_retryable());
        assert_eq!(endpoint.ledger().head(), 0);

        drop(held);
        deploy(&mut endpoint, 1);
        assert_eq!(endpoint.ledger().head(), 1);
    }

    #[test]
    fn lock_file_left_by_a_dead_writer_does_not_block() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("local.jsonl");

        let mut endpoint =
            FileEndpoint::open(&path, LogicCatalog::builtin(), Duration::from_millis(50))
                .expect("open");
        fs::write(endpoint.lock_path(), "").expect("leave lock file behind");

        deploy(&mut endpoint, 1);
        deploy(&mut endpoint, 2);

        assert_eq!(endpoint.ledger().head(), 2);
        assert!(endpoint.lock_path().exists());
    }

    #[test]
    fn garbage_lines_are_reported_as_corruption() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("bad.jsonl");
        fs::write(&path, "{not json}\n").expect("write");

        let err = FileEndpoint::open(&path, LogicCatalog::builtin(), Duration::from_secs(1))
            .err()
            .expect("corrupt journal");
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn invalid_utf8_is_reported_as_corruption() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("binary.jsonl");
        fs::write(&path, [0xff, 0xfe, b'\n']).expect("write");

        let err = FileEndpoint::open(&path, LogicCatalog::builtin(), Duration::from_secs(1))
            .err()
            .expect("corrupt journal");
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        assert!(!err.is_retryable());
    }
}
