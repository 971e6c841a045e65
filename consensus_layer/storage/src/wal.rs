use std::{
    fs::{self, File, OpenOptions},
    io::{BufReader, Read, Write},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use log::{info, warn};

use crate::WalError;

const LOG_TARGET: &str = "chained_hotstuff::wal";
const SEGMENT_FILE_NAME: &str = "wal.log";
const CHECKPOINT_FILE_NAME: &str = "checkpoint";

/// Tags a WAL record with the kind of SMR-affecting input it captures, so replay can re-dispatch
/// it through the same code path that handled it live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WalCategory {
    Proposal = 0,
    Vote = 1,
    Timeout = 2,
    Committed = 3,
}

impl WalCategory {
    fn from_u8(value: u8) -> Result<Self, WalError> {
        match value {
            0 => Ok(Self::Proposal),
            1 => Ok(Self::Vote),
            2 => Ok(Self::Timeout),
            3 => Ok(Self::Committed),
            other => Err(WalError::UnknownCategory(other)),
        }
    }
}

/// One decoded WAL entry, in on-disk field order: `(length, crc, monotonic_index,
/// timestamp_millis, category, payload)` per spec §6, minus the length prefix once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalRecord {
    pub index: u64,
    pub timestamp_millis: u64,
    pub category: WalCategory,
    pub payload: Vec<u8>,
}

/// Append-only durable log of every message that affects SMR state (C10). A single active
/// segment file is used; spec §6 allows multiple segments with truncation below the commit
/// checkpoint, which this implementation keeps simple by compacting the whole segment in place
/// rather than rotating to new files.
pub struct Wal {
    dir: PathBuf,
    file: File,
    next_index: u64,
}

impl Wal {
    /// Opens (creating if absent) the WAL directory and its active segment, positioning
    /// `next_index` just past whatever was last written.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, WalError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| WalError::OpenSegment {
            path: dir.display().to_string(),
            source,
        })?;

        let segment_path = dir.join(SEGMENT_FILE_NAME);
        let existing = Self::read_all_records(&segment_path)?;
        let next_index = existing.last().map(|r| r.index + 1).unwrap_or(0);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&segment_path)
            .map_err(|source| WalError::OpenSegment {
                path: segment_path.display().to_string(),
                source,
            })?;

        info!(target: LOG_TARGET, "opened WAL at {} ({} existing records)", dir.display(), next_index);
        Ok(Self { dir, file, next_index })
    }

    /// Appends one record and fsyncs before returning, per spec §5 "WAL writes must complete
    /// before the message is applied". Returns the record's monotonic index.
    pub fn append(&mut self, category: WalCategory, payload: &[u8]) -> Result<u64, WalError> {
        let index = self.next_index;
        let timestamp_millis = now_millis();

        let mut body = Vec::with_capacity(17 + payload.len());
        body.extend_from_slice(&index.to_le_bytes());
        body.extend_from_slice(&timestamp_millis.to_le_bytes());
        body.push(category as u8);
        body.extend_from_slice(payload);

        let crc = crc32fast::hash(&body);
        let length = body.len() as u64;

        let mut record = Vec::with_capacity(12 + body.len());
        record.extend_from_slice(&length.to_le_bytes());
        record.extend_from_slice(&crc.to_le_bytes());
        record.extend_from_slice(&body);

        self.file.write_all(&record).map_err(|source| WalError::Append { source })?;
        self.file.sync_data().map_err(|source| WalError::Fsync { source })?;

        self.next_index = index + 1;
        Ok(index)
    }

    /// Reads every record at or above `start_index`, in order, for crash replay.
    pub fn replay_from(&self, start_index: u64) -> Result<Vec<WalRecord>, WalError> {
        let segment_path = self.dir.join(SEGMENT_FILE_NAME);
        let records = Self::read_all_records(&segment_path)?;
        Ok(records.into_iter().filter(|r| r.index >= start_index).collect())
    }

    /// Persists `last_commit_index` so a future restart knows where to resume replay from.
    /// Entries below this index may be compacted away at any time (spec §6).
    pub fn write_checkpoint(&mut self, last_commit_index: u64) -> Result<(), WalError> {
        let checkpoint_path = self.dir.join(CHECKPOINT_FILE_NAME);
        let tmp_path = self.dir.join(format!("{CHECKPOINT_FILE_NAME}.tmp"));
        fs::write(&tmp_path, last_commit_index.to_le_bytes()).map_err(|source| WalError::Append { source })?;
        fs::rename(&tmp_path, &checkpoint_path).map_err(|source| WalError::Append { source })?;
        Ok(())
    }

    pub fn read_checkpoint(&self) -> Result<Option<u64>, WalError> {
        let checkpoint_path = self.dir.join(CHECKPOINT_FILE_NAME);
        match fs::read(&checkpoint_path) {
            Ok(bytes) if bytes.len() == 8 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&bytes);
                Ok(Some(u64::from_le_bytes(buf)))
            }
            Ok(_) => Ok(None),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(WalError::OpenSegment {
                path: checkpoint_path.display().to_string(),
                source,
            }),
        }
    }

    /// Drops every record below `floor_index` by rewriting the segment in place. Called after a
    /// checkpoint advances, never concurrently with `append`.
    pub fn compact(&mut self, floor_index: u64) -> Result<(), WalError> {
        let segment_path = self.dir.join(SEGMENT_FILE_NAME);
        let kept: Vec<WalRecord> = Self::read_all_records(&segment_path)?
            .into_iter()
            .filter(|r| r.index >= floor_index)
            .collect();

        let tmp_path = self.dir.join(format!("{SEGMENT_FILE_NAME}.compact"));
        {
            let mut tmp = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .map_err(|source| WalError::OpenSegment {
                    path: tmp_path.display().to_string(),
                    source,
                })?;
            for record in &kept {
                let mut body = Vec::with_capacity(17 + record.payload.len());
                body.extend_from_slice(&record.index.to_le_bytes());
                body.extend_from_slice(&record.timestamp_millis.to_le_bytes());
                body.push(record.category as u8);
                body.extend_from_slice(&record.payload);
                let crc = crc32fast::hash(&body);
                tmp.write_all(&(body.len() as u64).to_le_bytes())
                    .map_err(|source| WalError::Append { source })?;
                tmp.write_all(&crc.to_le_bytes()).map_err(|source| WalError::Append { source })?;
                tmp.write_all(&body).map_err(|source| WalError::Append { source })?;
            }
            tmp.sync_data().map_err(|source| WalError::Fsync { source })?;
        }
        fs::rename(&tmp_path, &segment_path).map_err(|source| WalError::Append { source })?;

        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&segment_path)
            .map_err(|source| WalError::OpenSegment {
                path: segment_path.display().to_string(),
                source,
            })?;
        warn!(target: LOG_TARGET, "compacted WAL below index {floor_index}, {} records retained", kept.len());
        Ok(())
    }

    fn read_all_records(segment_path: &Path) -> Result<Vec<WalRecord>, WalError> {
        let file = match File::open(segment_path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(WalError::OpenSegment {
                    path: segment_path.display().to_string(),
                    source,
                })
            }
        };

        let mut reader = BufReader::new(file);
        let mut records = Vec::new();
        let mut offset = 0u64;

        loop {
            let mut length_buf = [0u8; 8];
            match reader.read_exact(&mut length_buf) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(source) => return Err(WalError::Append { source }),
            }
            let length = u64::from_le_bytes(length_buf);

            let mut crc_buf = [0u8; 4];
            reader.read_exact(&mut crc_buf).map_err(|_| WalError::Truncated { offset })?;
            let expected_crc = u32::from_le_bytes(crc_buf);

            let mut body = vec![0u8; length as usize];
            reader.read_exact(&mut body).map_err(|_| WalError::Truncated { offset })?;

            let actual_crc = crc32fast::hash(&body);
            if actual_crc != expected_crc {
                return Err(WalError::CrcMismatch {
                    offset,
                    expected: expected_crc,
                    actual: actual_crc,
                });
            }

            let index = u64::from_le_bytes(body[0..8].try_into().unwrap());
            let timestamp_millis = u64::from_le_bytes(body[8..16].try_into().unwrap());
            let category = WalCategory::from_u8(body[16])?;
            let payload = body[17..].to_vec();

            offset += 12 + length;
            records.push(WalRecord {
                index,
                timestamp_millis,
                category,
                payload,
            });
        }

        Ok(records)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
