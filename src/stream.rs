//! Byte producers feeding the loader, including transparent zstd
//! decompression running in its own worker thread.
//!
//! The loader never shares mutable state with the decompressor: chunks and
//! progress travel over bounded channels, progress counted in *input*
//! (compressed) bytes since the expansion ratio is unknown up front.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver};

use crate::error::LoadError;

const CHUNK_BYTES: usize = 64 * 1024;
/// Read-ahead depth of the decompression worker.
const WORKER_QUEUE: usize = 8;

/// A sequential byte producer. `read` returns `None` at end of stream;
/// `progress` reports input bytes consumed so far.
pub trait ByteSource {
    fn read(&mut self) -> Result<Option<Vec<u8>>, LoadError>;
    fn progress(&self) -> u64;
}

/// Returns true when `name` selects the transparent-decompression path:
/// a `.zst`/`.zstd` suffix, optionally followed by `.txt`.
pub fn is_compressed_name(name: &str) -> bool {
    let base = name.strip_suffix(".txt").unwrap_or(name);
    base.ends_with(".zst") || base.ends_with(".zstd")
}

/// Opens a file as a byte source, decompressing when the name calls for it.
pub fn open_source(path: &Path) -> Result<Box<dyn ByteSource>, LoadError> {
    let file = File::open(path)?;
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if is_compressed_name(name) {
        Ok(Box::new(ZstdSource::new(file)?))
    } else {
        Ok(Box::new(FileSource::new(file)))
    }
}

pub struct FileSource {
    file: File,
    consumed: u64,
}

impl FileSource {
    pub fn new(file: File) -> Self {
        Self { file, consumed: 0 }
    }
}

impl ByteSource for FileSource {
    fn read(&mut self) -> Result<Option<Vec<u8>>, LoadError> {
        let mut buf = vec![0u8; CHUNK_BYTES];
        let n = self.file.read(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        self.consumed += n as u64;
        Ok(Some(buf))
    }

    fn progress(&self) -> u64 {
        self.consumed
    }
}

/// In-memory source, used by tests and demos.
pub struct MemSource {
    data: Vec<u8>,
    pos: usize,
}

impl MemSource {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }
}

impl ByteSource for MemSource {
    fn read(&mut self) -> Result<Option<Vec<u8>>, LoadError> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }
        let end = (self.pos + CHUNK_BYTES).min(self.data.len());
        let chunk = self.data[self.pos..end].to_vec();
        self.pos = end;
        Ok(Some(chunk))
    }

    fn progress(&self) -> u64 {
        self.pos as u64
    }
}

enum WorkerMsg {
    /// A decoded chunk plus the total input bytes consumed so far.
    Chunk { data: Vec<u8>, input_bytes: u64 },
    Eof,
    Failed(String),
}

/// Transparent zstd decompression behind message passing. The worker owns
/// the decoder; this side only ever sees decoded chunks.
pub struct ZstdSource {
    rx: Receiver<WorkerMsg>,
    input_bytes: u64,
    done: bool,
}

impl ZstdSource {
    pub fn new(reader: impl Read + Send + 'static) -> Result<Self, LoadError> {
        let (tx, rx) = bounded(WORKER_QUEUE);
        let counter = Arc::new(AtomicU64::new(0));
        let counting = CountingReader {
            inner: reader,
            count: counter.clone(),
        };
        let decoder = zstd::stream::read::Decoder::new(counting)
            .map_err(LoadError::Io)?;

        std::thread::spawn(move || {
            let mut decoder = decoder;
            loop {
                let mut buf = vec![0u8; CHUNK_BYTES];
                match decoder.read(&mut buf) {
                    Ok(0) => {
                        let _ = tx.send(WorkerMsg::Eof);
                        break;
                    }
                    Ok(n) => {
                        buf.truncate(n);
                        let msg = WorkerMsg::Chunk {
                            data: buf,
                            input_bytes: counter.load(Ordering::Relaxed),
                        };
                        // Receiver dropped means the load was abandoned.
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(WorkerMsg::Failed(e.to_string()));
                        break;
                    }
                }
            }
        });

        Ok(Self {
            rx,
            input_bytes: 0,
            done: false,
        })
    }
}

impl ByteSource for ZstdSource {
    fn read(&mut self) -> Result<Option<Vec<u8>>, LoadError> {
        if self.done {
            return Ok(None);
        }
        match self.rx.recv() {
            Ok(WorkerMsg::Chunk { data, input_bytes }) => {
                self.input_bytes = input_bytes;
                Ok(Some(data))
            }
            Ok(WorkerMsg::Eof) | Err(_) => {
                self.done = true;
                Ok(None)
            }
            Ok(WorkerMsg::Failed(message)) => {
                self.done = true;
                Err(LoadError::Stream { line: 0, message })
            }
        }
    }

    fn progress(&self) -> u64 {
        self.input_bytes
    }
}

struct CountingReader<R> {
    inner: R,
    count: Arc<AtomicU64>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

/// Reassembles a byte source into lines, handling chunk-straddling lines
/// and trailing carriage returns.
pub struct LineSource {
    source: Box<dyn ByteSource>,
    buf: Vec<u8>,
    pos: usize,
    eof: bool,
}

impl LineSource {
    pub fn new(source: Box<dyn ByteSource>) -> Self {
        Self {
            source,
            buf: Vec::new(),
            pos: 0,
            eof: false,
        }
    }

    pub fn progress(&self) -> u64 {
        self.source.progress()
    }

    /// Next line without its terminator, or `None` at end of stream. A
    /// final unterminated line is still returned.
    pub fn next_line(&mut self) -> Result<Option<String>, LoadError> {
        loop {
            if let Some(nl) = self.buf[self.pos..].iter().position(|&b| b == b'\n') {
                let end = self.pos + nl;
                let line = take_line(&self.buf[self.pos..end]);
                self.pos = end + 1;
                self.compact();
                return Ok(Some(line));
            }
            if self.eof {
                if self.pos < self.buf.len() {
                    let line = take_line(&self.buf[self.pos..]);
                    self.pos = self.buf.len();
                    return Ok(Some(line));
                }
                return Ok(None);
            }
            match self.source.read()? {
                Some(chunk) => self.buf.extend_from_slice(&chunk),
                None => self.eof = true,
            }
        }
    }

    fn compact(&mut self) {
        // Keep the carry-over small: drop consumed bytes once they dominate.
        if self.pos > CHUNK_BYTES {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
    }
}

fn take_line(bytes: &[u8]) -> String {
    let bytes = match bytes.last() {
        Some(b'\r') => &bytes[..bytes.len() - 1],
        _ => bytes,
    };
    String::from_utf8_lossy(bytes).into_owned()
}
