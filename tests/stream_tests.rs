use trace_chart::error::LoadError;
use trace_chart::loader::{CancelToken, LoadOptions, LoadStatus, LoadTask, NullObserver};
use trace_chart::stream::{is_compressed_name, ByteSource, LineSource, MemSource, ZstdSource};

/// Hands out tiny chunks to force lines to straddle reads.
struct TinyChunks {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl ByteSource for TinyChunks {
    fn read(&mut self) -> Result<Option<Vec<u8>>, LoadError> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }
        let end = (self.pos + self.chunk).min(self.data.len());
        let out = self.data[self.pos..end].to_vec();
        self.pos = end;
        Ok(Some(out))
    }
    fn progress(&self) -> u64 {
        self.pos as u64
    }
}

fn lines_of(input: &str, chunk: usize) -> Vec<String> {
    let mut src = LineSource::new(Box::new(TinyChunks {
        data: input.as_bytes().to_vec(),
        pos: 0,
        chunk,
    }));
    let mut out = Vec::new();
    while let Some(line) = src.next_line().unwrap() {
        out.push(line);
    }
    out
}

#[test]
fn test_compressed_name_sniffing() {
    assert!(is_compressed_name("trace.zst"));
    assert!(is_compressed_name("trace.zstd"));
    assert!(is_compressed_name("trace.zst.txt"));
    assert!(is_compressed_name("trace.zstd.txt"));
    assert!(!is_compressed_name("trace.txt"));
    assert!(!is_compressed_name("trace.tsv"));
    assert!(!is_compressed_name("zstd_notes.md"));
}

#[test]
fn test_lines_across_chunk_boundaries() {
    let input = "alpha\tbeta\n1\t2\n3\t4\n";
    for chunk in 1..=8 {
        assert_eq!(
            lines_of(input, chunk),
            vec!["alpha\tbeta", "1\t2", "3\t4"],
            "chunk size {chunk}"
        );
    }
}

#[test]
fn test_crlf_and_final_unterminated_line() {
    assert_eq!(lines_of("a\r\nb\r\nc", 3), vec!["a", "b", "c"]);
    assert_eq!(lines_of("only", 2), vec!["only"]);
    assert_eq!(lines_of("", 2), Vec::<String>::new());
}

#[test]
fn test_empty_lines_preserved() {
    assert_eq!(lines_of("a\n\nb\n", 4), vec!["a", "", "b"]);
}

#[test]
fn test_zstd_source_round_trips() {
    let mut original = String::new();
    for i in 0..5000 {
        original.push_str(&format!("{i}\t{}\n", i * 3));
    }
    let compressed = zstd::encode_all(original.as_bytes(), 1).unwrap();
    let compressed_len = compressed.len() as u64;

    let mut src = ZstdSource::new(std::io::Cursor::new(compressed)).unwrap();
    let mut decoded = Vec::new();
    while let Some(chunk) = src.read().unwrap() {
        decoded.extend_from_slice(&chunk);
    }
    assert_eq!(decoded, original.as_bytes());
    // Progress counts input (compressed) bytes, not expanded output.
    assert!(src.progress() > 0);
    assert!(src.progress() <= compressed_len);
}

#[test]
fn test_zstd_source_rejects_garbage() {
    let mut src = ZstdSource::new(std::io::Cursor::new(b"definitely not zstd".to_vec()));
    // The frame header check may fail eagerly or on first read.
    let failed = match &mut src {
        Err(_) => true,
        Ok(src) => src.read().is_err(),
    };
    assert!(failed);
}

#[test]
fn test_compressed_load_end_to_end() {
    let mut input = String::from("cycle\tval\n");
    for i in 0..500 {
        input.push_str(&format!("{i}\t{}\n", i % 17));
    }
    let compressed = zstd::encode_all(input.as_bytes(), 3).unwrap();

    let source = ZstdSource::new(std::io::Cursor::new(compressed)).unwrap();
    let mut task = LoadTask::new(Box::new(source), LoadOptions::default(), CancelToken::new());
    let status = task.run(&mut NullObserver);
    assert_eq!(status, LoadStatus::Finished { rows: 500 });
    assert!(task.bytes_progress() > 0);

    let table = task.table();
    let t = table.read();
    assert_eq!(t.row_count(), 500);
    assert_eq!(t.column_by_name("val").unwrap().1.stats().max, 16);
}

#[test]
fn test_mem_source_progress() {
    let mut src = MemSource::new(vec![0u8; 10]);
    assert_eq!(src.progress(), 0);
    while src.read().unwrap().is_some() {}
    assert_eq!(src.progress(), 10);
}
