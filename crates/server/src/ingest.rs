//! The `ingest` subcommand: run a local CSV file through the same parser as
//! the upload function.

use std::io::Write;

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

use cirrus_core::ingest;

use crate::error::ServerError;

/// Stream `reader` through the CSV parser in reads of `chunk_size` bytes and
/// write each record to `out` as a JSON array, one per line.
///
/// Returns the number of records. A zero chunk size reads one byte at a
/// time.
pub async fn print_records<R, W>(
    reader: R,
    chunk_size: usize,
    out: &mut W,
) -> Result<usize, ServerError>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let chunks = ReaderStream::with_capacity(reader, chunk_size.max(1));
    let records = ingest(chunks);
    futures::pin_mut!(records);

    let mut count = 0usize;
    while let Some(record) = records.next().await {
        let record = record?;
        count += 1;
        serde_json::to_writer(&mut *out, &record).map_err(std::io::Error::from)?;
        writeln!(out)?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use cirrus_core::IngestError;

    use super::*;

    async fn run(input: &'static [u8], chunk_size: usize) -> Result<(usize, String), ServerError> {
        let mut out = Vec::new();
        let count = print_records(Cursor::new(input), chunk_size, &mut out).await?;
        Ok((count, String::from_utf8(out).unwrap()))
    }

    #[tokio::test]
    async fn prints_one_line_per_record() {
        let (count, out) = run(b"name,age\nAda,36\n", 8192).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(out, "[\"name\",\"age\"]\n[\"Ada\",\"36\"]\n");
    }

    #[tokio::test]
    async fn tiny_chunks_split_multibyte_characters() {
        let (count, out) = run("Zoë,日本\n".as_bytes(), 1).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(out, "[\"Zoë\",\"日本\"]\n");
    }

    #[tokio::test]
    async fn zero_chunk_size_still_reads() {
        let (count, _) = run(b"a,b\n", 0).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn empty_file_has_no_records() {
        let (count, out) = run(b"", 64).await.unwrap();
        assert_eq!(count, 0);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn invalid_utf8_fails() {
        let err = run(b"a,b\n\xff\n", 64).await.unwrap_err();
        assert!(matches!(
            err,
            ServerError::Ingest(IngestError::InvalidUtf8 { .. })
        ));
    }
}
