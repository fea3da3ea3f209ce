use anyhow::Result;
use std::io::{Cursor, Write};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

/// Build an in-memory zip with one entry per `(path, contents)` pair, in order.
/// Paths ending in `/` become directory entries.
pub(crate) fn build_zip(entries: &[(&str, &str)]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buf));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, contents) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, options)?;
            } else {
                zip.start_file(*name, options)?;
                zip.write_all(contents.as_bytes())?;
            }
        }
        zip.finish()?;
    }
    Ok(buf)
}

/// `n` data rows under a `seat,votes` header, tagged with `prefix`.
pub(crate) fn rows(prefix: &str, n: usize) -> String {
    let mut out = String::from("seat,votes\n");
    for i in 0..n {
        out.push_str(&format!("{}-{},{}\n", prefix, i, i * 10));
    }
    out
}
