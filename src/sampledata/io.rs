use super::SampleData;
use crate::error::{Error, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Read a collection, decompressing transparently.
pub fn load(path: impl AsRef<Path>) -> Result<SampleData> {
    let path = path.as_ref();
    let data: SampleData = read_json(path)?;
    data.validate()?;
    debug!(
        path = %path.display(),
        sites = data.num_sites(),
        samples = data.num_samples(),
        "loaded collection"
    );
    Ok(data)
}

/// Write a collection. The file only appears at `path` once it is complete.
/// A `.gz` extension selects gzip compression.
pub fn save(data: &SampleData, path: impl AsRef<Path>) -> Result<()> {
    save_with(data, path, false)
}

/// Like [`save`], gzip-compressing regardless of the extension when `compress` is set.
pub fn save_with(data: &SampleData, path: impl AsRef<Path>, compress: bool) -> Result<()> {
    let path = path.as_ref();
    data.validate()?;
    write_json(data, path, false, compress || is_gzip_path(path))?;
    debug!(path = %path.display(), compress, "saved collection");
    Ok(())
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let (reader, _format) = niffler::get_reader(Box::new(file)).map_err(|source| Error::Compression {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(reader)).map_err(|e| Error::json(path, e))
}

/// Serialize to a temporary sibling of `path` and rename it into place.
pub(crate) fn write_json<T: Serialize>(value: &T, path: &Path, pretty: bool, gzip: bool) -> Result<()> {
    write_atomic(path, gzip, |sink| {
        let written = if pretty {
            serde_json::to_writer_pretty(sink, value)
        } else {
            serde_json::to_writer(sink, value)
        };
        written.map_err(|e| Error::json(path, e))
    })
}

/// Run `write` against a temporary file next to `path`, then move the
/// finished file into place so readers never see a partial output. Every
/// buffered byte, and the gzip trailer, is written before the rename.
pub(crate) fn write_atomic<F>(path: &Path, gzip: bool, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    let file = tmp.as_file().try_clone().map_err(|e| Error::io(tmp.path(), e))?;
    let mut buffered = BufWriter::new(file);
    if gzip {
        let mut encoder = GzEncoder::new(&mut buffered, Compression::new(6));
        write(&mut encoder)?;
        encoder.finish().map_err(|e| Error::io(path, e))?;
    } else {
        write(&mut buffered)?;
    }
    let file = buffered
        .into_inner()
        .map_err(|e| Error::io(path, e.into_error()))?;
    file.sync_all().map_err(|e| Error::io(path, e))?;
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

pub(crate) fn is_gzip_path(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("gz")
}
