use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::history::History;

pub fn save_history(history: &History, path: impl AsRef<Path>) -> std::io::Result<()> {
    let file = File::create(path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut writer = std::io::BufWriter::new(encoder);

    serialize_into(&mut writer, history)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    // Finish the gzip stream so a failed trailer write is reported here
    let encoder = writer.into_inner().map_err(|e| e.into_error())?;
    encoder.finish()?.flush()?;

    Ok(())
}

pub fn load_history(path: impl AsRef<Path>) -> std::io::Result<History> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(file);
    let mut reader = std::io::BufReader::new(decoder);

    let history: History = deserialize_from(&mut reader)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    // The decoder bypasses History's constructors
    if history.capacity() == 0 || history.len() > history.capacity() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "snapshot holds {} entries for a capacity of {}",
                history.len(),
                history.capacity()
            ),
        ));
    }

    Ok(history)
}
