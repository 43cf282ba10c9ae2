//! `pts-imc hash`

use std::{io::Write, path::Path};

use pts_imc::{HashAlgorithm, MeasurementCollector};

use crate::error::CliError;

/// Write `<hex digest>  <name>` for `path`, or for each file in it when
/// `directory` is set.
pub fn run(
    out: &mut impl Write,
    path: &Path,
    algorithm: HashAlgorithm,
    directory: bool,
) -> Result<(), CliError> {
    let collector = MeasurementCollector::new(algorithm);

    if directory {
        let entries = collector.hash_directory(path)?;
        for entry in &entries {
            writeln!(out, "{}  {}", hex::encode(&entry.digest), entry.file_name)?;
        }
        tracing::info!(path = %path.display(), files = entries.len(), %algorithm, "measured directory");
    } else {
        let digest = collector.hash_file(path)?;
        writeln!(out, "{}  {}", hex::encode(&digest), path.display())?;
    }
    Ok(())
}
