//! Field file writer.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::codec;
use super::format::{CLOSE_DELIMITER, OPEN_DELIMITER};
use crate::field::{Encoding, Payload};
use crate::util::Result;

/// Write header, point-count line, encoded payload and trailer to a stream.
pub fn write_field<W: Write>(
    w: &mut W,
    header: &[u8],
    payload: &Payload,
    trailer: &[u8],
    encoding: Encoding,
) -> Result<()> {
    w.write_all(header)?;
    writeln!(w, "{}", payload.len())?;
    w.write_all(&[OPEN_DELIMITER])?;
    codec::encode(w, payload, encoding)?;
    w.write_all(CLOSE_DELIMITER)?;
    w.write_all(trailer)?;
    Ok(())
}

/// Write a field file.
///
/// Output goes to a sibling `.tmp` file first and is renamed into place, so a
/// failed write never leaves a truncated file under `path`.
pub fn write_field_file(
    path: impl AsRef<Path>,
    header: &[u8],
    payload: &Payload,
    trailer: &[u8],
    encoding: Encoding,
) -> Result<()> {
    let path = path.as_ref();
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    let result = (|| -> Result<()> {
        let mut w = BufWriter::new(File::create(tmp_path)?);
        write_field(&mut w, header, payload, trailer, encoding)?;
        w.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        fs::rename(tmp_path, path)?;
        Ok(())
    })();

    match &result {
        Ok(()) => debug!(path = %path.display(), points = payload.len(), %encoding, "wrote field file"),
        Err(_) => {
            let _ = fs::remove_file(tmp_path);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;
    use crate::foam::read_regions;
    use tempfile::TempDir;

    #[test]
    fn test_write_binary_layout() {
        let header = b"FoamFile{format binary;}\ninternalField List<scalar>;\n";
        let payload = Payload::from_scalars(vec![2.0, 4.0]);
        let mut out = Vec::new();
        write_field(&mut out, header, &payload, b"\n// end\n", Encoding::Binary).unwrap();

        let mut expected = header.to_vec();
        expected.extend_from_slice(b"2\n(");
        expected.extend_from_slice(&2.0f64.to_ne_bytes());
        expected.extend_from_slice(&4.0f64.to_ne_bytes());
        expected.extend_from_slice(b");\n// end\n");
        assert_eq!(out, expected);
    }

    #[test]
    fn test_write_text_reads_back() {
        let header = b"FoamFile\n{\n    format ascii;\n}\ninternalField nonuniform List<vector>\n";
        let payload = Payload::from_vectors(&[[1.0, 0.0, 0.0], [0.0, 2.0, 0.0]]);
        let mut out = Vec::new();
        write_field(&mut out, header, &payload, b"\n", Encoding::Text).unwrap();
        assert!(String::from_utf8_lossy(&out).contains("2\n(\n(1 0 0)\n(0 2 0)\n);\n"));

        let regions = read_regions(&out[..], FieldKind::Vector3).unwrap();
        assert_eq!(regions.header, header);
        assert_eq!(regions.payload, payload);
        assert_eq!(regions.trailer, b"\n");
    }

    #[test]
    fn test_write_field_file_leaves_no_tmp() -> crate::util::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("pMean");
        let payload = Payload::from_scalars(vec![1.5]);
        write_field_file(&path, b"format binary;\ninternalField\n", &payload, b"", Encoding::Binary)?;

        assert!(path.exists());
        assert!(!dir.path().join("pMean.tmp").exists());
        Ok(())
    }

    #[test]
    fn test_write_field_file_into_missing_dir_fails() {
        let payload = Payload::from_scalars(vec![1.5]);
        let result = write_field_file("/nonexistent/dir/pMean", b"", &payload, b"", Encoding::Binary);
        assert!(result.is_err());
    }
}
