//! Field file reader.
//!
//! Splits a field file into the header text, the decoded payload and the
//! trailer text. Header and trailer are kept as raw bytes.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

#[cfg(feature = "mmap")]
use memmap2::Mmap;
use tracing::{debug, trace};

use super::codec;
use super::format::{CLOSE_DELIMITER, PAYLOAD_MARKER};
use super::FileRegions;
use crate::field::{Encoding, FieldKind};
use crate::util::{Error, Result};

/// Read a field file, memory-mapping it when the `mmap` feature is enabled.
pub fn read_field_file(path: impl AsRef<Path>, kind: FieldKind) -> Result<FileRegions> {
    read_field_file_opts(path, kind, true)
}

/// Read a field file with optional memory mapping.
///
/// The file handle (and map) lives only for the duration of this call.
pub fn read_field_file_opts(
    path: impl AsRef<Path>,
    kind: FieldKind,
    use_mmap: bool,
) -> Result<FileRegions> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;
    let size = file.metadata()?.len();
    debug!(path = %path.display(), size, "reading field file");

    if use_mmap && size > 0 {
        return read_mapped(file, kind);
    }
    parse_regions(BufReader::new(file), kind, Some(size))
}

#[cfg(feature = "mmap")]
fn read_mapped(file: File, kind: FieldKind) -> Result<FileRegions> {
    // Safety: the map is read-only and dropped before this function returns
    let mmap = unsafe { Mmap::map(&file) }?;
    parse_regions(&mmap[..], kind, Some(mmap.len() as u64))
}

#[cfg(not(feature = "mmap"))]
fn read_mapped(file: File, kind: FieldKind) -> Result<FileRegions> {
    let size = file.metadata()?.len();
    parse_regions(BufReader::new(file), kind, Some(size))
}

/// Parse field file regions from any buffered stream.
pub fn read_regions<R: BufRead>(r: R, kind: FieldKind) -> Result<FileRegions> {
    parse_regions(r, kind, None)
}

/// Reject a point count that cannot fit in the `remaining` bytes of input.
fn check_count_fits(
    points: usize,
    kind: FieldKind,
    encoding: Encoding,
    remaining: u64,
) -> Result<()> {
    // binary: fixed-width payload plus `);`; text: at least one byte per entry
    let needed = match encoding {
        Encoding::Binary => codec::binary_len(points, kind)?.saturating_add(CLOSE_DELIMITER.len() as u64),
        Encoding::Text => points as u64,
    };
    if needed > remaining {
        return Err(Error::payload(format!(
            "declared {} {} entries need {} bytes, only {} remain in file",
            points, kind, needed, remaining
        )));
    }
    Ok(())
}

/// `size` is the total input length when known; a point count that cannot fit
/// in it is rejected before any payload is read.
fn parse_regions<R: BufRead>(mut r: R, kind: FieldKind, size: Option<u64>) -> Result<FileRegions> {
    let mut lines: Vec<Vec<u8>> = Vec::new();
    loop {
        let mut line = Vec::new();
        if r.read_until(b'\n', &mut line)? == 0 {
            return Err(Error::header("no internalField line found"));
        }
        let is_marker = line.starts_with(PAYLOAD_MARKER);
        lines.push(line);
        if is_marker {
            break;
        }
    }

    let mut count_line = Vec::new();
    r.read_until(b'\n', &mut count_line)?;
    let count_text = String::from_utf8_lossy(&count_line);
    let points: usize = count_text.trim().parse().map_err(|_| {
        Error::header(format!(
            "expected point count after internalField, found `{}`",
            count_text.trim()
        ))
    })?;

    let encoding = codec::detect_encoding(&lines)?;
    trace!(points, %encoding, "payload declaration");

    codec::value_count(points, kind)?;
    if let Some(size) = size {
        let consumed = lines.iter().map(Vec::len).sum::<usize>() + count_line.len() + 1;
        check_count_fits(points, kind, encoding, size.saturating_sub(consumed as u64))?;
    }

    codec::expect_open(&mut r)?;
    let payload = codec::decode(&mut r, points, kind, encoding)?;
    codec::expect_close(&mut r, encoding)?;

    let mut trailer = Vec::new();
    r.read_to_end(&mut trailer)?;

    Ok(FileRegions {
        header: lines.concat(),
        encoding,
        payload,
        trailer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HEADER: &str = "FoamFile\n{\n    format      binary;\n    class       volScalarField;\n}\ninternalField   nonuniform List<scalar>\n";

    fn binary_file(header: &str, count: &str, values: &[f64], trailer: &str) -> Vec<u8> {
        let mut data = header.as_bytes().to_vec();
        data.extend_from_slice(count.as_bytes());
        data.push(b'(');
        for v in values {
            data.extend_from_slice(&v.to_ne_bytes());
        }
        data.extend_from_slice(b");");
        data.extend_from_slice(trailer.as_bytes());
        data
    }

    #[test]
    fn test_read_binary_regions() {
        let data = binary_file(HEADER, "2\n", &[1.0, 3.0], "\n// end\n");
        let regions = read_regions(&data[..], FieldKind::Scalar).unwrap();
        assert_eq!(regions.header, HEADER.as_bytes());
        assert_eq!(regions.encoding, Encoding::Binary);
        assert_eq!(regions.payload.values(), &[1.0, 3.0]);
        assert_eq!(regions.trailer, b"\n// end\n");
    }

    #[test]
    fn test_read_text_regions() {
        let header = "FoamFile\n{\n    format      ascii;\n}\ninternalField   nonuniform List<vector>\n";
        let body = "2\n(\n(1 0 0)\n(0 2 0)\n)\n;\n\nboundaryField\n{\n}\n";
        let data = format!("{}{}", header, body);
        let regions = read_regions(data.as_bytes(), FieldKind::Vector3).unwrap();
        assert_eq!(regions.encoding, Encoding::Text);
        assert_eq!(regions.payload.len(), 2);
        assert_eq!(regions.trailer, b"\n\nboundaryField\n{\n}\n");
    }

    #[test]
    fn test_missing_marker() {
        let err = read_regions(&b"FoamFile\n{\n}\n"[..], FieldKind::Scalar).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader(_)));
    }

    #[test]
    fn test_uniform_field_is_malformed_header() {
        let data = "FoamFile\n{\n    format ascii;\n}\ninternalField   uniform 0;\n\nboundaryField\n{\n}\n";
        let err = read_regions(data.as_bytes(), FieldKind::Scalar).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader(_)));
    }

    #[test]
    fn test_missing_format_declaration() {
        let data = binary_file("FoamFile\n{\n}\ninternalField nonuniform List<scalar>\n", "1\n", &[1.0], "");
        let err = read_regions(&data[..], FieldKind::Scalar).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader(_)));
    }

    #[test]
    fn test_count_mismatch_is_malformed_payload() {
        let data = binary_file(HEADER, "3\n", &[1.0, 3.0], "\n");
        let err = read_regions(&data[..], FieldKind::Scalar).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)));
    }

    #[test]
    fn test_oversized_binary_count_is_malformed_payload() {
        for count in ["10000000000\n", "4611686018427387904\n", "18446744073709551615\n"] {
            let mut data = binary_file(HEADER, count, &[], "");
            data.truncate(data.len() - 2);
            data.push(0);
            let err = read_regions(&data[..], FieldKind::Scalar).unwrap_err();
            assert!(matches!(err, Error::MalformedPayload(_)), "count {}: {}", count.trim(), err);
        }
    }

    #[test]
    fn test_oversized_text_count_is_malformed_payload() {
        let header = "FoamFile\n{\n    format      ascii;\n}\ninternalField   nonuniform List<vector>\n";
        for count in ["10000000000", "18446744073709551615"] {
            let data = format!("{}{}\n(\n(1 0 0)\n)\n;\n", header, count);
            let err = read_regions(data.as_bytes(), FieldKind::Vector3).unwrap_err();
            assert!(matches!(err, Error::MalformedPayload(_)), "count {}: {}", count, err);
        }

        let header = header.replace("List<vector>", "List<scalar>");
        let data = format!("{}1000000000000\n(\n1.0\n)\n;\n", header);
        let err = read_regions(data.as_bytes(), FieldKind::Scalar).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)));
    }

    #[test]
    fn test_count_larger_than_file_rejected_before_decoding() -> Result<()> {
        let dir = TempDir::new()?;
        let binary = dir.path().join("p");
        std::fs::write(&binary, binary_file(HEADER, "10000000000\n", &[1.0], "\n"))?;
        let text = dir.path().join("U");
        let header = "FoamFile\n{\n    format ascii;\n}\ninternalField nonuniform List<vector>\n";
        std::fs::write(&text, format!("{}10000000000\n(\n(1 0 0)\n)\n;\n", header))?;

        for use_mmap in [true, false] {
            let err = read_field_file_opts(&binary, FieldKind::Scalar, use_mmap).unwrap_err();
            assert!(matches!(err, Error::MalformedPayload(_)));
            assert!(err.to_string().contains("remain"), "{}", err);

            let err = read_field_file_opts(&text, FieldKind::Vector3, use_mmap).unwrap_err();
            assert!(matches!(err, Error::MalformedPayload(_)));
            assert!(err.to_string().contains("remain"), "{}", err);
        }
        Ok(())
    }

    #[test]
    fn test_exact_size_file_still_reads() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("p");
        std::fs::write(&path, binary_file(HEADER, "2\n", &[1.0, 3.0], ""))?;
        for use_mmap in [true, false] {
            let regions = read_field_file_opts(&path, FieldKind::Scalar, use_mmap)?;
            assert_eq!(regions.payload.values(), &[1.0, 3.0]);
            assert!(regions.trailer.is_empty());
        }
        Ok(())
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_field_file("/nonexistent/0/U", FieldKind::Vector3).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
