//! Field file format constants.

/// Keyword that starts the line declaring the numeric payload.
pub const PAYLOAD_MARKER: &[u8] = b"internalField";

/// Header keyword declaring the payload encoding.
pub const FORMAT_KEYWORD: &str = "format";

/// `format` token selecting binary payloads.
pub const BINARY_TOKEN: &str = "binary";

/// `format` token written for text payloads.
pub const ASCII_TOKEN: &str = "ascii";

/// Byte opening the payload list.
pub const OPEN_DELIMITER: u8 = b'(';

/// Bytes closing the payload list.
pub const CLOSE_DELIMITER: &[u8; 2] = b");";

/// Width of one binary double.
pub const DOUBLE_SIZE: usize = 8;

/// Byte order of binary payloads. Simulation tools write doubles in host order.
pub type PayloadOrder = byteorder::NativeEndian;

/// Suffix appended to a field name for the averaged output file.
pub const MEAN_SUFFIX: &str = "Mean";

/// Output file name for the average of `field`.
#[inline]
pub fn mean_file_name(field: &str) -> String {
    format!("{}{}", field, MEAN_SUFFIX)
}
