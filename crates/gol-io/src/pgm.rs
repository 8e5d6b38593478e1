//! Binary PGM (`P5`) images.
//!
//! A header of whitespace-separated ASCII tokens (`P5`, width, height,
//! maxval) is followed by exactly one whitespace byte and then one byte per
//! sample in row-major order. `#` starts a comment that runs to the end of
//! the line and may appear anywhere a separator may.
//!
//! A cell is alive when its sample equals maxval. Images written here always
//! use maxval 255, so live cells are 255 and dead cells 0.

use crate::error::PgmError;

/// Sample value of a live cell in written images.
pub const MAXVAL: u8 = 255;

const MAGIC: &[u8] = b"P5";

/// A decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgmImage {
    /// Columns.
    pub width: usize,
    /// Rows.
    pub height: usize,
    /// Row-major cell states.
    pub cells: Vec<bool>,
}

/// Decode a binary PGM image.
///
/// Samples beyond `width * height` are ignored.
///
/// # Errors
///
/// Returns a [`PgmError`] describing the first problem in the header or
/// raster.
pub fn decode(bytes: &[u8]) -> Result<PgmImage, PgmError> {
    let magic = bytes.get(..MAGIC.len()).unwrap_or(bytes);
    if magic != MAGIC {
        return Err(PgmError::BadMagic {
            found: String::from_utf8_lossy(magic).into_owned(),
        });
    }

    let mut header = Header {
        bytes,
        pos: MAGIC.len(),
    };
    let width = header.number("width")?;
    let height = header.number("height")?;
    let maxval = header.number("maxval")?;

    if width == 0 || height == 0 {
        return Err(PgmError::ZeroDimension { width, height });
    }
    let maxval = u8::try_from(maxval)
        .ok()
        .filter(|&m| m > 0)
        .ok_or(PgmError::UnsupportedMaxval { maxval })?;

    // One whitespace byte separates the header from the raster.
    let raster = bytes.get(header.pos.saturating_add(1)..).unwrap_or_default();
    let expected = width.checked_mul(height).ok_or(PgmError::Truncated {
        expected: usize::MAX,
        actual: raster.len(),
    })?;
    let samples = raster.get(..expected).ok_or(PgmError::Truncated {
        expected,
        actual: raster.len(),
    })?;

    Ok(PgmImage {
        width,
        height,
        cells: samples.iter().map(|&sample| sample == maxval).collect(),
    })
}

/// Encode row-major cells as a binary PGM image with maxval 255.
///
/// # Errors
///
/// Returns [`PgmError::ZeroDimension`] or [`PgmError::CellCount`] if the
/// cells do not describe a `width` x `height` image.
pub fn encode(width: usize, height: usize, cells: &[bool]) -> Result<Vec<u8>, PgmError> {
    if width == 0 || height == 0 {
        return Err(PgmError::ZeroDimension { width, height });
    }
    if width.checked_mul(height) != Some(cells.len()) {
        return Err(PgmError::CellCount {
            width,
            height,
            actual: cells.len(),
        });
    }

    let mut bytes = format!("P5\n{width} {height}\n{MAXVAL}\n").into_bytes();
    bytes.reserve(cells.len());
    bytes.extend(cells.iter().map(|&alive| if alive { MAXVAL } else { 0 }));
    Ok(bytes)
}

/// Cursor over the ASCII header.
struct Header<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Header<'a> {
    fn skip_separators(&mut self) {
        while let Some(&byte) = self.bytes.get(self.pos) {
            if byte == b'#' {
                while self
                    .bytes
                    .get(self.pos)
                    .is_some_and(|&b| b != b'\n' && b != b'\r')
                {
                    self.pos = self.pos.saturating_add(1);
                }
            } else if byte.is_ascii_whitespace() {
                self.pos = self.pos.saturating_add(1);
            } else {
                break;
            }
        }
    }

    fn token(&mut self) -> Option<&'a [u8]> {
        self.skip_separators();
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| !b.is_ascii_whitespace())
        {
            self.pos = self.pos.saturating_add(1);
        }
        self.bytes.get(start..self.pos).filter(|t| !t.is_empty())
    }

    fn number(&mut self, field: &'static str) -> Result<usize, PgmError> {
        let token = self.token().ok_or(PgmError::MissingField { field })?;
        std::str::from_utf8(token)
            .ok()
            .and_then(|text| text.parse().ok())
            .ok_or_else(|| PgmError::BadNumber {
                field,
                token: String::from_utf8_lossy(token).into_owned(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn encode_writes_header_and_samples() {
        let bytes = encode(3, 2, &[true, false, false, false, true, true]).unwrap();
        assert_eq!(bytes, b"P5\n3 2\n255\n\xff\x00\x00\x00\xff\xff".to_vec());
    }

    #[test]
    fn decode_reads_what_encode_writes() {
        let cells = vec![false, true, true, false, true, false, false, false];
        let image = decode(&encode(4, 2, &cells).unwrap()).unwrap();
        assert_eq!(image.width, 4);
        assert_eq!(image.height, 2);
        assert_eq!(image.cells, cells);
    }

    #[test]
    fn decode_skips_comments_and_extra_whitespace() {
        let bytes = b"P5 # made by hand\n# another comment\n  2\t2 # dims\n255\n\xff\x00\x00\xff";
        let image = decode(bytes).unwrap();
        assert_eq!(image.cells, vec![true, false, false, true]);
    }

    #[test]
    fn alive_means_sample_equals_maxval() {
        let image = decode(b"P5\n3 1\n1\n\x01\x00\xff").unwrap();
        assert_eq!(image.cells, vec![true, false, false]);
    }

    #[test]
    fn trailing_samples_are_ignored() {
        let image = decode(b"P5\n1 1\n255\n\xff\x00\x00").unwrap();
        assert_eq!(image.cells, vec![true]);
    }

    #[test]
    fn rejects_ascii_greymap() {
        assert!(matches!(
            decode(b"P2\n1 1\n255\n1"),
            Err(PgmError::BadMagic { found }) if found == "P2"
        ));
        assert!(matches!(decode(b""), Err(PgmError::BadMagic { .. })));
    }

    #[test]
    fn rejects_bad_header_fields() {
        assert!(matches!(
            decode(b"P5\n4"),
            Err(PgmError::MissingField { field: "height" })
        ));
        assert!(matches!(
            decode(b"P5\nfour 4\n255\n"),
            Err(PgmError::BadNumber { field: "width", .. })
        ));
        assert!(matches!(
            decode(b"P5\n0 4\n255\n"),
            Err(PgmError::ZeroDimension { width: 0, height: 4 })
        ));
        assert!(matches!(
            decode(b"P5\n1 1\n65535\n\x00\x00"),
            Err(PgmError::UnsupportedMaxval { maxval: 65535 })
        ));
    }

    #[test]
    fn rejects_short_raster() {
        assert!(matches!(
            decode(b"P5\n2 2\n255\n\xff\xff\xff"),
            Err(PgmError::Truncated {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn encode_checks_cell_count() {
        assert!(matches!(
            encode(2, 2, &[true; 3]),
            Err(PgmError::CellCount { actual: 3, .. })
        ));
        assert!(encode(0, 2, &[]).is_err());
    }
}
