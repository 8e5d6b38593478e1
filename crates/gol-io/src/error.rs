//! Errors raised while parsing or producing PGM images.

/// A PGM image could not be decoded or encoded.
#[derive(Debug, thiserror::Error)]
pub enum PgmError {
    /// The file does not start with the binary greymap magic `P5`.
    #[error("expected magic P5, found {found:?}")]
    BadMagic {
        /// The bytes found instead, lossily decoded.
        found: String,
    },

    /// The header ended before a required field.
    #[error("header is missing the {field} field")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A header field is not a decimal number.
    #[error("header field {field} is not a number: {token:?}")]
    BadNumber {
        /// Name of the field.
        field: &'static str,
        /// The offending token, lossily decoded.
        token: String,
    },

    /// Width or height is zero.
    #[error("image dimensions must be non-zero (got {width}x{height})")]
    ZeroDimension {
        /// Header width.
        width: usize,
        /// Header height.
        height: usize,
    },

    /// The maximum sample value is outside `1..=255`.
    #[error("unsupported maxval {maxval}, expected 1..=255")]
    UnsupportedMaxval {
        /// Header maxval.
        maxval: usize,
    },

    /// The raster holds fewer samples than the header promises.
    #[error("raster has {actual} samples, expected {expected}")]
    Truncated {
        /// `width * height`.
        expected: usize,
        /// Samples present.
        actual: usize,
    },

    /// Cells to encode do not match the image dimensions.
    #[error("cannot encode {actual} cells as a {width}x{height} image")]
    CellCount {
        /// Image width.
        width: usize,
        /// Image height.
        height: usize,
        /// Number of cells supplied.
        actual: usize,
    },
}
