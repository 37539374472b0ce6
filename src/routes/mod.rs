//! HTTP route handlers for the `/api` surface.

pub mod carrito;
pub mod productos;

use crate::error::ApiError;

/// Path ids arrive as strings; they are normalized to `u64` here, the
/// one canonical id representation past the HTTP boundary.
pub(crate) fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse::<u64>()
        .map_err(|_| ApiError::Validation(format!("id invalido: '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_non_numeric() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert!(parse_id("twelve").is_err());
        assert!(parse_id("-3").is_err());
        assert!(parse_id("").is_err());
    }
}
