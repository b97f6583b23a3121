//! Byte codec for keys and values stored in file-backed pages.
//!
//! All integers are little-endian; variable-length types carry a `u32`
//! length prefix.

/// Errors raised while encoding or decoding stored bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Ran out of bytes mid-value.
    UnexpectedEof,
    /// A string field holds invalid UTF-8.
    InvalidUtf8,
    /// A value is too long for its length prefix.
    LengthOverflow,
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::InvalidUtf8 => write!(f, "invalid UTF-8 in string field"),
            Self::LengthOverflow => write!(f, "value too long for its length prefix"),
        }
    }
}

impl std::error::Error for CodecError {}

/// A type that can be written to and read back from stored bytes.
///
/// `decode` returns the value together with the number of bytes consumed,
/// so callers can decode consecutive fields from one buffer.
pub trait Codec: Sized {
    /// Append this value's encoding to `buf`.
    fn encode(&self, buf: &mut Vec<u8>) -> Result<(), CodecError>;

    /// Decode a value from the front of `bytes`.
    fn decode(bytes: &[u8]) -> Result<(Self, usize), CodecError>;
}

impl Codec for u32 {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<(), CodecError> {
        buf.extend_from_slice(&self.to_le_bytes());
        Ok(())
    }

    fn decode(bytes: &[u8]) -> Result<(Self, usize), CodecError> {
        let raw = bytes.get(..4).ok_or(CodecError::UnexpectedEof)?;
        let mut le = [0u8; 4];
        le.copy_from_slice(raw);
        Ok((Self::from_le_bytes(le), 4))
    }
}

impl Codec for u64 {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<(), CodecError> {
        buf.extend_from_slice(&self.to_le_bytes());
        Ok(())
    }

    fn decode(bytes: &[u8]) -> Result<(Self, usize), CodecError> {
        let raw = bytes.get(..8).ok_or(CodecError::UnexpectedEof)?;
        let mut le = [0u8; 8];
        le.copy_from_slice(raw);
        Ok((Self::from_le_bytes(le), 8))
    }
}

impl Codec for i64 {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<(), CodecError> {
        buf.extend_from_slice(&self.to_le_bytes());
        Ok(())
    }

    fn decode(bytes: &[u8]) -> Result<(Self, usize), CodecError> {
        let raw = bytes.get(..8).ok_or(CodecError::UnexpectedEof)?;
        let mut le = [0u8; 8];
        le.copy_from_slice(raw);
        Ok((Self::from_le_bytes(le), 8))
    }
}

impl Codec for String {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<(), CodecError> {
        let len = u32::try_from(self.len()).map_err(|_| CodecError::LengthOverflow)?;
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(self.as_bytes());
        Ok(())
    }

    fn decode(bytes: &[u8]) -> Result<(Self, usize), CodecError> {
        let (len, prefix) = u32::decode(bytes)?;
        let len = len as usize;
        let raw = bytes
            .get(prefix..prefix + len)
            .ok_or(CodecError::UnexpectedEof)?;
        let text = std::str::from_utf8(raw).map_err(|_| CodecError::InvalidUtf8)?;
        Ok((text.to_string(), prefix + len))
    }
}

impl Codec for Vec<u8> {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<(), CodecError> {
        let len = u32::try_from(self.len()).map_err(|_| CodecError::LengthOverflow)?;
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(self);
        Ok(())
    }

    fn decode(bytes: &[u8]) -> Result<(Self, usize), CodecError> {
        let (len, prefix) = u32::decode(bytes)?;
        let len = len as usize;
        let raw = bytes
            .get(prefix..prefix + len)
            .ok_or(CodecError::UnexpectedEof)?;
        Ok((raw.to_vec(), prefix + len))
    }
}
