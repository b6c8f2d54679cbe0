//! Read-only decoding of a packed command (a RESP array of bulk strings).

/// Why a packed command could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RespError {
    /// No bytes at all.
    #[error("packed command is empty")]
    Empty,
    /// A frame started with the wrong type marker.
    #[error("expected '{expected}' at offset {offset}, found byte {found:#04x}")]
    UnexpectedMarker {
        /// Marker that was required.
        expected: char,
        /// Byte actually present.
        found: u8,
        /// Position in the input.
        offset: usize,
    },
    /// A length header was not a non-negative decimal number.
    #[error("invalid length header at offset {offset}")]
    InvalidLength {
        /// Position in the input.
        offset: usize,
    },
    /// The input ended inside a frame.
    #[error("packed command is truncated")]
    Truncated,
    /// The array holds no elements, so there is no command name.
    #[error("packed command has no command name")]
    MissingName,
}

/// A decoded command borrowing from the packed bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCommand<'a> {
    /// Command name as sent.
    pub name: &'a [u8],
    /// Arguments after the name.
    pub args: Vec<&'a [u8]>,
}

/// Decode the first command in `packed`. Trailing bytes are ignored.
pub fn decode_command(packed: &[u8]) -> Result<DecodedCommand<'_>, RespError> {
    if packed.is_empty() {
        return Err(RespError::Empty);
    }
    let mut reader = Reader {
        input: packed,
        offset: 0,
    };
    let count = reader.header(b'*')?;
    let mut parts = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        let length = reader.header(b'$')?;
        parts.push(reader.bulk(length)?);
    }
    let mut parts = parts.into_iter();
    let name = parts.next().ok_or(RespError::MissingName)?;
    Ok(DecodedCommand {
        name,
        args: parts.collect(),
    })
}

struct Reader<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn header(&mut self, marker: u8) -> Result<usize, RespError> {
        let found = *self.input.get(self.offset).ok_or(RespError::Truncated)?;
        if found != marker {
            return Err(RespError::UnexpectedMarker {
                expected: char::from(marker),
                found,
                offset: self.offset,
            });
        }
        let start = self.offset + 1;
        let line = self.line(start)?;
        std::str::from_utf8(line)
            .ok()
            .and_then(|digits| digits.parse::<usize>().ok())
            .ok_or(RespError::InvalidLength { offset: start })
    }

    fn line(&mut self, start: usize) -> Result<&'a [u8], RespError> {
        let rest = self.input.get(start..).ok_or(RespError::Truncated)?;
        let end = rest
            .windows(2)
            .position(|pair| pair == b"\r\n")
            .ok_or(RespError::Truncated)?;
        let line = rest.get(..end).ok_or(RespError::Truncated)?;
        self.offset = start + end + 2;
        Ok(line)
    }

    fn bulk(&mut self, length: usize) -> Result<&'a [u8], RespError> {
        let end = self.offset.checked_add(length).ok_or(RespError::Truncated)?;
        let body = self.input.get(self.offset..end).ok_or(RespError::Truncated)?;
        if self.input.get(end..end + 2) != Some(b"\r\n".as_slice()) {
            return Err(RespError::Truncated);
        }
        self.offset = end + 2;
        Ok(body)
    }
}
