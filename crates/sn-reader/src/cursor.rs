use std::fmt::Display;

/// A bounds-checked, little-endian read failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadError {
    pub offset: usize,
    pub needed: usize,
    pub remaining: usize,
}

impl Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unexpected end of file at offset {}: needed {} bytes, {} remaining",
            self.offset, self.needed, self.remaining
        )
    }
}

impl std::error::Error for ReadError {}

/// A forward-only cursor over a byte slice. Every read is checked against
/// the remaining length before any bytes are consumed.
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn require(&self, needed: usize) -> Result<(), ReadError> {
        if self.remaining() < needed {
            Err(ReadError {
                offset: self.pos,
                needed,
                remaining: self.remaining(),
            })
        } else {
            Ok(())
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        self.require(1)?;
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    pub fn read_i8(&mut self) -> Result<i8, ReadError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, ReadError> {
        self.require(2)?;
        let bytes = [self.data[self.pos], self.data[self.pos + 1]];
        self.pos += 2;
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_u32(&mut self) -> Result<u32, ReadError> {
        self.require(4)?;
        let bytes = [
            self.data[self.pos],
            self.data[self.pos + 1],
            self.data[self.pos + 2],
            self.data[self.pos + 3],
        ];
        self.pos += 4;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ReadError> {
        self.require(len)?;
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), ReadError> {
        self.require(len)?;
        self.pos += len;
        Ok(())
    }

    /// Length-prefixed byte string: `u8 len, len bytes`, read as Latin-1
    /// and widened to UTF-8 (SN names are raw bytes with no declared
    /// encoding; every byte value round-trips through `char::from`).
    pub fn read_pstring(&mut self) -> Result<String, ReadError> {
        let len = self.read_u8()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(bytes.iter().map(|&b| b as char).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let data = [0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        let mut c = Cursor::new(&data);
        assert_eq!(c.read_u16().unwrap(), 0x1234);
        assert_eq!(c.read_u32().unwrap(), 0x12345678);
    }

    #[test]
    fn pstring_roundtrip() {
        let data = [3u8, b'F', b'O', b'O'];
        let mut c = Cursor::new(&data);
        assert_eq!(c.read_pstring().unwrap(), "FOO");
    }

    #[test]
    fn truncated_read_errors_with_offset() {
        let data = [0x01u8];
        let mut c = Cursor::new(&data);
        let err = c.read_u32().unwrap_err();
        assert_eq!(err.offset, 0);
        assert_eq!(err.remaining, 1);
    }

    #[test]
    fn errors_track_position_after_prior_reads() {
        let data = [0u8, 0, 0xaa];
        let mut c = Cursor::new(&data);
        c.read_u16().unwrap();
        let err = c.read_u32().unwrap_err();
        assert_eq!(err.offset, 2);
    }
}
