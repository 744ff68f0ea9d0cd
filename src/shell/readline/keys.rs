use std::io::{self, Read};

/// 一次按键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Up,
    Down,
    CtrlC,
    CtrlD,
    Unknown,
}

/// Decodes raw terminal bytes into keys, one key per call.
pub struct Keys<R> {
    input: R,
    /// ESC 之后读到、但不属于转义序列的字节
    pending: Option<u8>,
}

impl<R: Read> Keys<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            pending: None,
        }
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(byte) = self.pending.take() {
            return Ok(Some(byte));
        }
        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// `Ok(None)` 表示输入结束
    pub fn next_key(&mut self) -> io::Result<Option<Key>> {
        let Some(byte) = self.read_byte()? else {
            return Ok(None);
        };

        let key = match byte {
            b'\r' | b'\n' => Key::Enter,
            b'\t' => Key::Tab,
            0x7f | 0x08 => Key::Backspace,
            0x03 => Key::CtrlC,
            0x04 => Key::CtrlD,
            0x1b => self.read_escape_seq()?,
            b if (0x20..0x7f).contains(&b) => Key::Char(b as char),
            b if b & 0xE0 == 0xC0 => self.read_utf8(b, 2)?,
            b if b & 0xF0 == 0xE0 => self.read_utf8(b, 3)?,
            b if b & 0xF8 == 0xF0 => self.read_utf8(b, 4)?,
            _ => Key::Unknown,
        };
        Ok(Some(key))
    }

    // ESC [ A / ESC [ B. A lone ESC leaves the following byte for the next key.
    fn read_escape_seq(&mut self) -> io::Result<Key> {
        match self.read_byte()? {
            Some(b'[') => {}
            Some(byte) => {
                self.pending = Some(byte);
                return Ok(Key::Unknown);
            }
            None => return Ok(Key::Unknown),
        }
        let key = match self.read_byte()? {
            Some(b'A') => Key::Up,
            Some(b'B') => Key::Down,
            // 带参数的序列（如 ESC [ 3 ~）读到结尾再忽略
            Some(b) if b.is_ascii_digit() => {
                while let Some(b) = self.read_byte()? {
                    if !(b.is_ascii_digit() || b == b';') {
                        break;
                    }
                }
                Key::Unknown
            }
            _ => Key::Unknown,
        };
        Ok(key)
    }

    fn read_utf8(&mut self, first: u8, len: usize) -> io::Result<Key> {
        let mut buf = [0u8; 4];
        buf[0] = first;
        for slot in buf.iter_mut().take(len).skip(1) {
            match self.read_byte()? {
                Some(b) => *slot = b,
                None => return Ok(Key::Unknown),
            }
        }
        Ok(std::str::from_utf8(&buf[..len])
            .ok()
            .and_then(|s| s.chars().next())
            .map_or(Key::Unknown, Key::Char))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Vec<Key> {
        let mut keys = Keys::new(bytes);
        let mut out = Vec::new();
        while let Ok(Some(key)) = keys.next_key() {
            out.push(key);
        }
        out
    }

    #[test]
    fn test_plain_keys() {
        assert_eq!(
            decode(b"a \t\x7f\r\n\x03\x04"),
            vec![
                Key::Char('a'),
                Key::Char(' '),
                Key::Tab,
                Key::Backspace,
                Key::Enter,
                Key::Enter,
                Key::CtrlC,
                Key::CtrlD,
            ]
        );
    }

    #[test]
    fn test_arrow_keys() {
        assert_eq!(
            decode(b"\x1b[A\x1b[B\x1b[C\x1b[3~x"),
            vec![Key::Up, Key::Down, Key::Unknown, Key::Unknown, Key::Char('x')]
        );
    }

    #[test]
    fn test_lone_escape_keeps_next_key() {
        assert_eq!(
            decode(b"\x1bls"),
            vec![Key::Unknown, Key::Char('l'), Key::Char('s')]
        );
        assert_eq!(decode(b"\x1b\x1b[A"), vec![Key::Unknown, Key::Up]);
        assert_eq!(decode(b"ab\x1b"), vec![Key::Char('a'), Key::Char('b'), Key::Unknown]);
    }

    #[test]
    fn test_utf8() {
        assert_eq!(decode("é漢".as_bytes()), vec![Key::Char('é'), Key::Char('漢')]);
    }

    #[test]
    fn test_truncated_utf8() {
        assert_eq!(decode(&[0xE6, 0xBC]), vec![Key::Unknown]);
    }
}
