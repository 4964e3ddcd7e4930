use crate::error::{ElfError, Result};

/// Bounds-checked view over a byte range holding NUL-terminated strings.
///
/// Used for section names and, by callers, for symbol names. The view
/// borrows the backing section's cached contents and cannot outlive them.
#[derive(Clone, Copy, Debug)]
pub struct Strtab<'a> {
    data: &'a [u8],
}

impl<'a> Strtab<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Strtab<'a> {
        Strtab { data }
    }

    /// Returns the string starting at `offset`, without its terminator.
    ///
    /// Fails with [`ElfError::Range`] if `offset` is at or past the end of
    /// the table, and with [`ElfError::Format`] if no NUL terminator is
    /// found before the end.
    pub fn get(&self, offset: u64) -> Result<&'a str> {
        let size = self.data.len() as u64;
        if offset >= size {
            return Err(ElfError::Range { offset, size });
        }
        let rest = &self.data[offset as usize..];
        match rest.iter().position(|&b| b == 0) {
            Some(len) => std::str::from_utf8(&rest[..len])
                .map_err(|_| ElfError::format("string is not valid UTF-8")),
            None => Err(ElfError::format("unterminated string")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_string_without_terminator() {
        let bytes = b"\0main\0.text\0";
        let tab = Strtab::new(bytes);
        assert_eq!(tab.get(0).unwrap(), "");
        assert_eq!(tab.get(1).unwrap(), "main");
        assert_eq!(tab.get(3).unwrap(), "in");
        assert_eq!(tab.get(6).unwrap(), ".text");
    }

    #[test]
    fn offset_at_end_is_a_range_error() {
        let tab = Strtab::new(b"foo\0");
        assert!(matches!(
            tab.get(4),
            Err(ElfError::Range { offset: 4, size: 4 })
        ));
        assert!(matches!(tab.get(100), Err(ElfError::Range { .. })));
    }

    #[test]
    fn missing_terminator_is_a_format_error() {
        let tab = Strtab::new(b"foo\0ba");
        assert!(matches!(tab.get(4), Err(ElfError::Format(_))));
        // one byte before the end, non-NUL
        assert!(matches!(tab.get(5), Err(ElfError::Format(_))));
    }

    #[test]
    fn foo_has_length_three() {
        let tab = Strtab::new(b"foo\0");
        let s = tab.get(0).unwrap();
        assert_eq!(s, "foo");
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn empty_table_rejects_any_offset() {
        let tab = Strtab::new(b"");
        assert!(matches!(tab.get(0), Err(ElfError::Range { .. })));
    }
}
