use std::io::BufRead;

use crate::error::{Error, Result};

/// Iterates over the lines of a buffered reader, e.g. stdin.
pub struct LineReader<R> {
    inner: R,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: BufRead> std::iter::Iterator for LineReader<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = String::new();
        match self.inner.read_line(&mut buf) {
            Ok(0) => None, // EOF
            Ok(_) => Some(Ok(buf)),
            Err(e) => Some(Err(Error::from(e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_reader() -> std::result::Result<(), Error> {
        let input = "first\nsecond\n\nlast";
        let lines = LineReader::new(input.as_bytes()).collect::<Result<Vec<_>>>()?;
        assert_eq!(lines, vec!["first\n", "second\n", "\n", "last"]);
        Ok(())
    }
}
