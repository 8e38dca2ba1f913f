use std::io::{self, Write};

/// The output primitive a compiled program calls once per `.`.
///
/// `value` is the current cell sign-extended to 32 bits, so cells above 127
/// arrive negative. Implementations decide what "output" means.
pub trait Output {
    fn put(&mut self, value: i32);
}

/// Collects every value, in call order.
impl Output for Vec<i32> {
    fn put(&mut self, value: i32) {
        self.push(value);
    }
}

/// Writes the low byte of each value to a writer.
///
/// The first I/O error is kept and later calls become no-ops; check it with
/// [`WriteOutput::finish`].
pub struct WriteOutput<W: Write> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: Write> WriteOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, error: None }
    }

    /// Flush and report the first write error, if any.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> Output for WriteOutput<W> {
    fn put(&mut self, value: i32) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.writer.write_all(&[value as u8]) {
            self.error = Some(e);
        }
    }
}

/// Output to stdout, one byte per call.
pub type StdoutOutput = WriteOutput<io::Stdout>;

impl StdoutOutput {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}
