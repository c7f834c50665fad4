/// Converts host text to ABC line endings: every `\n` becomes `\r` and a
/// run of consecutive `\r` collapses to one.
///
/// The converter remembers whether the previous chunk ended in `\r`, so a
/// file fed in pieces converts exactly like the whole file at once.
#[derive(Debug, Default, Clone)]
pub struct LineConverter {
    last_was_cr: bool,
}

impl LineConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the converted form of `input` to `out`.
    pub fn convert_into(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for &byte in input {
            let c = if byte == b'\n' { b'\r' } else { byte };
            if c == b'\r' {
                if !self.last_was_cr {
                    out.push(c);
                }
                self.last_was_cr = true;
            } else {
                out.push(c);
                self.last_was_cr = false;
            }
        }
    }

    pub fn convert(&mut self, input: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(input.len());
        self.convert_into(input, &mut out);
        out
    }
}

/// One-shot conversion of a complete buffer.
pub fn convert_line_endings(input: &[u8]) -> Vec<u8> {
    LineConverter::new().convert(input)
}
