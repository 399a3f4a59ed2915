use std::io::{self, BufRead, Write};

/// Marker written in front of every prompt line
pub const SHELL_PREFIX: &str = ">>> ";

/// Line-oriented terminal used by the wizard
pub struct Shell<R, W> {
    input: R,
    output: W,
    prefix: &'static str,
}

impl Shell<io::StdinLock<'static>, io::Stdout> {
    /// Shell over the process's standard streams
    pub fn stdio() -> Self {
        Shell::new(io::stdin().lock(), io::stdout(), SHELL_PREFIX)
    }
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(input: R, output: W, prefix: &'static str) -> Self {
        Self {
            input,
            output,
            prefix,
        }
    }

    /// Write `text` with every line prefixed by the shell marker
    pub fn prompt(&mut self, text: &str) -> io::Result<()> {
        for line in text.lines() {
            writeln!(self.output, "{}{}", self.prefix, line)?;
        }
        self.output.flush()
    }

    /// Write `text` as-is followed by a newline
    pub fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)?;
        self.output.flush()
    }

    /// Read one line with surrounding spaces, tabs and line breaks removed.
    ///
    /// Returns `None` once the input is exhausted.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(
            line.trim_matches(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
                .to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_prompt_prefixes_each_line() {
        let mut out = Vec::new();
        let mut shell = Shell::new(Cursor::new(""), &mut out, SHELL_PREFIX);

        shell.prompt("first\nsecond").unwrap();
        shell.say("plain").unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            ">>> first\n>>> second\nplain\n"
        );
    }

    #[test]
    fn test_read_line_trims_and_detects_end() {
        let mut shell = Shell::new(Cursor::new(" \t3 \r\n\n"), Vec::new(), SHELL_PREFIX);

        assert_eq!(shell.read_line().unwrap().as_deref(), Some("3"));
        assert_eq!(shell.read_line().unwrap().as_deref(), Some(""));
        assert_eq!(shell.read_line().unwrap(), None);
    }
}
