use std::fmt;
use tracing::debug;

/// Width of the `=`/`-` rules around the summary block.
pub const RULE_WIDTH: usize = 40;

/// Human-readable, append-only record of one compilation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingLog {
    lines: Vec<String>,
}

impl ProcessingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        debug!(target: "csv_compiler::log", "{}", line);
        self.lines.push(line);
    }

    pub fn extend<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            self.push(line);
        }
    }

    /// Blank line followed by a `--- Part N: title ---` heading.
    pub fn section(&mut self, part: usize, title: &str) {
        self.push("");
        self.push(format!("--- Part {}: {} ---", part, title));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }

    pub fn into_text(self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for ProcessingLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
