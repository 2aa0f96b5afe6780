use std::io::{self, IsTerminal, Stdout, Write};

use bstatus_framework::{Output, Result, SourceView};

const SEPARATOR: &str = " | ";
const EMPTY: &str = "(null)";
const FALLBACK_COLUMNS: usize = 80;

/// Plain text output.
///
/// On a terminal the line is redrawn in place with a carriage return,
/// colored with SGR codes, and optional runs are dropped when the full line
/// would not fit. Elsewhere every render is written as its own line without
/// colors.
pub struct StandardOutput<W> {
    writer: W,
    terminal: bool,
    columns: Option<usize>,
    last_width: usize,
}

impl StandardOutput<Stdout> {
    pub fn stdout() -> Self {
        let stdout = io::stdout();
        let terminal = stdout.is_terminal();
        Self::new(stdout, terminal)
    }
}

impl<W: Write + Send> StandardOutput<W> {
    pub fn new(writer: W, terminal: bool) -> Self {
        Self {
            writer,
            terminal,
            columns: None,
            last_width: 0,
        }
    }

    /// Use a fixed terminal width instead of querying the terminal.
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn columns(&self) -> usize {
        self.columns.unwrap_or_else(|| {
            crossterm::terminal::size()
                .map(|(columns, _)| usize::from(columns))
                .unwrap_or(FALLBACK_COLUMNS)
        })
    }

    /// Render one line, remembering its width for the next redraw.
    pub fn format_line(&mut self, sources: &[SourceView]) -> String {
        let show_optional = !self.terminal || full_width(sources) < self.columns();

        let mut line = String::new();
        let mut total = 0;
        for (i, source) in sources.iter().enumerate() {
            if i > 0 {
                line.push_str(SEPARATOR);
                total += SEPARATOR.len();
            }

            let mut text = String::new();
            let mut width = 0;
            for run in &source.runs {
                if run.optional && !show_optional {
                    continue;
                }
                match (&run.color, self.terminal) {
                    (Some(color), true) => {
                        text.push_str(&format!("\x1b[{}m{}\x1b[m", color.ansi_code(), run.text));
                    }
                    _ => text.push_str(&run.text),
                }
                width += run.text.chars().count();
            }

            if show_optional && width < source.width {
                let pad = source.width - width;
                let before = pad / 2;
                text = format!("{}{}{}", " ".repeat(before), text, " ".repeat(pad - before));
                width = source.width;
            }

            if text.is_empty() {
                line.push_str(EMPTY);
                width = EMPTY.len();
            } else {
                line.push_str(&text);
            }
            total += width;
        }

        let line = if self.terminal {
            let erase = self.last_width.saturating_sub(total);
            format!("\r{}{}", line, " ".repeat(erase))
        } else {
            line + "\n"
        };
        self.last_width = total;
        line
    }
}

/// Width of the line with every optional run shown.
fn full_width(sources: &[SourceView]) -> usize {
    let text: usize = sources
        .iter()
        .map(|source| {
            let len: usize = source.runs.iter().map(|r| r.text.chars().count()).sum();
            len.max(source.width)
        })
        .sum();
    text + SEPARATOR.len() * sources.len().saturating_sub(1)
}

impl<W: Write + Send> Output for StandardOutput<W> {
    fn display(&mut self, sources: &[SourceView]) -> Result<()> {
        let line = self.format_line(sources);
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstatus_common::RichText;

    fn view(markup: &str) -> SourceView {
        let text = RichText::parse(markup).unwrap();
        SourceView {
            width: text.width(),
            runs: text.into_runs(),
        }
    }

    #[test]
    fn test_plain_lines() {
        let mut output = StandardOutput::new(Vec::new(), false);
        output
            .display(&[view("{f00}cpu 5%[ busy]"), view("12:00")])
            .unwrap();
        output.display(&[view(""), view("12:01")]).unwrap();

        let written = String::from_utf8(output.into_inner()).unwrap();
        assert_eq!(written, "cpu 5% busy | 12:00\n(null) | 12:01\n");
    }

    #[test]
    fn test_terminal_colors() {
        let mut output = StandardOutput::new(Vec::new(), true).with_columns(80);
        let line = output.format_line(&[view("a{0f0}ok{}b")]);
        assert_eq!(line, "\ra\x1b[32mok\x1b[mb");
    }

    #[test]
    fn test_terminal_hides_optional_when_narrow() {
        let mut output = StandardOutput::new(Vec::new(), true).with_columns(10);
        let line = output.format_line(&[view("cpu[ 5%]"), view("mem[ 1G]")]);
        assert_eq!(line, "\rcpu | mem");

        let mut wide = StandardOutput::new(Vec::new(), true).with_columns(40);
        assert_eq!(wide.format_line(&[view("cpu[ 5%]"), view("mem[ 1G]")]), "\rcpu 5% | mem 1G");
    }

    #[test]
    fn test_width_padding_is_centered() {
        let mut output = StandardOutput::new(Vec::new(), false);
        let line = output.format_line(&[view("5%\0\0\0")]);
        assert_eq!(line, " 5%  \n");
    }

    #[test]
    fn test_terminal_erases_previous_line() {
        let mut output = StandardOutput::new(Vec::new(), true).with_columns(80);
        assert_eq!(output.format_line(&[view("longer")]), "\rlonger");
        assert_eq!(output.format_line(&[view("ab")]), "\rab    ");
        assert_eq!(output.format_line(&[view("abc")]), "\rabc");
    }
}
