use std::io::{self, Stdout, Write};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

use bstatus_common::Run;
use bstatus_framework::{Output, ProgramHandle, Result, SourceView};

const HEADER: &str = "{\"version\":1,\"click_events\":true}\n[\n";

/// One entry of the i3bar status array.
#[derive(Debug, Serialize)]
struct Block {
    name: String,
    separator: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    separator_block_width: Option<u32>,
    align: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    full_text: String,
    short_text: String,
    markup: &'static str,
}

impl Block {
    fn new(index: usize, source: &SourceView, separator_width: Option<u32>) -> Self {
        Self {
            name: format!("index_{index}"),
            separator: true,
            separator_block_width: separator_width,
            align: "center",
            min_width: (source.width > 0).then(|| " ".repeat(source.width)),
            color: source
                .runs
                .first()
                .and_then(|run| run.color.as_ref())
                .map(|color| color.to_hex6()),
            full_text: source.runs.iter().map(pango).collect(),
            short_text: source.runs.iter().filter(|r| !r.optional).map(pango).collect(),
            markup: "pango",
        }
    }
}

/// Escape a run for pango, wrapping colored runs in a `span`.
fn pango(run: &Run) -> String {
    let mut text = String::with_capacity(run.text.len());
    for c in run.text.chars() {
        match c {
            '&' | '<' | '>' | '"' | '\'' => text.push_str(&format!("&#{};", u32::from(c))),
            c => text.push(c),
        }
    }
    match &run.color {
        Some(color) => format!("<span color=\"{}\">{}</span>", color.to_hex6(), text),
        None => text,
    }
}

/// Output speaking the i3bar protocol.
///
/// The header and the opening bracket of the infinite status array are
/// written before the first render. Click events are read from standard
/// input when created with [`stdout`](I3BarOutput::stdout).
pub struct I3BarOutput<W> {
    writer: W,
    separator_width: Option<u32>,
    started: bool,
    read_stdin: bool,
}

impl I3BarOutput<Stdout> {
    pub fn stdout() -> Self {
        Self {
            read_stdin: true,
            ..Self::new(io::stdout())
        }
    }
}

impl<W: Write + Send> I3BarOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            separator_width: None,
            started: false,
            read_stdin: false,
        }
    }

    /// Set `separator_block_width` on every block.
    pub fn with_separator_width(mut self, width: Option<u32>) -> Self {
        self.separator_width = width;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Output for I3BarOutput<W> {
    fn attach(&mut self, program: ProgramHandle) -> Option<JoinHandle<()>> {
        self.read_stdin
            .then(|| tokio::spawn(read_clicks(BufReader::new(tokio::io::stdin()), program)))
    }

    fn display(&mut self, sources: &[SourceView]) -> Result<()> {
        let blocks: Vec<Block> = sources
            .iter()
            .enumerate()
            .map(|(i, source)| Block::new(i, source, self.separator_width))
            .collect();
        let json = serde_json::to_string(&blocks)?;

        if !self.started {
            self.writer.write_all(HEADER.as_bytes())?;
            self.writer.write_all(json.as_bytes())?;
            self.started = true;
        } else {
            self.writer.write_all(b",")?;
            self.writer.write_all(json.as_bytes())?;
        }
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// A click event sent by i3bar.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClickEvent {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_button")]
    pub button: u8,
}

fn default_button() -> u8 {
    1
}

impl ClickEvent {
    /// The source index encoded in an `index_<N>` block name.
    pub fn index(&self) -> Option<usize> {
        let digits = self.name.as_deref()?.strip_prefix("index_")?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

/// Decode one line of the click stream into `(index, button)`.
///
/// The stream is an infinite JSON array: a leading `[` or `,` is skipped.
pub fn parse_click(line: &str) -> Option<(usize, u8)> {
    let line = line.trim().trim_start_matches(['[', ',']).trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<ClickEvent>(line) {
        Ok(event) => Some((event.index()?, event.button)),
        Err(e) => {
            tracing::debug!(error = %e, line, "Ignoring click input");
            None
        }
    }
}

/// Forward clicks from `reader` to the program until end of input.
pub async fn read_clicks<R>(reader: R, program: ProgramHandle)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some((index, button)) = parse_click(&line) {
                    program.click(index, button);
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read click events");
                break;
            }
        }
    }
    tracing::debug!("Click input closed");
}
