//! Integration tests for the outputs driven by a program.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bstatus::output::{I3BarOutput, StandardOutput, read_clicks};
use bstatus_framework::{Program, Source};

/// A cloneable writer whose contents can be read back.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_i3bar_protocol_framing() {
    let buffer = SharedBuffer::default();
    let mut program = Program::new();
    let cpu = Arc::new(Source::new("cpu"));
    let clock = Arc::new(Source::new("clock"));
    program.add_source(cpu.clone());
    program.add_source(clock.clone());

    program
        .set_output(Box::new(
            I3BarOutput::new(buffer.clone()).with_separator_width(Some(9)),
        ))
        .unwrap();
    cpu.set_text("{f00}90%").unwrap();
    clock.set_text("12:00 <now>").unwrap();
    program.render().unwrap();

    let contents = buffer.contents();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0], r#"{"version":1,"click_events":true}"#);
    assert_eq!(lines[1], "[");
    assert!(lines[2].starts_with("[{"));
    assert!(lines[3].starts_with(",[{"));

    let blocks: serde_json::Value = serde_json::from_str(&lines[3][1..]).unwrap();
    assert_eq!(blocks[0]["name"], "index_0");
    assert_eq!(blocks[0]["color"], "#ff0000");
    assert_eq!(blocks[0]["full_text"], "<span color=\"#ff0000\">90%</span>");
    assert_eq!(blocks[0]["separator_block_width"], 9);
    assert_eq!(blocks[1]["name"], "index_1");
    assert_eq!(blocks[1]["full_text"], "12:00 &#60;now&#62;");
}

#[test]
fn test_standard_output_lines() {
    let buffer = SharedBuffer::default();
    let mut program = Program::new();
    let a = Arc::new(Source::new("a"));
    let b = Arc::new(Source::new("b"));
    program.add_source(a.clone());
    program.add_source(b.clone());

    program
        .set_output(Box::new(StandardOutput::new(buffer.clone(), false)))
        .unwrap();
    a.set_text("{0f0}up[ 3d]").unwrap();
    b.set_text("x").unwrap();
    program.render().unwrap();

    assert_eq!(buffer.contents(), "(null) | (null)\nup 3d | x\n");
}

#[tokio::test(start_paused = true)]
async fn test_clicks_from_input_reach_sources() {
    let mut program = Program::new();
    let source = Arc::new(Source::new("volume"));
    program.add_source(Arc::new(Source::new("clock")));
    program.add_source(source.clone());

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    source.on_click(move |button| {
        let _ = tx.send(button);
    });

    let input: &[u8] = b"[\n{\"name\":\"index_1\",\"button\":3}\n,{\"name\":\"index_9\",\"button\":1}\n,{\"name\":\"index_1\",\"button\":4}\n";
    let handle = program.handle();
    let task = tokio::spawn(program.run());
    read_clicks(input, handle).await;

    assert_eq!(rx.recv().await, Some(3));
    assert_eq!(rx.recv().await, Some(4));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(rx.try_recv().is_err());
    task.abort();
}
