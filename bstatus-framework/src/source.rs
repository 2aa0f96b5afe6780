//! Display slots.

use std::fmt;

use parking_lot::RwLock;
use serde::Deserialize;

use bstatus_common::{MarkupError, RichText, Run, markup_width};

type Observer = Box<dyn Fn() + Send + Sync>;
type ClickHandler = Box<dyn Fn(u8) + Send + Sync>;

/// A display-width override.
///
/// Deserializes from either a number or a markup string whose literal width
/// is used (handy for reserving room for the widest expected value).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Width {
    Fixed(usize),
    Markup(String),
}

impl Width {
    /// Resolve to a column count.
    pub fn resolve(&self) -> Result<usize, MarkupError> {
        match self {
            Width::Fixed(width) => Ok(*width),
            Width::Markup(markup) => markup_width(markup),
        }
    }
}

/// A consistent copy of one source's state, taken at render time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceView {
    /// Display width: the override if one is set, else the parsed width.
    pub width: usize,
    pub runs: Vec<Run>,
}

impl SourceView {
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

#[derive(Default)]
struct SourceState {
    text: RichText,
    width: Option<usize>,
}

/// One display slot holding the latest rendered rich text.
///
/// Written by exactly one driver (usually a [`Repeat`](crate::Repeat)) and
/// read by the [`Program`](crate::Program) when rendering. A single observer
/// is notified after every change.
pub struct Source {
    name: String,
    state: RwLock<SourceState>,
    observer: RwLock<Option<Observer>>,
    click_handlers: RwLock<Vec<ClickHandler>>,
}

impl Source {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(SourceState::default()),
            observer: RwLock::new(None),
            click_handlers: RwLock::new(Vec::new()),
        }
    }

    /// Name used in log messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the rendered text with parsed `markup`.
    ///
    /// On a markup error the previous text is kept and the observer is not
    /// notified.
    pub fn set_text(&self, markup: &str) -> Result<(), MarkupError> {
        let text = RichText::parse(markup)?;
        self.state.write().text = text;
        self.notify();
        Ok(())
    }

    /// Override the display width.
    pub fn set_width(&self, width: &Width) -> Result<(), MarkupError> {
        let width = width.resolve()?;
        self.state.write().width = Some(width);
        self.notify();
        Ok(())
    }

    /// Replace the rendered text with an alert-colored error description.
    pub fn set_error(&self, err: &dyn fmt::Display) {
        self.state.write().text = RichText::error(err.to_string());
        self.notify();
    }

    /// Register the change observer, replacing any previous one.
    pub fn attach(&self, observer: impl Fn() + Send + Sync + 'static) {
        *self.observer.write() = Some(Box::new(observer));
    }

    /// Register a click handler. Handlers run in registration order.
    pub fn on_click(&self, handler: impl Fn(u8) + Send + Sync + 'static) {
        self.click_handlers.write().push(Box::new(handler));
    }

    /// Deliver a click. Without handlers this is a no-op.
    pub fn click(&self, button: u8) {
        tracing::debug!(source = %self.name, button, "Click");
        for handler in self.click_handlers.read().iter() {
            handler(button);
        }
    }

    /// Snapshot the current width and runs.
    pub fn view(&self) -> SourceView {
        let state = self.state.read();
        SourceView {
            width: state.width.unwrap_or_else(|| state.text.width()),
            runs: state.text.runs().to_vec(),
        }
    }

    // Called with no state lock held so observers may read the source.
    fn notify(&self) {
        if let Some(observer) = self.observer.read().as_ref() {
            observer();
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.name)
            .field("view", &self.view())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstatus_common::Color;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(source: &Source) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        source.attach(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_set_text_notifies() {
        let source = Source::new("test");
        let count = counting(&source);

        source.set_text("{0f0}ok[ more]").unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let view = source.view();
        assert_eq!(view.width, 7);
        assert_eq!(view.runs.len(), 2);
        assert!(view.runs[1].optional);
    }

    #[test]
    fn test_unknown_braces_are_literal() {
        let source = Source::new("test");
        let count = counting(&source);

        source.set_text("{12}\\").unwrap();
        let view = source.view();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(view.runs[0].text, "{12}\\");
        assert_eq!(view.width, 5);
    }

    #[test]
    fn test_set_error() {
        let source = Source::new("test");
        let count = counting(&source);

        source.set_error(&"boom");
        let view = source.view();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(view.runs.len(), 1);
        assert_eq!(view.runs[0].text, "boom");
        assert_eq!(view.runs[0].color, Some(Color::alert()));
        assert!(!view.runs[0].optional);
    }

    #[test]
    fn test_width_override() {
        let source = Source::new("test");
        source.set_text("abc").unwrap();
        assert_eq!(source.view().width, 3);

        source.set_width(&Width::Fixed(10)).unwrap();
        assert_eq!(source.view().width, 10);

        source.set_width(&Width::Markup("{f00}12\\]4[5]".to_string())).unwrap();
        assert_eq!(source.view().width, 5);
    }

    #[test]
    fn test_width_deserialize() {
        let fixed: Width = serde_json::from_str("8").unwrap();
        assert_eq!(fixed, Width::Fixed(8));
        let markup: Width = serde_json::from_str("\"100%\"").unwrap();
        assert_eq!(markup, Width::Markup("100%".to_string()));
    }

    #[test]
    fn test_empty_text() {
        let source = Source::new("test");
        source.set_text("").unwrap();
        assert!(source.view().is_empty());
        assert_eq!(source.view().width, 0);
    }

    #[test]
    fn test_click_handlers() {
        let source = Source::new("test");
        source.click(1);

        let clicks = Arc::new(AtomicUsize::new(0));
        let seen = clicks.clone();
        source.on_click(move |button| {
            seen.fetch_add(button as usize, Ordering::SeqCst);
        });
        source.click(3);
        assert_eq!(clicks.load(Ordering::SeqCst), 3);
    }
}
