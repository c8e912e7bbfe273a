use crate::actions::ValueInjector;
use crate::core::Page;
use crate::dom::DomElement;
use crate::errors::Result;

/// Outcome of one step of a typing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingStep {
    /// More characters remain; schedule the next tick after this many ms.
    Continue(u64),
    /// The whole text is in and the change notification has fired.
    Finished,
    /// The run stopped before the text was complete. Nothing further fires.
    Aborted,
}

/// Types `text` into an element one character per tick.
///
/// The typist never sleeps itself: the caller owns the timer and calls
/// [`Typist::tick`] when it fires.
#[derive(Debug, Clone)]
pub struct Typist {
    chars: Vec<char>,
    cursor: usize,
    char_delay_ms: u64,
    done: bool,
}

impl Typist {
    pub fn new(text: &str, char_delay_ms: u64) -> Self {
        Self {
            chars: text.chars().collect(),
            cursor: 0,
            char_delay_ms,
            done: false,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// First step. With no delay the whole text goes in at once.
    pub async fn begin<P: Page + ?Sized>(
        &mut self,
        page: &mut P,
        element: &DomElement,
    ) -> Result<TypingStep> {
        if self.char_delay_ms == 0 {
            let text: String = self.chars.iter().collect();
            ValueInjector::inject(page, element, &text).await?;
            self.cursor = self.chars.len();
            self.done = true;
            return Ok(TypingStep::Finished);
        }
        self.tick(page, element, true).await
    }

    /// One character. `active` is the run's state as of this tick; an
    /// inactive run aborts without writing anything.
    pub async fn tick<P: Page + ?Sized>(
        &mut self,
        page: &mut P,
        element: &DomElement,
        active: bool,
    ) -> Result<TypingStep> {
        if self.done {
            return Ok(TypingStep::Aborted);
        }
        if !active {
            self.done = true;
            return Ok(TypingStep::Aborted);
        }

        let end = (self.cursor + 1).min(self.chars.len());
        let prefix: String = self.chars[..end].iter().collect();
        ValueInjector::apply(page, element, &prefix).await?;
        ValueInjector::notify_input(page, element).await?;
        self.cursor += 1;

        if self.cursor < self.chars.len() {
            Ok(TypingStep::Continue(self.char_delay_ms))
        } else {
            ValueInjector::notify_change(page, element).await?;
            self.done = true;
            Ok(TypingStep::Finished)
        }
    }
}
