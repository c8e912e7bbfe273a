use crate::actions::{Typist, TypingStep};
use crate::core::{Config, LocatorHints, Page, TimingConfig};
use crate::dom::{DomElement, ElementLocator};
use crate::engine::reporter::{StatusReporter, StatusSink};
use crate::engine::state::RunState;
use crate::engine::timers::{Task, TimerQueue};
use crate::errors::{AutomatorError, Result, RunError};
use crate::types::{Command, Reply, StartRequest, StatusSnapshot};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Prompt currently being typed, kept between typing ticks.
struct TypingJob {
    input: DomElement,
    button: DomElement,
    typist: Typist,
}

/// Runs a queue of prompts against a page: locate, type, click, wait,
/// repeat.
///
/// Nothing here sleeps. Every suspension is a timer on the engine's
/// [`TimerQueue`], fired by [`Engine::advance_to`]; the async driver maps
/// that clock onto real time, tests drive it directly.
pub struct Engine<P: Page, S: StatusSink> {
    page: P,
    reporter: StatusReporter<S>,
    state: RunState,
    timers: TimerQueue,
    typing: Option<TypingJob>,
    default_timing: TimingConfig,
    default_hints: LocatorHints,
    run_id: Uuid,
}

impl<P: Page, S: StatusSink> Engine<P, S> {
    pub fn new(page: P, sink: S, config: &Config) -> Self {
        Self {
            page,
            reporter: StatusReporter::new(sink),
            state: RunState::new(config.timing, config.hints.clone()),
            timers: TimerQueue::new(),
            typing: None,
            default_timing: config.timing,
            default_hints: config.hints.clone(),
            run_id: Uuid::nil(),
        }
    }

    pub fn with_defaults(page: P, sink: S) -> Self {
        Self::new(page, sink, &Config::default())
    }

    pub fn status(&self) -> StatusSnapshot {
        self.state.snapshot()
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn sink(&self) -> &S {
        self.reporter.sink()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Current reading of the engine's virtual clock, in ms.
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    /// Applies a command and returns the status right after it.
    pub async fn handle(&mut self, command: Command) -> StatusSnapshot {
        debug!(command = command.name(), "handling command");
        match command {
            Command::Start(request) => self.start(request).await,
            Command::Stop => self.stop(),
            Command::Resume => self.resume().await,
            Command::Cancel => self.cancel(),
            Command::StatusRequest => {}
        }
        self.status()
    }

    pub async fn handle_message(&mut self, message: Value) -> Reply {
        let status = self.handle(Command::from_message(message)).await;
        Reply { status }
    }

    /// Resets the run to a fresh queue and submits the first prompt.
    pub async fn start(&mut self, request: StartRequest) {
        self.clear_timers();

        let input_hint = request
            .input_selector
            .or_else(|| self.default_hints.input_hint.clone());
        let button_hint = request
            .button_selector
            .or_else(|| self.default_hints.button_hint.clone());

        self.state.queue = request.prompts;
        self.state.index = 0;
        self.state.hints = LocatorHints::new(input_hint, button_hint);
        self.state.timing = TimingConfig {
            char_delay_ms: millis(request.typing_speed, self.default_timing.char_delay_ms),
            step_delay_ms: millis(request.delay_between, self.default_timing.step_delay_ms),
        };
        self.state.last_error = None;
        self.state.running = true;
        self.state.paused = false;
        self.run_id = Uuid::new_v4();

        info!(
            run_id = %self.run_id,
            total = self.state.queue.len(),
            char_delay_ms = self.state.timing.char_delay_ms,
            step_delay_ms = self.state.timing.step_delay_ms,
            "run started"
        );
        self.report();
        self.run_next().await;
    }

    /// Pauses an active run, keeping its position.
    pub fn stop(&mut self) {
        if !self.state.is_active() {
            return;
        }
        self.clear_timers();
        self.state.paused = true;
        info!(run_id = %self.run_id, index = self.state.index, "run paused");
        self.report();
    }

    /// Continues a paused run. Elements are located again, the page may
    /// have changed meanwhile.
    pub async fn resume(&mut self) {
        if !(self.state.running && self.state.paused) {
            return;
        }
        self.clear_timers();
        self.state.paused = false;
        info!(run_id = %self.run_id, index = self.state.index, "run resumed");
        self.report();
        self.run_next().await;
    }

    /// Full reset, whatever the current state.
    pub fn cancel(&mut self) {
        self.clear_timers();
        self.state.running = false;
        self.state.paused = false;
        self.state.index = 0;
        self.state.last_error = None;
        info!(run_id = %self.run_id, "run cancelled");
        self.report();
    }

    pub async fn advance_by(&mut self, elapsed_ms: u64) {
        let target = self.timers.now().saturating_add(elapsed_ms);
        self.advance_to(target).await;
    }

    /// Fires, in order, every timer due by `now_ms`, including ones
    /// scheduled by earlier firings.
    pub async fn advance_to(&mut self, now_ms: u64) {
        while let Some((deadline, task)) = self.timers.pop_due(now_ms) {
            self.timers.set_now(deadline);
            self.fire(task).await;
        }
        self.timers.set_now(now_ms);
    }

    /// Fires timers until none remain.
    pub async fn run_until_idle(&mut self) -> StatusSnapshot {
        while let Some(deadline) = self.timers.next_deadline() {
            self.advance_to(deadline).await;
        }
        self.status()
    }

    async fn fire(&mut self, task: Task) {
        match task {
            Task::TypeTick => self.on_type_tick().await,
            Task::NextPrompt => self.run_next().await,
        }
    }

    /// One iteration of the submission loop.
    async fn run_next(&mut self) {
        if !self.state.is_active() {
            return;
        }

        if self.state.is_exhausted() {
            self.state.running = false;
            self.state.paused = false;
            info!(run_id = %self.run_id, submitted = self.state.index, "run completed");
            self.report();
            return;
        }

        let input_hint = self.state.hints.input_hint.clone();
        let input = match self.locate(input_hint.as_deref(), Target::Input).await {
            Ok(Some(element)) => element,
            Ok(None) => return self.fail(RunError::InputNotFound),
            Err(err) => return self.page_lost(Target::Input, err),
        };

        let button_hint = self.state.hints.button_hint.clone();
        let button = match self.locate(button_hint.as_deref(), Target::Button).await {
            Ok(Some(element)) => element,
            Ok(None) => return self.fail(RunError::ButtonNotFound),
            Err(err) => return self.page_lost(Target::Button, err),
        };

        if let Err(err) = self.begin_prompt(input, button).await {
            warn!(run_id = %self.run_id, error = %err, "prompt submission failed");
            self.fail(RunError::SubmissionFailed);
        }
    }

    /// A selector the page rejects counts as a missing element. Any other
    /// error means the page itself could not be queried.
    async fn locate(&self, hint: Option<&str>, target: Target) -> Result<Option<DomElement>> {
        let located = match target {
            Target::Input => ElementLocator::locate_input(&self.page, hint).await,
            Target::Button => ElementLocator::locate_button(&self.page, hint).await,
        };
        match located {
            Err(AutomatorError::InvalidSelector(reason)) => {
                warn!(run_id = %self.run_id, ?target, %reason, "selector rejected by page");
                Ok(None)
            }
            other => other,
        }
    }

    fn page_lost(&mut self, target: Target, err: AutomatorError) {
        warn!(run_id = %self.run_id, ?target, error = %err, "element lookup failed");
        self.fail(RunError::SubmissionFailed);
    }

    async fn begin_prompt(&mut self, input: DomElement, button: DomElement) -> Result<()> {
        self.page.focus(&input).await?;

        let prompt = self.state.current_prompt().unwrap_or_default().to_string();
        debug!(
            run_id = %self.run_id,
            index = self.state.index,
            chars = prompt.chars().count(),
            "typing prompt"
        );

        let mut typist = Typist::new(&prompt, self.state.timing.char_delay_ms);
        let step = typist.begin(&mut self.page, &input).await?;
        self.after_step(
            TypingJob {
                input,
                button,
                typist,
            },
            step,
        )
        .await
    }

    async fn on_type_tick(&mut self) {
        let Some(mut job) = self.typing.take() else {
            return;
        };

        let active = self.state.is_active();
        let result = match job.typist.tick(&mut self.page, &job.input, active).await {
            Ok(step) => self.after_step(job, step).await,
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            warn!(run_id = %self.run_id, error = %err, "typing failed");
            self.fail(RunError::SubmissionFailed);
        }
    }

    async fn after_step(&mut self, job: TypingJob, step: TypingStep) -> Result<()> {
        match step {
            TypingStep::Continue(delay_ms) => {
                self.typing = Some(job);
                self.timers.schedule_after(delay_ms, Task::TypeTick);
            }
            TypingStep::Aborted => {
                debug!(run_id = %self.run_id, index = self.state.index, "typing aborted");
                self.report();
            }
            TypingStep::Finished => {
                if !self.state.is_active() {
                    self.report();
                    return Ok(());
                }
                self.page.click(&job.button).await?;
                self.state.index += 1;
                debug!(
                    run_id = %self.run_id,
                    index = self.state.index,
                    total = self.state.queue.len(),
                    "prompt submitted"
                );
                self.report();
                self.timers
                    .schedule_after(self.state.timing.step_delay_ms, Task::NextPrompt);
            }
        }
        Ok(())
    }

    fn fail(&mut self, error: RunError) {
        self.clear_timers();
        self.state.last_error = Some(error.to_string());
        self.state.running = false;
        self.state.paused = false;
        warn!(run_id = %self.run_id, index = self.state.index, %error, "run failed");
        self.report();
    }

    fn clear_timers(&mut self) {
        self.timers.clear();
        self.typing = None;
    }

    fn report(&self) {
        self.reporter.report(self.state.snapshot());
    }
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Input,
    Button,
}

/// Panel numbers arrive as JSON numbers; absent values take the default and
/// negatives clamp to zero. Any positive value stays at least 1 ms, so a
/// small typing speed never collapses into a one-shot injection.
fn millis(value: Option<f64>, default: u64) -> u64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => (v.round() as u64).max(1),
        Some(v) if v.is_finite() => 0,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_clamps_and_rounds() {
        assert_eq!(millis(None, 20), 20);
        assert_eq!(millis(Some(-5.0), 20), 0);
        assert_eq!(millis(Some(12.6), 20), 13);
        assert_eq!(millis(Some(0.4), 20), 1);
        assert_eq!(millis(Some(0.0), 20), 0);
        assert_eq!(millis(Some(f64::NAN), 1500), 1500);
    }
}
