//! Scriptable in-memory driver.
//!
//! [`MockDriver`] stands in for a remote session in unit tests of the engine
//! and of downstream page objects. Elements are registered under a
//! `(strategy, selector)` pair and can be scripted to appear late, vanish,
//! stay hidden until some swipes happened, or fail specific calls.

use crate::actions::{KeySequence, PointerSequence};
use crate::driver::{
    DriverError, DriverErrorKind, DriverResult, ElementHandle, RemoteDriver, WindowSize,
};
use crate::gesture::{VENDOR_SWIPE, VENDOR_TYPE_TEXT};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Driver operation, used to script failures and count calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    /// `find_element`
    FindElement,
    /// `is_element_displayed`
    IsDisplayed,
    /// `element_text`
    ElementText,
    /// `element_click`
    ElementClick,
    /// `element_clear`
    ElementClear,
    /// `element_send_keys`
    ElementSendKeys,
    /// `window_size`
    WindowSize,
    /// `perform_pointer_actions`
    PointerActions,
    /// `perform_key_actions`
    KeyActions,
    /// `execute_vendor_command`
    VendorCommand,
    /// `hide_keyboard`
    HideKeyboard,
    /// `press_key_code`
    PressKeyCode,
}

/// Element known to the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Handle id
    pub id: String,
    /// Visible text
    pub text: String,
    /// Displayed flag
    pub displayed: bool,
    /// Lookups that miss before the element appears
    pub appears_after_lookups: u32,
    /// Lookups after which the element is gone
    pub vanishes_after_lookups: Option<u32>,
    /// Swipes needed before the element is displayed
    pub visible_after_swipes: u32,
}

impl MockElement {
    /// Displayed element with empty text
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: String::new(),
            displayed: true,
            appears_after_lookups: 0,
            vanishes_after_lookups: None,
            visible_after_swipes: 0,
        }
    }

    /// Set the text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Present but not displayed
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Miss the first `lookups` lookups
    #[must_use]
    pub const fn appearing_after(mut self, lookups: u32) -> Self {
        self.appears_after_lookups = lookups;
        self
    }

    /// Disappear once `lookups` lookups succeeded
    #[must_use]
    pub const fn vanishing_after(mut self, lookups: u32) -> Self {
        self.vanishes_after_lookups = Some(lookups);
        self
    }

    /// Stay off-screen until `swipes` swipes happened
    #[must_use]
    pub const fn visible_after_swipes(mut self, swipes: u32) -> Self {
        self.visible_after_swipes = swipes;
        self
    }
}

#[derive(Debug)]
struct MockState {
    elements: Vec<(String, String, MockElement)>,
    lookups: HashMap<String, u32>,
    failures: HashMap<MockCall, VecDeque<DriverError>>,
    unsupported: HashSet<MockCall>,
    rejected_strategies: HashSet<String>,
    rejected_vendor_commands: HashSet<String>,
    history: Vec<(MockCall, String)>,
    vendor_params: Vec<(String, serde_json::Value)>,
    pointer_sequences: Vec<PointerSequence>,
    typed: Vec<String>,
    swipes: u32,
    window: WindowSize,
    session_active: bool,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            lookups: HashMap::new(),
            failures: HashMap::new(),
            unsupported: HashSet::new(),
            rejected_strategies: HashSet::new(),
            rejected_vendor_commands: HashSet::new(),
            history: Vec::new(),
            vendor_params: Vec::new(),
            pointer_sequences: Vec::new(),
            typed: Vec::new(),
            swipes: 0,
            window: WindowSize::new(1080, 1920),
            session_active: true,
        }
    }
}

impl MockState {
    fn record(&mut self, call: MockCall, detail: String) -> DriverResult<()> {
        self.history.push((call, detail));
        if self.unsupported.contains(&call) {
            return Err(DriverError::unsupported(format!("{call:?} is not implemented")));
        }
        if let Some(err) = self.failures.get_mut(&call).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        Ok(())
    }

    fn element(&self, handle: &ElementHandle) -> DriverResult<&MockElement> {
        self.elements
            .iter()
            .map(|(_, _, element)| element)
            .find(|element| element.id == handle.id())
            .ok_or_else(|| DriverError::stale(format!("{handle} is no longer attached")))
    }

    fn find(&mut self, strategy: &str, selector: &str) -> DriverResult<ElementHandle> {
        if self.rejected_strategies.contains(strategy) {
            return Err(DriverError::new(
                DriverErrorKind::InvalidSelector,
                format!("locator strategy '{strategy}' is not supported for this session"),
            ));
        }
        let missing = || DriverError::no_such_element(format!("{strategy}={selector}"));
        let Some(element) = self
            .elements
            .iter()
            .find(|(s, sel, _)| s == strategy && sel == selector)
            .map(|(_, _, element)| element.clone())
        else {
            return Err(missing());
        };
        let count = self.lookups.entry(element.id.clone()).or_insert(0);
        *count += 1;
        if *count <= element.appears_after_lookups {
            return Err(missing());
        }
        if element.vanishes_after_lookups.is_some_and(|limit| *count > limit) {
            return Err(missing());
        }
        Ok(ElementHandle::new(element.id))
    }
}

/// Scriptable in-memory [`RemoteDriver`]
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    /// Empty mock with a 1080x1920 viewport and a live session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an element under a strategy and selector
    #[must_use]
    pub fn with_element(self, strategy: &str, selector: &str, element: MockElement) -> Self {
        self.add_element(strategy, selector, element);
        self
    }

    /// Set the viewport size
    #[must_use]
    pub fn with_window_size(self, width: u32, height: u32) -> Self {
        self.state().window = WindowSize::new(width, height);
        self
    }

    /// Register an element on a live mock
    pub fn add_element(&self, strategy: &str, selector: &str, element: MockElement) {
        self.state()
            .elements
            .push((strategy.to_string(), selector.to_string(), element));
    }

    /// Fail the next call of `call` with `err`
    pub fn fail_next(&self, call: MockCall, err: DriverError) {
        self.fail_times(call, 1, err);
    }

    /// Fail the next `times` calls of `call` with `err`
    pub fn fail_times(&self, call: MockCall, times: usize, err: DriverError) {
        let mut state = self.state();
        let queue = state.failures.entry(call).or_default();
        queue.extend(std::iter::repeat(err).take(times));
    }

    /// Make every call of `call` fail as unsupported
    pub fn mark_unsupported(&self, call: MockCall) {
        self.state().unsupported.insert(call);
    }

    /// Reject lookups using `strategy`
    pub fn reject_strategy(&self, strategy: &str) {
        self.state().rejected_strategies.insert(strategy.to_string());
    }

    /// Reject one vendor command by name
    pub fn reject_vendor_command(&self, name: &str) {
        self.state().rejected_vendor_commands.insert(name.to_string());
    }

    /// Mark the session live or dead
    pub fn set_session_active(&self, active: bool) {
        self.state().session_active = active;
    }

    /// Call history as `kind:detail` strings
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state()
            .history
            .iter()
            .map(|(_, detail)| detail.clone())
            .collect()
    }

    /// Number of calls of `call`
    #[must_use]
    pub fn call_count(&self, call: MockCall) -> usize {
        self.state().history.iter().filter(|(c, _)| *c == call).count()
    }

    /// Whether `call` happened at least once
    #[must_use]
    pub fn was_called(&self, call: MockCall) -> bool {
        self.call_count(call) > 0
    }

    /// Successful swipe gestures, vendor or pointer
    #[must_use]
    pub fn swipe_count(&self) -> u32 {
        self.state().swipes
    }

    /// Text delivered by any typing mechanism, in order
    #[must_use]
    pub fn typed_text(&self) -> Vec<String> {
        self.state().typed.clone()
    }

    /// Successful vendor commands with their parameters
    #[must_use]
    pub fn vendor_commands(&self) -> Vec<(String, serde_json::Value)> {
        self.state().vendor_params.clone()
    }

    /// Successful pointer sequences
    #[must_use]
    pub fn pointer_sequences(&self) -> Vec<PointerSequence> {
        self.state().pointer_sequences.clone()
    }
}

#[async_trait]
impl RemoteDriver for MockDriver {
    async fn find_element(&self, strategy: &str, selector: &str) -> DriverResult<ElementHandle> {
        let mut state = self.state();
        state.record(MockCall::FindElement, format!("find:{strategy}={selector}"))?;
        state.find(strategy, selector)
    }

    async fn is_element_displayed(&self, element: &ElementHandle) -> DriverResult<bool> {
        let mut state = self.state();
        state.record(MockCall::IsDisplayed, format!("displayed:{}", element.id()))?;
        let swipes = state.swipes;
        let found = state.element(element)?;
        Ok(found.displayed && swipes >= found.visible_after_swipes)
    }

    async fn element_text(&self, element: &ElementHandle) -> DriverResult<String> {
        let mut state = self.state();
        state.record(MockCall::ElementText, format!("text:{}", element.id()))?;
        Ok(state.element(element)?.text.clone())
    }

    async fn element_click(&self, element: &ElementHandle) -> DriverResult<()> {
        let mut state = self.state();
        state.record(MockCall::ElementClick, format!("click:{}", element.id()))?;
        state.element(element).map(|_| ())
    }

    async fn element_clear(&self, element: &ElementHandle) -> DriverResult<()> {
        let mut state = self.state();
        state.record(MockCall::ElementClear, format!("clear:{}", element.id()))?;
        state.element(element).map(|_| ())
    }

    async fn element_send_keys(&self, element: &ElementHandle, text: &str) -> DriverResult<()> {
        let mut state = self.state();
        state.record(MockCall::ElementSendKeys, format!("send_keys:{}:{text}", element.id()))?;
        state.element(element)?;
        state.typed.push(text.to_string());
        Ok(())
    }

    async fn window_size(&self) -> DriverResult<WindowSize> {
        let mut state = self.state();
        state.record(MockCall::WindowSize, "window_size".to_string())?;
        Ok(state.window)
    }

    async fn perform_pointer_actions(&self, sequence: &PointerSequence) -> DriverResult<()> {
        let mut state = self.state();
        let kind = if sequence.is_drag() { "swipe" } else { "tap" };
        state.record(MockCall::PointerActions, format!("pointer:{kind}"))?;
        if sequence.is_drag() {
            state.swipes += 1;
        }
        state.pointer_sequences.push(sequence.clone());
        Ok(())
    }

    async fn perform_key_actions(&self, sequence: &KeySequence) -> DriverResult<()> {
        let mut state = self.state();
        let text = sequence.typed_text();
        state.record(MockCall::KeyActions, format!("keys:{text}"))?;
        state.typed.push(text);
        Ok(())
    }

    async fn execute_vendor_command(
        &self,
        name: &str,
        params: serde_json::Value,
    ) -> DriverResult<serde_json::Value> {
        let mut state = self.state();
        state.record(MockCall::VendorCommand, format!("vendor:{name}"))?;
        if state.rejected_vendor_commands.contains(name) {
            return Err(DriverError::new(
                DriverErrorKind::Unsupported,
                format!("Unknown mobile command \"{name}\""),
            ));
        }
        if name == VENDOR_SWIPE {
            state.swipes += 1;
        }
        if name == VENDOR_TYPE_TEXT {
            if let Some(text) = params.get("text").and_then(serde_json::Value::as_str) {
                state.typed.push(text.to_string());
            }
        }
        state.vendor_params.push((name.to_string(), params));
        Ok(serde_json::Value::Null)
    }

    async fn hide_keyboard(&self) -> DriverResult<()> {
        self.state().record(MockCall::HideKeyboard, "hide_keyboard".to_string())
    }

    async fn press_key_code(&self, code: u32) -> DriverResult<()> {
        self.state().record(MockCall::PressKeyCode, format!("press_key_code:{code}"))
    }

    fn is_session_active(&self) -> bool {
        self.state().session_active
    }
}
