//! W3C input action sequences.
//!
//! Pointer and key sequences serialize to the `actions` payload of the W3C
//! Perform Actions command, so adapters can forward them unchanged.

use crate::driver::{ElementHandle, ELEMENT_KEY};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Input source id used for touch gestures
pub const TOUCH_POINTER_ID: &str = "finger1";

/// Input source id used for synthesized key events
pub const KEYBOARD_ID: &str = "keyboard1";

/// Pause between pointer down and up for a plain tap
pub const TAP_PRESS_MS: u64 = 10;

/// 2D point in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// Pointer actions
// ============================================================================

/// Coordinate origin of a pointer move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerOrigin {
    /// Absolute viewport coordinates
    Viewport,
    /// Offset from the element's centre
    Element(ElementHandle),
}

impl Serialize for PointerOrigin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Viewport => serializer.serialize_str("viewport"),
            Self::Element(handle) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(ELEMENT_KEY, handle.id())?;
                map.end()
            }
        }
    }
}

/// One pointer action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerAction {
    /// Move the pointer
    PointerMove {
        /// Duration of the move in ms
        duration: u64,
        /// X offset or coordinate
        x: i64,
        /// Y offset or coordinate
        y: i64,
        /// Coordinate origin
        origin: PointerOrigin,
    },
    /// Press
    PointerDown {
        /// Button index
        button: u8,
    },
    /// Release
    PointerUp {
        /// Button index
        button: u8,
    },
    /// Hold still
    Pause {
        /// Pause length in ms
        duration: u64,
    },
}

/// Pointer device type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerType {
    /// Touch screen
    Touch,
    /// Mouse
    Mouse,
}

/// Pointer input source parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerParameters {
    /// Device type
    pub pointer_type: PointerType,
}

/// W3C pointer input source with its actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "pointer")]
pub struct PointerSequence {
    /// Input source id
    pub id: String,
    /// Device parameters
    pub parameters: PointerParameters,
    /// Actions in order
    pub actions: Vec<PointerAction>,
}

impl PointerSequence {
    /// Empty touch sequence
    #[must_use]
    pub fn touch() -> Self {
        Self {
            id: TOUCH_POINTER_ID.to_string(),
            parameters: PointerParameters {
                pointer_type: PointerType::Touch,
            },
            actions: Vec::new(),
        }
    }

    /// Append an action
    #[must_use]
    pub fn then(mut self, action: PointerAction) -> Self {
        self.actions.push(action);
        self
    }

    fn move_to(self, x: i64, y: i64, duration: u64, origin: PointerOrigin) -> Self {
        self.then(PointerAction::PointerMove {
            duration,
            x,
            y,
            origin,
        })
    }

    fn press(self) -> Self {
        self.then(PointerAction::PointerDown { button: 0 })
    }

    fn release(self) -> Self {
        self.then(PointerAction::PointerUp { button: 0 })
    }

    fn pause(self, duration: u64) -> Self {
        self.then(PointerAction::Pause { duration })
    }

    /// Tap centred on an element
    #[must_use]
    pub fn tap_element(element: &ElementHandle) -> Self {
        Self::touch()
            .move_to(0, 0, 0, PointerOrigin::Element(element.clone()))
            .press()
            .pause(TAP_PRESS_MS)
            .release()
    }

    /// Tap at a viewport point
    #[must_use]
    pub fn tap_point(point: Point) -> Self {
        Self::touch()
            .move_to(px(point.x), px(point.y), 0, PointerOrigin::Viewport)
            .press()
            .pause(TAP_PRESS_MS)
            .release()
    }

    /// Press and hold on an element
    #[must_use]
    pub fn long_press_element(element: &ElementHandle, duration_ms: u64) -> Self {
        Self::touch()
            .move_to(0, 0, 0, PointerOrigin::Element(element.clone()))
            .press()
            .pause(duration_ms)
            .release()
    }

    /// Drag from `start` to `end` over `duration_ms`
    #[must_use]
    pub fn swipe(start: Point, end: Point, duration_ms: u64) -> Self {
        Self::touch()
            .move_to(px(start.x), px(start.y), 0, PointerOrigin::Viewport)
            .press()
            .move_to(px(end.x), px(end.y), duration_ms, PointerOrigin::Viewport)
            .release()
    }

    /// Whether the pointer moves while pressed
    #[must_use]
    pub fn is_drag(&self) -> bool {
        let mut pressed = false;
        for action in &self.actions {
            match action {
                PointerAction::PointerDown { .. } => pressed = true,
                PointerAction::PointerUp { .. } => pressed = false,
                PointerAction::PointerMove { .. } if pressed => return true,
                _ => {}
            }
        }
        false
    }
}

fn px(value: f64) -> i64 {
    value.round() as i64
}

// ============================================================================
// Key actions
// ============================================================================

/// One key action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum KeyAction {
    /// Key press
    KeyDown {
        /// Key value (one character)
        value: String,
    },
    /// Key release
    KeyUp {
        /// Key value (one character)
        value: String,
    },
    /// Hold still
    Pause {
        /// Pause length in ms
        duration: u64,
    },
}

/// W3C key input source with its actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "key")]
pub struct KeySequence {
    /// Input source id
    pub id: String,
    /// Actions in order
    pub actions: Vec<KeyAction>,
}

impl KeySequence {
    /// keyDown/keyUp pair for every character of `text`
    #[must_use]
    pub fn type_text(text: &str) -> Self {
        let actions = text
            .chars()
            .flat_map(|ch| {
                let value = ch.to_string();
                [
                    KeyAction::KeyDown {
                        value: value.clone(),
                    },
                    KeyAction::KeyUp { value },
                ]
            })
            .collect();
        Self {
            id: KEYBOARD_ID.to_string(),
            actions,
        }
    }

    /// Text produced by the keyDown events
    #[must_use]
    pub fn typed_text(&self) -> String {
        self.actions
            .iter()
            .filter_map(|action| match action {
                KeyAction::KeyDown { value } => Some(value.as_str()),
                _ => None,
            })
            .collect()
    }
}
