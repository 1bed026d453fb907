use std::collections::HashMap;
use std::io;
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use log::{debug, error};

use crate::constants::KEY_HOLD_WINDOW;
use crate::entities::Steering;

pub trait InputSource {
    /// Drains every event available for this frame without blocking.
    fn poll_events(&mut self, frame: u64) -> io::Result<Vec<Event>>;
}

// --- Live terminal input ---
pub struct TerminalInput;

impl InputSource for TerminalInput {
    fn poll_events(&mut self, _frame: u64) -> io::Result<Vec<Event>> {
        let mut events = Vec::new();
        while event::poll(Duration::ZERO).map_err(|e| { error!("Failed to poll event: {}", e); e })? {
            events.push(event::read().map_err(|e| { error!("Failed to read event: {}", e); e })?);
        }
        Ok(events)
    }
}

// --- SimulatedInput for scripted runs ---
#[derive(Default)]
pub struct SimulatedInput {
    events: HashMap<u64, Vec<Event>>,
}

impl SimulatedInput {
    pub fn new() -> Self {
        SimulatedInput::default()
    }

    pub fn event_at(mut self, frame: u64, event: Event) -> Self {
        self.events.entry(frame).or_default().push(event);
        self
    }

    pub fn key_at(self, frame: u64, code: KeyCode) -> Self {
        self.event_at(frame, Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    /// Presses `code` on every frame in `frames`, as terminal key-repeat would.
    pub fn hold(mut self, frames: std::ops::Range<u64>, code: KeyCode) -> Self {
        for frame in frames {
            self = self.key_at(frame, code);
        }
        self
    }

    pub fn pointer_at(self, frame: u64, column: u16, row: u16) -> Self {
        self.event_at(frame, mouse(MouseEventKind::Moved, column, row))
    }

    pub fn click_at(self, frame: u64, column: u16, row: u16) -> Self {
        self.event_at(frame, mouse(MouseEventKind::Down(MouseButton::Left), column, row))
    }
}

fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
    Event::Mouse(MouseEvent { kind, column, row, modifiers: KeyModifiers::NONE })
}

impl InputSource for SimulatedInput {
    fn poll_events(&mut self, frame: u64) -> io::Result<Vec<Event>> {
        Ok(self.events.remove(&frame).unwrap_or_default())
    }
}

// --- Held-key tracking ---
/// Terminals report presses (and OS key-repeat) but rarely releases, so a key
/// counts as held while its last press or repeat is at most
/// `KEY_HOLD_WINDOW` frames old. Release events, when the terminal sends
/// them, drop the key at once.
#[derive(Default)]
pub struct KeyTracker {
    last_seen: HashMap<KeyCode, u64>,
}

impl KeyTracker {
    pub fn record(&mut self, code: KeyCode, kind: KeyEventKind, frame: u64) {
        match kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                self.last_seen.insert(code, frame);
            }
            KeyEventKind::Release => {
                self.last_seen.remove(&code);
            }
        }
    }

    pub fn is_held(&self, code: KeyCode, frame: u64) -> bool {
        self.last_seen
            .get(&code)
            .map(|&last| frame.saturating_sub(last) <= KEY_HOLD_WINDOW)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode], frame: u64) -> bool {
        codes.iter().any(|&code| self.is_held(code, frame))
    }

    pub fn clear(&mut self) {
        self.last_seen.clear();
    }
}

/// Last known pointer cell plus whether the left button went down this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pointer {
    pub position: Option<(u16, u16)>,
    pub clicked: bool,
}

/// What happened during one poll, already normalized.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameEvents {
    /// Newly pressed keys, letters lower-cased.
    pub pressed: Vec<KeyCode>,
    pub close_requested: bool,
    pub resized: Option<(u16, u16)>,
}

impl FrameEvents {
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.pressed.contains(&code)
    }
}

fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

pub const LEFT_KEYS: [KeyCode; 2] = [KeyCode::Left, KeyCode::Char('a')];
pub const RIGHT_KEYS: [KeyCode; 2] = [KeyCode::Right, KeyCode::Char('d')];

pub struct InputState {
    source: Box<dyn InputSource>,
    keys: KeyTracker,
    pointer: Pointer,
}

impl InputState {
    pub fn new(source: Box<dyn InputSource>) -> Self {
        InputState { source, keys: KeyTracker::default(), pointer: Pointer::default() }
    }

    pub fn poll(&mut self, frame: u64) -> io::Result<FrameEvents> {
        let mut events = FrameEvents::default();
        self.pointer.clicked = false;

        for event in self.source.poll_events(frame)? {
            match event {
                Event::Key(KeyEvent { code, modifiers, kind, .. }) => {
                    let code = normalize(code);
                    self.keys.record(code, kind, frame);
                    if kind != KeyEventKind::Press {
                        continue;
                    }
                    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
                        debug!("Ctrl+C received, closing");
                        events.close_requested = true;
                    } else {
                        events.pressed.push(code);
                    }
                }
                Event::Mouse(MouseEvent { kind, column, row, .. }) => match kind {
                    MouseEventKind::Down(MouseButton::Left) => {
                        self.pointer.position = Some((column, row));
                        self.pointer.clicked = true;
                    }
                    MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                        self.pointer.position = Some((column, row));
                    }
                    _ => {}
                },
                Event::Resize(width, height) => events.resized = Some((width, height)),
                _ => {}
            }
        }
        Ok(events)
    }

    pub fn steering(&self, frame: u64) -> Steering {
        Steering {
            left: self.keys.any_held(&LEFT_KEYS, frame),
            right: self.keys.any_held(&RIGHT_KEYS, frame),
        }
    }

    pub fn pointer(&self) -> Pointer {
        self.pointer
    }

    /// Forgets held keys, e.g. when leaving the game for a menu.
    pub fn release_all(&mut self) {
        self.keys.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_stays_held_within_window() {
        let mut keys = KeyTracker::default();
        keys.record(KeyCode::Left, KeyEventKind::Press, 10);
        assert!(keys.is_held(KeyCode::Left, 10));
        assert!(keys.is_held(KeyCode::Left, 10 + KEY_HOLD_WINDOW));
        assert!(!keys.is_held(KeyCode::Left, 11 + KEY_HOLD_WINDOW));
    }

    #[test]
    fn release_drops_key_immediately() {
        let mut keys = KeyTracker::default();
        keys.record(KeyCode::Char('d'), KeyEventKind::Press, 3);
        keys.record(KeyCode::Char('d'), KeyEventKind::Release, 4);
        assert!(!keys.is_held(KeyCode::Char('d'), 4));
    }

    #[test]
    fn poll_normalizes_keys_and_tracks_steering() {
        let source = SimulatedInput::new().key_at(1, KeyCode::Char('A')).key_at(1, KeyCode::Char('P'));
        let mut input = InputState::new(Box::new(source));
        let events = input.poll(1).unwrap();
        assert!(events.was_pressed(KeyCode::Char('p')));
        assert_eq!(input.steering(1), Steering { left: true, right: false });
        assert_eq!(input.steering(2 + KEY_HOLD_WINDOW), Steering::default());
    }

    #[test]
    fn ctrl_c_requests_close() {
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        let mut input = InputState::new(Box::new(SimulatedInput::new().event_at(0, ctrl_c)));
        let events = input.poll(0).unwrap();
        assert!(events.close_requested);
        assert!(events.pressed.is_empty());
    }

    #[test]
    fn click_lasts_one_frame() {
        let source = SimulatedInput::new().pointer_at(0, 3, 4).click_at(1, 5, 6);
        let mut input = InputState::new(Box::new(source));
        input.poll(0).unwrap();
        assert_eq!(input.pointer(), Pointer { position: Some((3, 4)), clicked: false });
        input.poll(1).unwrap();
        assert_eq!(input.pointer(), Pointer { position: Some((5, 6)), clicked: true });
        input.poll(2).unwrap();
        assert_eq!(input.pointer(), Pointer { position: Some((5, 6)), clicked: false });
    }

    #[test]
    fn resize_is_reported() {
        let source = SimulatedInput::new().event_at(0, Event::Resize(100, 30));
        let mut input = InputState::new(Box::new(source));
        assert_eq!(input.poll(0).unwrap().resized, Some((100, 30)));
    }
}
