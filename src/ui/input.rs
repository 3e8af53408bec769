/// Keyboard and mouse state tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement and aiming while a key is held
///   - Edge-triggered jump (only fires on initial press)
///   - Move + jump + fire in the same tick
///
/// The mouse is tracked alongside: last cursor cell, whether the left button
/// is down, and a latch that holds a cursor move until the next tick takes it.
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,

    // ── Mouse ──
    /// Terminal cell (column, row) of the last mouse event.
    pub mouse_cell: Option<(u16, u16)>,
    pub mouse_down: bool,
    /// Cursor moved or a button was used since the last `take_mouse_aim`.
    /// Survives drains so a move between ticks is not lost.
    mouse_aim_pending: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
            mouse_cell: None,
            mouse_down: false,
            mouse_aim_pending: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before simulation tick.
    pub fn drain_events(&mut self) {
        self.begin_frame();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.on_key(key),
                Ok(Event::Mouse(m)) => self.on_mouse(m),
                _ => {}
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Reset per-drain state. Held keys, the cursor and the aim latch persist.
    fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
    }

    fn on_mouse(&mut self, m: MouseEvent) {
        self.mouse_cell = Some((m.column, m.row));
        self.mouse_aim_pending = true;
        match m.kind {
            MouseEventKind::Down(MouseButton::Left)
            | MouseEventKind::Drag(MouseButton::Left) => self.mouse_down = true,
            MouseEventKind::Up(MouseButton::Left) => self.mouse_down = false,
            _ => {}
        }
    }

    /// Cursor cell if the mouse moved since the last call, then clear the latch.
    pub fn take_mouse_aim(&mut self) -> Option<(u16, u16)> {
        if !std::mem::take(&mut self.mouse_aim_pending) {
            return None;
        }
        self.mouse_cell
    }

    fn on_key(&mut self, key: KeyEvent) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Not trusted without enhancement; timeout expiry handles it
            }
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, Instant::now());
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    /// Convenience: is any of these keys held?
    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        use crossterm::event::KeyModifiers;
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent { kind, column, row, modifiers: KeyModifiers::NONE }
    }

    #[test]
    fn mouse_move_survives_frames_without_a_tick() {
        let mut kb = InputState::new();
        kb.on_mouse(mouse(MouseEventKind::Moved, 5, 3));
        // Later passes drain nothing before the tick runs
        kb.begin_frame();
        kb.begin_frame();
        assert_eq!(kb.take_mouse_aim(), Some((5, 3)));
        assert_eq!(kb.take_mouse_aim(), None);
        assert_eq!(kb.mouse_cell, Some((5, 3)));
    }

    #[test]
    fn latest_cursor_cell_wins() {
        let mut kb = InputState::new();
        kb.on_mouse(mouse(MouseEventKind::Moved, 1, 1));
        kb.begin_frame();
        kb.on_mouse(mouse(MouseEventKind::Moved, 9, 4));
        assert_eq!(kb.take_mouse_aim(), Some((9, 4)));
    }

    #[test]
    fn left_button_tracks_down_drag_up() {
        let mut kb = InputState::new();
        assert_eq!(kb.take_mouse_aim(), None);
        kb.on_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 2, 2));
        assert!(kb.mouse_down);
        kb.on_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 3, 2));
        assert!(kb.mouse_down);
        kb.on_mouse(mouse(MouseEventKind::Down(MouseButton::Right), 3, 2));
        assert!(kb.mouse_down);
        kb.on_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 3, 2));
        assert!(!kb.mouse_down);
    }
}
