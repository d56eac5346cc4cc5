use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::debug;

use crate::shutdown::{ShutdownSignal, StopReason};

/// Radar keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    ZoomIn,
    ZoomOut,
}

/// Spawn a thread that polls the keyboard.
///
/// Quit keys (Esc, q, Ctrl+C) trigger `shutdown` directly; zoom keys are
/// forwarded to the frame loop through `actions`.
pub fn spawn_keyboard_monitor(
    shutdown: Arc<ShutdownSignal>,
    actions: Sender<KeyAction>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        debug!("Keyboard monitor started");

        while !shutdown.is_shutdown() {
            if event::poll(Duration::from_millis(100)).unwrap_or(false)
                && let Ok(Event::Key(key_event)) = event::read()
                && let Some(action) = key_action(&key_event)
            {
                if action == KeyAction::Quit {
                    debug!("Quit key pressed: {:?}", key_event.code);
                    shutdown.trigger(StopReason::QuitKey);
                    break;
                }
                if actions.send(action).is_err() {
                    break;
                }
            }
        }

        debug!("Keyboard monitor stopped");
    })
}

fn key_action(event: &KeyEvent) -> Option<KeyAction> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    match event.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(KeyAction::Quit),
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyAction::Quit)
        }
        KeyCode::Up | KeyCode::PageUp => Some(KeyAction::ZoomIn),
        KeyCode::Down | KeyCode::PageDown => Some(KeyAction::ZoomOut),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(
            key_action(&press(KeyCode::Esc, KeyModifiers::NONE)),
            Some(KeyAction::Quit)
        );
        assert_eq!(
            key_action(&press(KeyCode::Char('Q'), KeyModifiers::SHIFT)),
            Some(KeyAction::Quit)
        );
        assert_eq!(
            key_action(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(KeyAction::Quit)
        );
    }

    #[test]
    fn test_zoom_keys() {
        assert_eq!(
            key_action(&press(KeyCode::Up, KeyModifiers::NONE)),
            Some(KeyAction::ZoomIn)
        );
        assert_eq!(
            key_action(&press(KeyCode::PageUp, KeyModifiers::NONE)),
            Some(KeyAction::ZoomIn)
        );
        assert_eq!(
            key_action(&press(KeyCode::Down, KeyModifiers::NONE)),
            Some(KeyAction::ZoomOut)
        );
        assert_eq!(
            key_action(&press(KeyCode::PageDown, KeyModifiers::NONE)),
            Some(KeyAction::ZoomOut)
        );
    }

    #[test]
    fn test_other_keys_ignored() {
        assert_eq!(key_action(&press(KeyCode::Char('c'), KeyModifiers::NONE)), None);
        assert_eq!(key_action(&press(KeyCode::Enter, KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_release_events_ignored() {
        let release = KeyEvent::new_with_kind_and_state(
            KeyCode::Up,
            KeyModifiers::NONE,
            KeyEventKind::Release,
            KeyEventState::NONE,
        );
        assert_eq!(key_action(&release), None);
    }
}
