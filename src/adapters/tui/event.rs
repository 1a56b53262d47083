use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    // Application
    Quit,
    ShowHelp,
    CloseModal,

    // Wizard steps
    NextStep,
    PreviousStep,
    SaveDraft,

    // Field navigation
    NextField,
    PreviousField,
    CycleForward,
    CycleBackward,

    // Input handling
    Character(char),
    Backspace,
    Delete,
    Enter,
}

pub struct EventHandler {
    should_quit: bool,
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler {
    pub fn new() -> Self {
        Self { should_quit: false }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Waits up to 100ms for a key press.
    pub async fn next_event(&mut self) -> Result<Option<AppEvent>> {
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                    Ok(self.handle_key_event(key_event))
                }
                _ => Ok(None),
            }
        } else {
            Ok(None)
        }
    }

    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> Option<AppEvent> {
        let event = match (key_event.code, key_event.modifiers) {
            (KeyCode::Char('c') | KeyCode::Char('q'), KeyModifiers::CONTROL) => {
                self.should_quit = true;
                AppEvent::Quit
            }

            (KeyCode::F(1), _) => AppEvent::ShowHelp,
            (KeyCode::Esc, _) => AppEvent::CloseModal,

            // Steps
            (KeyCode::Char('n'), KeyModifiers::CONTROL) | (KeyCode::PageDown, _) => {
                AppEvent::NextStep
            }
            (KeyCode::Char('b'), KeyModifiers::CONTROL) | (KeyCode::PageUp, _) => {
                AppEvent::PreviousStep
            }
            (KeyCode::Char('s'), KeyModifiers::CONTROL) => AppEvent::SaveDraft,

            // Fields
            (KeyCode::Tab, _) | (KeyCode::Down, _) => AppEvent::NextField,
            (KeyCode::BackTab, _) | (KeyCode::Up, _) => AppEvent::PreviousField,
            (KeyCode::Right, _) => AppEvent::CycleForward,
            (KeyCode::Left, _) => AppEvent::CycleBackward,

            // Input characters
            (KeyCode::Char(c), KeyModifiers::NONE) => AppEvent::Character(c),
            (KeyCode::Char(c), KeyModifiers::SHIFT) => {
                AppEvent::Character(c.to_uppercase().next().unwrap_or(c))
            }
            (KeyCode::Backspace, _) => AppEvent::Backspace,
            (KeyCode::Delete, _) => AppEvent::Delete,
            (KeyCode::Enter, _) => AppEvent::Enter,

            _ => return None,
        };
        Some(event)
    }
}
