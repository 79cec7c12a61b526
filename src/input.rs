use crate::model::PetAction;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

/// Which screen currently owns the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scene {
    Main,
    Chat,
    Help,
    Recap,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Act(PetAction),
    Revive,
    OpenChat,
    ChatChar(char),
    ChatBackspace,
    ChatSend,
    HelpToggle,
    DismissRecap,
    Back,
    Quit,
}

#[derive(Clone, Debug)]
pub(crate) struct InputEvent {
    pub(crate) key: KeyCode,
    pub(crate) mods: KeyModifiers,
}

impl InputEvent {
    #[cfg(test)]
    pub(crate) fn key(key: KeyCode) -> Self {
        Self {
            key,
            mods: KeyModifiers::NONE,
        }
    }
}

pub(crate) fn collect_input_nonblocking(max_wait: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // first poll may wait out the frame; later ones only drain what is queued
    let mut timeout = max_wait;
    while event::poll(timeout)? {
        timeout = Duration::ZERO;
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                out.push(InputEvent {
                    key: k.code,
                    mods: k.modifiers,
                });
                if out.len() >= 32 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_command(scene: Scene, dead: bool, ev: &InputEvent) -> Option<Command> {
    if ev.mods.contains(KeyModifiers::CONTROL) && matches!(ev.key, KeyCode::Char('c')) {
        return Some(Command::Quit);
    }

    // the chat line swallows letters, so none of the global keys apply
    if scene == Scene::Chat {
        return match ev.key {
            KeyCode::Enter => Some(Command::ChatSend),
            KeyCode::Esc => Some(Command::Back),
            KeyCode::Backspace => Some(Command::ChatBackspace),
            KeyCode::Char(ch) if !ch.is_control() => Some(Command::ChatChar(ch)),
            _ => None,
        };
    }

    match ev.key {
        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
            return Some(Command::HelpToggle)
        }
        KeyCode::Char('q') | KeyCode::Char('Q') => return Some(Command::Quit),
        _ => {}
    }

    match scene {
        Scene::Recap => match ev.key {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ') => Some(Command::DismissRecap),
            _ => None,
        },
        Scene::Help => match ev.key {
            KeyCode::Esc => Some(Command::Back),
            _ => None,
        },
        Scene::Main if dead => match ev.key {
            KeyCode::Char('n') | KeyCode::Char('N') => Some(Command::Revive),
            _ => None,
        },
        Scene::Main => match ev.key {
            KeyCode::Char('f') | KeyCode::Char('F') => Some(Command::Act(PetAction::Feed)),
            KeyCode::Char('p') | KeyCode::Char('P') => Some(Command::Act(PetAction::Play)),
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Command::Act(PetAction::Clean)),
            KeyCode::Char('s') | KeyCode::Char('S') => Some(Command::Act(PetAction::ToggleSleep)),
            KeyCode::Char('t') | KeyCode::Char('T') | KeyCode::Enter => Some(Command::OpenChat),
            KeyCode::Esc => Some(Command::Back),
            _ => None,
        },
        Scene::Chat => None,
    }
}
