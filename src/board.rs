// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! A board: pages of buttons that play clips, with their hotkeys committed and routed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::{self, ConfigError};
use crate::hotkeys::{
    self, ButtonId, ChordEvent, Conflict, ConflictReport, HotkeyBinding, HotkeyDispatcher,
    HotkeyError, HotkeyRegistrar, HotkeySlots, OtherButton, Scope,
};
use crate::playback::{Playback, PlaybackError, PlaybackSession, StartOptions};

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("no button with ID {0}")]
    UnknownButton(ButtonId),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// A page of buttons, in board order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    name: String,
    buttons: Vec<ButtonId>,
}

impl Page {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The IDs of the buttons on the page, in order.
    pub fn buttons(&self) -> &[ButtonId] {
        &self.buttons
    }
}

/// A button on a board.
pub struct Button {
    id: ButtonId,
    page: String,
    name: String,
    /// The clip path as written in the board file.
    clip: String,
    path: PathBuf,
    looping: Option<bool>,
    hotkeys: Mutex<HotkeySlots>,
}

impl Button {
    pub fn id(&self) -> ButtonId {
        self.id
    }

    /// The name of the page the button is on.
    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved path of the button's clip.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn looping(&self) -> bool {
        self.looping.unwrap_or(true)
    }

    /// The button's committed hotkeys.
    pub fn hotkeys(&self) -> HotkeySlots {
        self.hotkeys.lock().clone()
    }

    fn to_config(&self) -> config::Button {
        let hotkeys = self.hotkeys();
        config::Button {
            name: self.name.clone(),
            path: self.clip.clone(),
            local_hotkey: hotkeys.local.map(|binding| binding.chord()),
            global_hotkey: hotkeys.global.map(|binding| binding.chord()),
            looping: self.looping,
        }
    }
}

/// The outcome of changing a button's hotkeys.
#[derive(Debug, Default)]
pub struct HotkeyUpdate {
    /// Conflicts found. A slot with a conflict is left empty.
    pub conflicts: ConflictReport,
    /// Slots the registrar refused. These are left empty too.
    pub errors: Vec<HotkeyError>,
}

impl HotkeyUpdate {
    /// True if both candidates were committed.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty() && self.errors.is_empty()
    }
}

/// A loaded board.
pub struct Board {
    pages: Vec<Page>,
    buttons: Vec<Button>,
    playback: Arc<Playback>,
    registrar: Arc<dyn HotkeyRegistrar>,
    dispatcher: HotkeyDispatcher,
    focused: AtomicBool,
    /// Conflicts found while loading, by the button whose hotkey was skipped.
    load_conflicts: Vec<(ButtonId, Conflict)>,
}

impl Board {
    /// Loads a board file. Clip paths are resolved relative to the board file.
    pub fn load(
        path: &Path,
        playback: Arc<Playback>,
        registrar: Arc<dyn HotkeyRegistrar>,
    ) -> Result<Board, ConfigError> {
        let board = config::Board::load(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Board::new(board, base_dir, playback, registrar))
    }

    /// Builds a board, committing each button's hotkeys in order. A hotkey that conflicts with
    /// one committed earlier is skipped with a warning.
    pub fn new(
        board: config::Board,
        base_dir: &Path,
        playback: Arc<Playback>,
        registrar: Arc<dyn HotkeyRegistrar>,
    ) -> Board {
        let mut loaded = Board {
            pages: Vec::new(),
            buttons: Vec::new(),
            playback,
            registrar,
            dispatcher: HotkeyDispatcher::new(),
            focused: AtomicBool::new(true),
            load_conflicts: Vec::new(),
        };

        for page in board.pages {
            let mut ids = Vec::with_capacity(page.buttons.len());
            for button in page.buttons {
                let id = loaded.buttons.len();
                ids.push(id);
                let path = PathBuf::from(&button.path);
                loaded.buttons.push(Button {
                    id,
                    page: page.name.clone(),
                    looping: button.looping,
                    name: button.name,
                    path: if path.is_relative() {
                        base_dir.join(path)
                    } else {
                        path
                    },
                    clip: button.path,
                    hotkeys: Mutex::new(HotkeySlots::default()),
                });

                let local = button
                    .local_hotkey
                    .map(|chord| HotkeyBinding::from_chord(chord, Scope::Local));
                let global = button
                    .global_hotkey
                    .map(|chord| HotkeyBinding::from_chord(chord, Scope::Global));
                let update = loaded.update_hotkeys(id, local, global);
                loaded
                    .load_conflicts
                    .extend(update.conflicts.into_iter().map(|conflict| (id, conflict)));
            }
            loaded.pages.push(Page {
                name: page.name,
                buttons: ids,
            });
        }

        info!(
            pages = loaded.pages.len(),
            buttons = loaded.buttons.len(),
            hotkeys = loaded.dispatcher.len(),
            conflicts = loaded.load_conflicts.len(),
            "Loaded board."
        );
        loaded
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn button(&self, id: ButtonId) -> Option<&Button> {
        self.buttons.get(id)
    }

    /// Finds a button by name, ignoring case.
    pub fn find(&self, name: &str) -> Option<&Button> {
        self.buttons
            .iter()
            .find(|button| button.name.eq_ignore_ascii_case(name))
    }

    /// The pages in board order, including empty ones.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Hotkey conflicts found while loading the board.
    pub fn conflicts(&self) -> &[(ButtonId, Conflict)] {
        &self.load_conflicts
    }

    pub fn playback(&self) -> &Arc<Playback> {
        &self.playback
    }

    /// Sets whether the application has focus, which decides if local hotkeys fire.
    pub fn set_focused(&self, focused: bool) {
        self.focused.store(focused, Ordering::Relaxed);
    }

    pub fn focused(&self) -> bool {
        self.focused.load(Ordering::Relaxed)
    }

    /// Changes a button's hotkeys. Each slot is validated against every other button and
    /// committed on its own; a slot that conflicts or can't be registered ends up empty.
    pub fn set_hotkeys(
        &self,
        id: ButtonId,
        local: Option<HotkeyBinding>,
        global: Option<HotkeyBinding>,
    ) -> Result<HotkeyUpdate, BoardError> {
        if id >= self.buttons.len() {
            return Err(BoardError::UnknownButton(id));
        }
        Ok(self.update_hotkeys(id, local, global))
    }

    fn update_hotkeys(
        &self,
        id: ButtonId,
        local: Option<HotkeyBinding>,
        global: Option<HotkeyBinding>,
    ) -> HotkeyUpdate {
        let Some(button) = self.buttons.get(id) else {
            return HotkeyUpdate::default();
        };

        let conflicts = hotkeys::validate(local.as_ref(), global.as_ref(), id, &self.others(id));
        for conflict in conflicts.iter() {
            warn!(button = button.name, %conflict, "Hotkey conflict.");
        }
        let local = local.filter(|_| !conflicts.blocks(Scope::Local));
        let global = global.filter(|_| !conflicts.blocks(Scope::Global));

        let mut slots = button.hotkeys.lock();
        let errors = slots.commit(self.registrar.as_ref(), id, local, global);
        self.dispatcher.set(id, &slots);

        HotkeyUpdate { conflicts, errors }
    }

    /// Every button except `id`, as the conflict validator sees them.
    fn others(&self, id: ButtonId) -> Vec<OtherButton> {
        self.buttons
            .iter()
            .filter(|button| button.id != id)
            .map(|button| OtherButton {
                id: button.id,
                name: button.name.clone(),
                hotkeys: button.hotkeys(),
            })
            .collect()
    }

    /// Starts playing the button's clip.
    pub fn trigger(&self, id: ButtonId) -> Result<Arc<PlaybackSession>, BoardError> {
        let button = self.button(id).ok_or(BoardError::UnknownButton(id))?;
        info!(button = button.name, page = button.page, "Triggered button.");
        Ok(self.playback.start_with(
            &button.path,
            StartOptions {
                looping: button.looping(),
            },
        )?)
    }

    /// Triggers every button whose hotkey matches the event.
    pub fn handle_chord(
        &self,
        event: &ChordEvent,
    ) -> Vec<(ButtonId, Result<Arc<PlaybackSession>, BoardError>)> {
        self.dispatcher
            .dispatch(event, self.focused())
            .into_iter()
            .map(|id| (id, self.trigger(id)))
            .collect()
    }

    /// Stops every playing clip.
    pub fn stop_all(&self) -> usize {
        self.playback.stop_all()
    }

    /// The board as it would be written back out. Clip paths are written as they were loaded
    /// and only committed hotkeys are written.
    pub fn to_config(&self) -> config::Board {
        config::Board {
            pages: self
                .pages
                .iter()
                .map(|page| config::Page {
                    name: page.name.clone(),
                    buttons: page
                        .buttons
                        .iter()
                        .filter_map(|id| self.buttons.get(*id))
                        .map(Button::to_config)
                        .collect(),
                })
                .collect(),
        }
    }
}

impl Drop for Board {
    fn drop(&mut self) {
        for button in &self.buttons {
            button
                .hotkeys
                .lock()
                .clear(self.registrar.as_ref(), button.id);
        }
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    use tempfile::tempdir;

    use super::*;
    use crate::audio::mock;
    use crate::audio::source::MemorySource;
    use crate::hotkeys::{parse, MemoryRegistrar};
    use crate::playback::MemoryResolver;

    const BOARD: &str = r#"
pages:
  - name: Drums
    buttons:
      - name: Clap
        path: clap.wav
        local_hotkey: Ctrl + 1
        global_hotkey: Ctrl + Alt + 1
      - name: Kick
        path: kick.wav
        local_hotkey: Ctrl + 2
        looping: false
  - name: Effects
    buttons:
      - name: Horn
        path: /sounds/horn.wav
        global_hotkey: Ctrl + 2
"#;

    fn setup(dir: &Path) -> (Arc<Playback>, Arc<MemoryRegistrar>) {
        let resolver = MemoryResolver::new();
        for clip in ["clap.wav", "kick.wav"] {
            resolver.insert(dir.join(clip), MemorySource::new(vec![0.5; 8000], 1, 8000));
        }
        resolver.insert("/sounds/horn.wav", MemorySource::new(vec![0.5; 8000], 1, 8000));
        let playback = Arc::new(Playback::with_resolver(
            Arc::new(mock::Device::get("mock")),
            Arc::new(resolver),
        ));
        (playback, Arc::new(MemoryRegistrar::new()))
    }

    fn load(dir: &Path) -> Result<(Board, Arc<MemoryRegistrar>), ConfigError> {
        let path = dir.join("board.yaml");
        fs::write(&path, BOARD)?;
        let (playback, registrar) = setup(dir);
        Ok((Board::load(&path, playback, registrar.clone())?, registrar))
    }

    #[test]
    fn test_load() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let (board, registrar) = load(dir.path())?;

        let pages: Vec<&str> = board.pages().iter().map(Page::name).collect();
        assert_eq!(vec!["Drums", "Effects"], pages);
        assert_eq!(2, board.pages()[0].buttons().len());
        assert_eq!(3, board.buttons().len());

        let clap = board.find("clap").unwrap();
        assert_eq!(dir.path().join("clap.wav"), clap.path());
        assert!(clap.looping());
        assert_eq!(parse("Ctrl + 1"), clap.hotkeys().local);

        let horn = board.find("Horn").unwrap();
        assert_eq!(Path::new("/sounds/horn.wav"), horn.path());
        assert_eq!("Effects", horn.page());

        // Horn's global hotkey collides with Kick's local one and is skipped.
        assert_eq!(None, horn.hotkeys().global);
        assert_eq!(1, board.conflicts().len());
        let (owner, conflict) = &board.conflicts()[0];
        assert_eq!(horn.id(), *owner);
        assert!(matches!(
            conflict,
            Conflict::Taken { owner_name, .. } if owner_name == "Kick"
        ));

        assert_eq!(3, registrar.len());
        drop(board);
        assert!(registrar.is_empty());
        Ok(())
    }

    #[test]
    fn test_trigger_and_chords() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let (board, _) = load(dir.path())?;

        let kick = board.find("Kick").unwrap().id();
        let session = board.trigger(kick)?;
        assert!(!session.looping());
        assert!(matches!(
            board.trigger(99),
            Err(BoardError::UnknownButton(99))
        ));

        let chord = parse("Ctrl + 1").unwrap().chord();
        let triggered = board.handle_chord(&ChordEvent::local(chord));
        assert_eq!(1, triggered.len());
        assert_eq!(board.find("Clap").unwrap().id(), triggered[0].0);
        assert!(triggered[0].1.is_ok());
        assert_eq!(2, board.playback().sessions().len());

        // Unfocused, only the global hotkey fires.
        board.set_focused(false);
        assert!(board.handle_chord(&ChordEvent::local(chord)).is_empty());
        let global = parse("Ctrl + Alt + 1").unwrap().chord();
        assert_eq!(1, board.handle_chord(&ChordEvent::global(global)).len());

        assert_eq!(3, board.stop_all());
        assert!(board.playback().sessions().is_empty());
        Ok(())
    }

    #[test]
    fn test_set_hotkeys() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let (board, registrar) = load(dir.path())?;
        let horn = board.find("Horn").unwrap().id();

        // Ctrl + 1 belongs to Clap; F5 is free.
        let update = board.set_hotkeys(
            horn,
            parse("Ctrl + 1"),
            parse("F5").map(|b| b.with_scope(Scope::Global)),
        )?;
        assert!(!update.is_clean());
        assert!(update.conflicts.blocks(Scope::Local));
        assert!(!update.conflicts.blocks(Scope::Global));
        let hotkeys = board.button(horn).unwrap().hotkeys();
        assert_eq!(None, hotkeys.local);
        assert_eq!(Some(parse("F5").unwrap().chord()), hotkeys.global.map(|b| b.chord()));
        assert_eq!(Some(horn), registrar.holder(&parse("F5").unwrap().chord()));

        // A self conflict blocks both slots.
        let update = board.set_hotkeys(horn, parse("F6"), parse("F6"))?;
        assert!(update.conflicts.has_self_conflict());
        assert_eq!(HotkeySlots::default(), board.button(horn).unwrap().hotkeys());
        assert_eq!(None, registrar.holder(&parse("F5").unwrap().chord()));

        assert!(board.set_hotkeys(horn, parse("F7"), None)?.is_clean());
        assert!(matches!(
            board.set_hotkeys(42, None, None),
            Err(BoardError::UnknownButton(42))
        ));
        Ok(())
    }

    #[test]
    fn test_to_config() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let (board, _) = load(dir.path())?;
        let saved = board.to_config();

        assert_eq!(2, saved.pages.len());
        assert_eq!(2, saved.pages[0].buttons.len());
        assert_eq!("clap.wav", saved.pages[0].buttons[0].path);
        assert_eq!(None, saved.pages[0].buttons[0].looping);
        assert_eq!(None, saved.pages[1].buttons[0].global_hotkey);
        assert_eq!(Some(false), saved.pages[0].buttons[1].looping);

        let path = dir.path().join("saved.yaml");
        saved.save(&path)?;
        assert_eq!(saved, config::Board::load(&path)?);
        Ok(())
    }

    #[test]
    fn test_keeps_empty_and_repeated_pages() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("board.yaml");
        fs::write(
            &path,
            r#"
pages:
  - name: Drums
    buttons:
      - name: Clap
        path: clap.wav
        local_hotkey: Ctrl + 1
  - name: Empty
  - name: Drums
    buttons:
      - name: Kick
        path: kick.wav
        global_hotkey: Ctrl + 2
        looping: false
"#,
        )?;
        let config = config::Board::load(&path)?;
        let (playback, registrar) = setup(dir.path());
        let board = Board::load(&path, playback, registrar)?;

        let pages: Vec<&str> = board.pages().iter().map(Page::name).collect();
        assert_eq!(vec!["Drums", "Empty", "Drums"], pages);
        assert!(board.pages()[1].buttons().is_empty());
        assert_eq!(&[board.find("Kick").unwrap().id()], board.pages()[2].buttons());

        assert_eq!(config, board.to_config());
        Ok(())
    }
}
