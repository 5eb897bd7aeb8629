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

use std::io;
use std::sync::Arc;

use tokio::sync::mpsc::{self, Sender};
use tokio::task::{self, JoinError, JoinHandle};
use tracing::{error, info, span, Instrument, Level};

use crate::board::Board;
use crate::hotkeys::{ChordEvent, KeyEventSource};

pub mod keyboard;

/// Controller events that will trigger behavior on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A chord was pressed. Triggers every button bound to it.
    Chord(ChordEvent),

    /// Stops every playing clip.
    StopAll,

    /// Logs the clips that are playing.
    List,
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// A driver that turns the chords from a key event source into events.
pub struct KeySourceDriver {
    source: Arc<dyn KeyEventSource>,
}

impl KeySourceDriver {
    pub fn new(source: Arc<dyn KeyEventSource>) -> KeySourceDriver {
        KeySourceDriver { source }
    }
}

impl Driver for KeySourceDriver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        let (keys_tx, mut keys_rx) = mpsc::channel(1);
        let source = self.source.monitor_keys(keys_tx);
        tokio::spawn(async move {
            while let Some(event) = keys_rx.recv().await {
                events_tx
                    .send(Event::Chord(event))
                    .await
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            }
            source
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
        })
    }
}

/// Drives a board from a driver's events.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller with the given driver.
    pub fn new(board: Arc<Board>, driver: Arc<dyn Driver>) -> Controller {
        Controller {
            handle: tokio::spawn(
                Controller::trigger_events(board, driver).instrument(span!(Level::INFO, "controller")),
            ),
        }
    }

    /// Join will block until the controller finishes, which happens once the driver stops.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    async fn trigger_events(board: Arc<Board>, driver: Arc<dyn Driver>) {
        let (events_tx, mut events_rx) = mpsc::channel(1);
        let join_handle = driver.monitor_events(events_tx);

        info!(
            buttons = board.buttons().len(),
            pages = board.pages().len(),
            "Controller started."
        );

        while let Some(event) = events_rx.recv().await {
            info!(event = ?event, "Received event.");

            // Opening and closing device streams blocks, so board calls run off the runtime.
            match event {
                Event::Chord(chord) => {
                    let board = board.clone();
                    match task::spawn_blocking(move || board.handle_chord(&chord)).await {
                        Ok(triggered) => {
                            for (id, result) in triggered {
                                if let Err(e) = result {
                                    error!(button = id, err = %e, "Error triggering button");
                                }
                            }
                        }
                        Err(e) => error!(err = %e, "Error waiting for triggered buttons"),
                    }
                }
                Event::StopAll => {
                    let board = board.clone();
                    if let Err(e) = task::spawn_blocking(move || board.stop_all()).await {
                        error!(err = %e, "Error waiting for stop all");
                    }
                }
                Event::List => {
                    let sessions = board.playback().sessions();
                    if sessions.is_empty() {
                        info!("Nothing playing.");
                    }
                    for session in sessions {
                        info!(%session, "Playing.");
                    }
                }
            }
        }

        info!("Controller closing.");
        match join_handle.await {
            Ok(Err(e)) => error!(err = %e, "Event monitor failed"),
            Err(e) => error!(err = %e, "Error waiting for event monitor to stop"),
            Ok(Ok(())) => {}
        }
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;
    use std::fmt;
    use std::io;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::mpsc::Sender;
    use tokio::task::JoinHandle;

    use super::{Controller, Driver, Event, KeySourceDriver};
    use crate::audio::source::MemorySource;
    use crate::audio::{mock, AudioError, Device, Output, StreamFormat};
    use crate::board::Board;
    use crate::config;
    use crate::hotkeys::{parse, ChordEvent, KeyEventSource, MemoryRegistrar};
    use crate::playback::{MemoryResolver, Playback};

    /// Sends a fixed list of events, then stops.
    struct ScriptedDriver(Vec<Event>);

    impl Driver for ScriptedDriver {
        fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
            let events = self.0.clone();
            tokio::spawn(async move {
                for event in events {
                    events_tx
                        .send(event)
                        .await
                        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                }
                Ok(())
            })
        }
    }

    struct ScriptedKeys(Vec<ChordEvent>);

    impl KeyEventSource for ScriptedKeys {
        fn monitor_keys(
            &self,
            events_tx: Sender<ChordEvent>,
        ) -> JoinHandle<Result<(), io::Error>> {
            let events = self.0.clone();
            tokio::spawn(async move {
                for event in events {
                    events_tx
                        .send(event)
                        .await
                        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                }
                Ok(())
            })
        }
    }

    /// A device whose opens wait until the test lets them through.
    struct GatedDevice {
        inner: mock::Device,
        opening: crossbeam_channel::Sender<()>,
        gate: crossbeam_channel::Receiver<()>,
    }

    impl fmt::Display for GatedDevice {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "gated {}", self.inner)
        }
    }

    impl Device for GatedDevice {
        fn open(&self, format: StreamFormat) -> Result<Box<dyn Output>, AudioError> {
            let _ = self.opening.send(());
            self.gate
                .recv_timeout(Duration::from_secs(5))
                .map_err(|e| AudioError::Unavailable(e.to_string()))?;
            self.inner.open(format)
        }
    }

    fn board() -> Result<Arc<Board>, Box<dyn Error>> {
        board_on(Arc::new(mock::Device::get("mock")))
    }

    fn board_on(device: Arc<dyn Device>) -> Result<Arc<Board>, Box<dyn Error>> {
        let board: config::Board = serde_yml::from_str(
            r#"
            pages:
              - name: Main
                buttons:
                  - name: Clap
                    path: clap.wav
                    local_hotkey: Ctrl + 1
                  - name: Horn
                    path: horn.wav
                    global_hotkey: Ctrl + 2
            "#,
        )?;
        let resolver = MemoryResolver::new();
        resolver.insert("/board/clap.wav", MemorySource::new(vec![0.5; 8000], 1, 8000));
        resolver.insert("/board/horn.wav", MemorySource::new(vec![0.5; 8000], 1, 8000));
        let playback = Arc::new(Playback::with_resolver(device, Arc::new(resolver)));
        Ok(Arc::new(Board::new(
            board,
            Path::new("/board"),
            playback,
            Arc::new(MemoryRegistrar::new()),
        )))
    }

    fn chord(text: &str) -> ChordEvent {
        ChordEvent::local(parse(text).unwrap().chord())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_controller() -> Result<(), Box<dyn Error>> {
        let board = board()?;
        let driver = Arc::new(ScriptedDriver(vec![
            Event::Chord(chord("Ctrl + 1")),
            Event::Chord(chord("Ctrl + 2")),
            Event::List,
            Event::StopAll,
            Event::Chord(chord("Ctrl + 1")),
            Event::Chord(chord("Ctrl + 9")),
        ]));

        let mut controller = Controller::new(board.clone(), driver);
        controller.join().await?;

        let sessions = board.playback().sessions();
        assert_eq!(1, sessions.len());
        assert_eq!(Path::new("/board/clap.wav"), sessions[0].path());
        board.stop_all();
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_key_source_driver() -> Result<(), Box<dyn Error>> {
        let board = board()?;
        board.set_focused(false);
        let driver = Arc::new(KeySourceDriver::new(Arc::new(ScriptedKeys(vec![
            chord("Ctrl + 1"),
            ChordEvent::global(parse("Ctrl + 2").unwrap().chord()),
        ]))));

        let mut controller = Controller::new(board.clone(), driver);
        controller.join().await?;

        // Unfocused, so only the global hotkey played.
        let sessions = board.playback().sessions();
        assert_eq!(1, sessions.len());
        assert_eq!(Path::new("/board/horn.wav"), sessions[0].path());
        board.stop_all();
        Ok(())
    }

    #[tokio::test]
    async fn test_triggers_leave_the_runtime_free() -> Result<(), Box<dyn Error>> {
        let (opening_tx, opening_rx) = crossbeam_channel::unbounded();
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let board = board_on(Arc::new(GatedDevice {
            inner: mock::Device::get("mock"),
            opening: opening_tx,
            gate: gate_rx,
        }))?;
        let driver = Arc::new(ScriptedDriver(vec![Event::Chord(chord("Ctrl + 1"))]));
        let mut controller = Controller::new(board.clone(), driver);

        // This runtime has one thread, so this loop only runs if the pending open isn't on it.
        while opening_rx.try_recv().is_err() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        gate_tx.send(())?;
        controller.join().await?;

        assert_eq!(1, board.playback().sessions().len());
        board.stop_all();
        Ok(())
    }
}
