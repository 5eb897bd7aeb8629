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

use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use clap::{crate_version, Parser, Subcommand};
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::EnvFilter;

use soundpad::audio;
use soundpad::board::Board;
use soundpad::config;
use soundpad::controller::{keyboard, Controller};
use soundpad::hotkeys::{self, MemoryRegistrar};
use soundpad::playback::{Playback, StartOptions, StopReason};
use soundpad::util::{filename_display, progress_line};

const PROGRESS_WIDTH: usize = 30;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A soundboard player."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available audio output devices.
    Devices {},
    /// Plays a single clip, showing its progress. Press Enter to stop.
    Play {
        /// The device name to play through.
        device_name: String,
        /// The clip to play.
        path: PathBuf,
        /// Play the clip once instead of looping it.
        #[arg(long)]
        no_loop: bool,
    },
    /// Verifies a board, listing hotkey conflicts and missing clips.
    Verify {
        /// The path to the board file.
        board_path: PathBuf,
    },
    /// Parses a hotkey and prints its canonical form.
    Hotkey {
        /// The hotkey, e.g. "ctrl + shift + a".
        text: String,
    },
    /// Starts the soundboard, reading hotkeys and commands from the terminal.
    Start {
        /// The path to the player config.
        player_path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Play {
            device_name,
            path,
            no_loop,
        } => play(&device_name, &path, !no_loop).await?,
        Commands::Verify { board_path } => verify(&board_path)?,
        Commands::Hotkey { text } => match hotkeys::parse(&text) {
            Some(binding) => println!("{}", hotkeys::format(&binding)),
            None => return Err(format!("\"{}\" is not a hotkey", text).into()),
        },
        Commands::Start { player_path } => {
            let player = config::Player::load(&player_path)?;
            let device = audio::get_device(player.audio_device())?;
            let playback = Arc::new(
                Playback::new(device).with_poll_interval(player.poll_interval()?),
            );
            let board = Arc::new(Board::load(
                &player.board(),
                playback,
                Arc::new(MemoryRegistrar::new()),
            )?);
            board.set_focused(player.focused());

            let mut controller = Controller::new(board.clone(), Arc::new(keyboard::Driver::new()));
            controller.join().await?;
            board.stop_all();
        }
    }

    Ok(())
}

/// Plays one clip until it finishes or Enter is pressed.
async fn play(device_name: &str, path: &Path, looping: bool) -> Result<(), Box<dyn Error>> {
    let device = audio::get_device(device_name)?;
    let playback = Playback::new(device);
    let session = playback.start_with(path, StartOptions { looping })?;

    let (stopped_tx, mut stopped_rx) = mpsc::channel(1);
    session.on_stopped(move |reason| {
        let _ = stopped_tx.try_send(reason.clone());
    });

    let name = filename_display(path).to_string();
    let _subscription = playback.subscribe_progress(&session, move |progress| {
        print!("\r{} {}", name, progress_line(&progress, PROGRESS_WIDTH));
        let _ = io::stdout().flush();
    });

    // A plain thread so a pending read doesn't hold up shutdown once the clip ends.
    let (enter_tx, enter_rx) = oneshot::channel();
    thread::spawn(move || {
        let mut line = String::new();
        let _ = io::stdin().read_line(&mut line);
        let _ = enter_tx.send(());
    });

    tokio::select! {
        reason = stopped_rx.recv() => {
            println!();
            if let Some(StopReason::Failed(e)) = reason {
                return Err(format!("playback failed: {}", e).into());
            }
        }
        _ = enter_rx => {
            playback.stop(&session);
        }
    }
    Ok(())
}

/// Loads a board and reports everything wrong with it. Fails if any hotkey conflicts.
fn verify(board_path: &Path) -> Result<(), Box<dyn Error>> {
    let playback = Arc::new(Playback::new(Arc::new(audio::mock::Device::get("mock"))));
    let board = Board::load(board_path, playback, Arc::new(MemoryRegistrar::new()))?;

    for page in board.pages() {
        println!("{}:", page.name());
        for button in page.buttons().iter().filter_map(|id| board.button(*id)) {
            let hotkeys = button.hotkeys();
            println!(
                "- {} ({}) local: {} global: {}",
                button.name(),
                button.path().display(),
                hotkeys
                    .local
                    .map(|binding| binding.to_string())
                    .unwrap_or_else(|| "none".to_string()),
                hotkeys
                    .global
                    .map(|binding| binding.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            );
            if !button.path().is_file() {
                println!("  missing clip: {}", button.path().display());
            }
        }
    }

    let conflicts = board.conflicts();
    if conflicts.is_empty() {
        println!("\nNo hotkey conflicts.");
        return Ok(());
    }

    println!("\nHotkey conflicts (count: {}):", conflicts.len());
    for (id, conflict) in conflicts {
        let name = board.button(*id).map(|button| button.name()).unwrap_or("?");
        println!("- {}: {}", name, conflict);
    }
    Err(format!("{} hotkey conflicts in {}", conflicts.len(), board_path.display()).into())
}
