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
use std::path::PathBuf;
use std::sync::Arc;

use clap::{crate_version, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use drum_machine::controller::{self, Controller};
use drum_machine::display::DEFAULT_PLACEHOLDER;
use drum_machine::keyboard::KeyboardEvents;
use drum_machine::machine::DrumMachine;
use drum_machine::{audio, config, pads, view};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A nine pad drum machine."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the pads with their keys and clips.
    Pads {},
    /// Prints the drum machine as it looks before any pad is triggered.
    Render {
        /// Print the element tree as JSON.
        #[arg(short, long)]
        json: bool,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Start will start the drum machine, reading keys and commands from stdin.
    Start {
        /// The path to the drum machine config.
        config_path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Logs go to stderr so they don't interleave with the rendered pads.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pads {} => {
            println!("Pads (count: {}):", pads::all().len());
            for pad in pads::all() {
                println!("- {}", pad);
            }
        }
        Commands::Render { json } => {
            let document = view::render(pads::all(), DEFAULT_PLACEHOLDER);
            if json {
                println!("{}", serde_json::to_string_pretty(&document)?);
            } else {
                print!("{}", document);
            }
        }
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
        Commands::Start { config_path } => {
            let config = config::Machine::deserialize(&PathBuf::from(&config_path))?;
            let device = audio::get_device(&config)?;
            info!(device = %device, "Using audio device");

            let machine = Arc::new(DrumMachine::new(device, config.display().placeholder())?);
            if config.clips().preload() {
                machine.preload()?;
            }

            let keyboard = KeyboardEvents::new();
            let mounted = machine.mount(&keyboard)?;
            let mut controller = Controller::new(
                mounted,
                keyboard,
                Arc::new(controller::keyboard::Driver::new()),
            );
            controller.join().await?;
        }
    }

    Ok(())
}
