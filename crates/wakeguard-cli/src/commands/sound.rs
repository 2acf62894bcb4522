use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::Subcommand;
use std::path::PathBuf;
use uuid::Uuid;
use wakeguard_core::audio::{CustomSound, NullSink, PRESET_SOUNDS};
use wakeguard_core::controller::Controller;
use wakeguard_core::storage::{Config, Store};

#[derive(Subcommand)]
pub enum SoundAction {
    /// List preset and custom sounds
    List,
    /// Import an audio file as a custom sound
    Add {
        /// Display name
        name: String,
        /// Audio file to import
        file: PathBuf,
    },
    /// Set the default alarm sound
    SetDefault {
        /// Preset name or custom-sound id
        name: String,
    },
    /// Set the default volume (0.0 - 1.0)
    Volume {
        value: f32,
    },
}

pub fn run(action: SoundAction) -> Result<(), Box<dyn std::error::Error>> {
    if let SoundAction::List = action {
        // Presets never need the store; listing must work even when the
        // data directory is unavailable.
        println!("presets:");
        for name in PRESET_SOUNDS {
            println!("  {name}");
        }
        if let Ok(store) = Store::open() {
            let custom = store.load_custom_sounds();
            if !custom.is_empty() {
                println!("custom:");
                for sound in custom {
                    println!("  {} ({})", sound.name, sound.id);
                }
            }
        }
        return Ok(());
    }

    let store = Store::open()?;
    let config = Config::load_or_default();
    let mut controller = Controller::new(store, config, Box::new(NullSink));

    match action {
        SoundAction::List => unreachable!("handled above"),
        SoundAction::Add { name, file } => {
            let bytes = std::fs::read(&file)?;
            let sound = CustomSound {
                id: Uuid::new_v4().to_string(),
                name,
                data: BASE64.encode(bytes),
            };
            println!("{{\"id\": \"{}\", \"name\": \"{}\"}}", sound.id, sound.name);
            controller.add_custom_sound(sound);
        }
        SoundAction::SetDefault { name } => {
            controller.set_default_sound(name);
            println!(
                "{{\"default_sound\": \"{}\"}}",
                controller.settings().default_sound
            );
        }
        SoundAction::Volume { value } => {
            if !(0.0..=1.0).contains(&value) {
                return Err("volume must be between 0.0 and 1.0".into());
            }
            controller.set_default_volume(value);
            println!(
                "{{\"default_volume\": {}}}",
                controller.settings().default_volume
            );
        }
    }
    Ok(())
}
