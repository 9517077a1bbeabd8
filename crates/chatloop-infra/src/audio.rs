//! Completion sound via the platform's command-line player.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use chatloop_core::notify::Notifier;
use chatloop_types::config::AudioConfig;

use crate::paths::expand_path;

/// Players tried in order for the current platform.
fn player_commands(os: &str) -> &'static [&'static str] {
    match os {
        "macos" => &["afplay"],
        "linux" => &["aplay", "paplay"],
        _ => &[],
    }
}

/// Plays a sound file when a turn completes.
///
/// Playback is fire-and-forget: the player runs detached with its output
/// discarded, and a background thread reaps it.
pub struct AudioNotifier {
    sound_file: Option<PathBuf>,
    enabled: bool,
}

impl AudioNotifier {
    /// A notifier for `sound_file`. Disabled with a warning if the file is missing.
    pub fn new(sound_file: PathBuf, enabled: bool) -> Self {
        let exists = sound_file.is_file();
        if !exists {
            warn!("Audio file not found: {}", sound_file.display());
        }
        Self {
            sound_file: Some(sound_file),
            enabled: enabled && exists,
        }
    }

    pub fn disabled() -> Self {
        Self {
            sound_file: None,
            enabled: false,
        }
    }

    pub fn from_config(config: &AudioConfig) -> Self {
        match (&config.sound_file, config.enabled) {
            (Some(path), true) => Self::new(expand_path(path), true),
            (None, true) => {
                warn!("Audio enabled but no sound_file configured");
                Self::disabled()
            }
            _ => Self::disabled(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn sound_file(&self) -> Option<&Path> {
        self.sound_file.as_deref()
    }

    fn play_with(&self, players: &[&str]) -> bool {
        let Some(sound_file) = self.sound_file.as_deref().filter(|_| self.enabled) else {
            return false;
        };

        for player in players {
            let spawned = Command::new(player)
                .arg(sound_file)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();
            match spawned {
                Ok(mut child) => {
                    std::thread::spawn(move || {
                        let _ = child.wait();
                    });
                    return true;
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    debug!(player, "Audio player not installed");
                }
                Err(err) => {
                    debug!(player, error = %err, "Audio playback failed");
                    return false;
                }
            }
        }
        false
    }
}

impl Notifier for AudioNotifier {
    fn play(&self) -> bool {
        self.play_with(player_commands(std::env::consts::OS))
    }
}
