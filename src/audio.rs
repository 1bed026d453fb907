use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::assets::AssetError;
use crate::config::GameConfig;

/// A WAV clip held in memory. Only the RIFF/WAVE header is checked on load;
/// decoding happens at playback time.
#[derive(Clone, Debug, PartialEq)]
pub struct Sound {
    name: String,
    data: Arc<[u8]>,
}

impl Sound {
    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> Result<Sound, AssetError> {
        let is_wave = bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE";
        if !is_wave {
            return Err(AssetError::UnsupportedFormat { path: path.to_path_buf(), expected: "RIFF/WAVE" });
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Sound { name, data: Arc::from(bytes) })
    }

    pub fn load(path: &Path) -> Result<Sound, AssetError> {
        let bytes = fs::read(path).map_err(|source| AssetError::Io { path: path.to_path_buf(), source })?;
        Sound::from_bytes(path, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Loads a clip, turning any failure into a warning and an absent handle.
pub fn load_sound(path: &Path) -> Option<Sound> {
    match Sound::load(path) {
        Ok(sound) => {
            info!("Loaded sound {} ({} bytes)", sound.name(), sound.len());
            Some(sound)
        }
        Err(e) => {
            warn!("Unable to load sound: {}", e);
            None
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SoundBank {
    pub collision: Option<Sound>,
    pub music: Option<Sound>,
}

impl SoundBank {
    pub fn load(config: &GameConfig) -> Self {
        SoundBank {
            collision: load_sound(&config.sound_path("boom.wav")),
            music: load_sound(&config.sound_path("house_lo.wav")),
        }
    }
}

#[cfg(feature = "audio")]
mod device {
    use std::io::Cursor;
    use std::sync::Arc;

    use log::warn;
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

    use super::Sound;

    pub struct Device {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        music: Option<Sink>,
    }

    fn decode(sound: &Sound) -> Option<Decoder<Cursor<Arc<[u8]>>>> {
        match Decoder::new(Cursor::new(sound.data.clone())) {
            Ok(decoder) => Some(decoder),
            Err(e) => {
                warn!("Cannot decode {}: {}", sound.name, e);
                None
            }
        }
    }

    impl Device {
        pub fn open() -> Option<Device> {
            match OutputStream::try_default() {
                Ok((stream, handle)) => Some(Device { _stream: stream, handle, music: None }),
                Err(e) => {
                    warn!("No audio output device, sound disabled: {}", e);
                    None
                }
            }
        }

        pub fn play(&mut self, sound: &Sound) {
            let Some(source) = decode(sound) else { return };
            match Sink::try_new(&self.handle) {
                Ok(sink) => {
                    sink.append(source);
                    sink.detach();
                }
                Err(e) => warn!("Cannot play {}: {}", sound.name, e),
            }
        }

        pub fn loop_music(&mut self, sound: &Sound, volume: f32) {
            if let Some(previous) = self.music.take() {
                previous.stop();
            }
            let Some(source) = decode(sound) else { return };
            match Sink::try_new(&self.handle) {
                Ok(sink) => {
                    sink.set_volume(volume);
                    sink.append(source.repeat_infinite());
                    self.music = Some(sink);
                }
                Err(e) => warn!("Cannot start music {}: {}", sound.name, e),
            }
        }
    }
}

#[cfg(not(feature = "audio"))]
mod device {
    use log::warn;

    use super::Sound;

    /// No output device exists without the `audio` feature.
    pub enum Device {}

    impl Device {
        pub fn open() -> Option<Device> {
            warn!("Built without the `audio` feature, sound disabled");
            None
        }

        pub fn play(&mut self, _sound: &Sound) {
            match *self {}
        }

        pub fn loop_music(&mut self, _sound: &Sound, _volume: f32) {
            match *self {}
        }
    }
}

/// Playback front end. Every call is a no-op when either the device or the
/// sound handle is absent.
pub struct AudioSystem {
    device: Option<device::Device>,
    music_volume: f32,
}

impl AudioSystem {
    pub fn open(config: &GameConfig) -> Self {
        AudioSystem { device: device::Device::open(), music_volume: config.music_volume }
    }

    pub fn disabled() -> Self {
        AudioSystem { device: None, music_volume: 0.0 }
    }

    pub fn is_enabled(&self) -> bool {
        self.device.is_some()
    }

    /// Returns whether the clip was handed to the output device.
    pub fn play(&mut self, sound: Option<&Sound>) -> bool {
        match (self.device.as_mut(), sound) {
            (Some(device), Some(sound)) => {
                device.play(sound);
                true
            }
            (_, None) => {
                debug!("Skipping playback of a sound that never loaded");
                false
            }
            (None, Some(_)) => false,
        }
    }

    /// Starts (or restarts) the looping background track.
    pub fn start_music(&mut self, sound: Option<&Sound>) -> bool {
        match (self.device.as_mut(), sound) {
            (Some(device), Some(sound)) => {
                device.loop_music(sound, self.music_volume);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&36u32.to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(&[0u8; 32]);
        bytes
    }

    #[test]
    fn wave_header_is_accepted() {
        let sound = Sound::from_bytes(Path::new("assets/audio/boom.wav"), wav_bytes()).unwrap();
        assert_eq!(sound.name(), "boom.wav");
        assert_eq!(sound.len(), 44);
    }

    #[test]
    fn non_wave_data_is_rejected() {
        let err = Sound::from_bytes(Path::new("boom.wav"), b"OggS not a wave".to_vec()).unwrap_err();
        assert!(matches!(err, AssetError::UnsupportedFormat { .. }));
    }

    #[test]
    fn missing_file_yields_absent_handle() {
        assert!(load_sound(Path::new("/no/such/dir/boom.wav")).is_none());
    }

    #[test]
    fn playing_absent_sound_is_a_no_op() {
        let mut audio = AudioSystem::disabled();
        assert!(!audio.play(None));
        assert!(!audio.start_music(None));
    }

    #[test]
    fn disabled_device_swallows_loaded_sound() {
        let mut audio = AudioSystem::disabled();
        let sound = Sound::from_bytes(Path::new("boom.wav"), wav_bytes()).unwrap();
        assert!(!audio.is_enabled());
        assert!(!audio.play(Some(&sound)));
    }
}
