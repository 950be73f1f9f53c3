//! Utility modules

pub mod audio_decoder;

pub use audio_decoder::{decode_audio_file, decode_audio_file_cancellable, DecodedAudio};
