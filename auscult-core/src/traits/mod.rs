pub mod audio_input;
pub mod audio_output;
