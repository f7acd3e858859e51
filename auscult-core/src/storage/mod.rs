pub mod store;
pub mod wav_sink;
