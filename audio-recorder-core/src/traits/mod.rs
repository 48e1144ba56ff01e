pub mod audio_focus;
pub mod audio_source;
pub mod delegate;
pub mod encoder;
pub mod permissions;
