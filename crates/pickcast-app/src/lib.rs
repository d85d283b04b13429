pub mod config;
pub mod db;
pub mod playback;
pub mod room;
pub mod session;
