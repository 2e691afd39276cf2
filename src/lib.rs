pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod moves;
pub mod opponent;
pub mod piece;
pub mod session;

#[cfg(target_arch = "wasm32")]
mod wasm_api;
