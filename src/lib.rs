//! Space Dodge: steer a plane along the bottom of the terminal and dodge
//! falling missiles. Once the score passes 10 a monster joins in, chasing the
//! player along the top row and firing heavy missiles.

pub mod assets;
pub mod audio;
pub mod config;
pub mod constants;
pub mod entities;
pub mod game;
pub mod rendering;
pub mod screens;
pub mod terminal_io;
pub mod types;
