pub mod events;
pub mod game_data;
pub mod save_meta;
