pub mod app;
pub mod audio;
pub mod env;
pub mod game2048_core;
pub mod game2048_ui;
pub mod hub;
pub mod jigsaw_core;
pub mod jigsaw_ui;
pub mod linklink_core;
pub mod linklink_ui;
pub mod maze_core;
pub mod maze_ui;
pub mod minesweeper_core;
pub mod minesweeper_ui;
pub mod piano_core;
pub mod piano_ui;
pub mod point24_core;
pub mod point24_ui;
pub mod pong_core;
pub mod pong_ui;
pub mod profile;
pub mod round_timer;
pub mod settings;
pub mod sfx;
pub mod sokoban_core;
pub mod sokoban_levels;
pub mod sokoban_ui;
pub mod sudoku_core;
pub mod sudoku_ui;
pub mod tetris_core;
pub mod tetris_ui;
pub mod ui_kit;
pub mod whack_core;
pub mod whack_ui;
