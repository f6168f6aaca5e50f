pub mod answer;
pub mod citation;
pub mod config;
pub mod folders;
pub mod message;
pub mod normalize;
pub mod popup;
pub mod reveal;
pub mod thinking;
pub mod user_menu;
