pub mod menu;
pub mod stats_sidebar;
pub mod typing_area;
