// Path Planning algorithms module

pub mod reeds_shepp_path;
pub mod search_tree;
pub mod car_rrt;

pub use reeds_shepp_path::*;
pub use search_tree::*;
pub use car_rrt::*;
