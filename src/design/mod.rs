pub mod balanced;
pub mod cards;
pub mod doptimal;
pub mod factorial;
pub mod seed;
pub mod strategy;

pub use cards::{CardAttribute, CardView, Round, build_round};
pub use seed::derive_draw_seed;
pub use strategy::{SessionHistory, Strategy, hamming_distance};
