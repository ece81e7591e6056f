pub mod cache;
pub mod rank;
pub mod refresher;
pub mod view;

pub use cache::LeaderboardCache;
pub use rank::{RankResolver, Standing};
pub use refresher::spawn_refresher;
