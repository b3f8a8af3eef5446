pub mod user;
pub mod collection;
pub mod recommended;

pub use user::User;
pub use collection::{Collection, CollectionItem};
pub use recommended::{RecommendedCollection, RecommendedItem, RecommendedVote};
