pub mod clothing;
pub mod profile;

pub use clothing::{Category, ClosetCache, ClothingItem};
pub use profile::{Aesthetic, BodyType, UserProfile};
