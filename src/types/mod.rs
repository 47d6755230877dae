mod chat;
mod clothes;
mod outfits;
mod profile;

pub use chat::*;
pub use clothes::*;
pub use outfits::*;
pub use profile::*;
