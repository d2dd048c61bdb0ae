pub mod interfaces;
pub mod paper_venue;

pub use interfaces::*;
pub use paper_venue::{PaperVenue, PaperVenueConfig};
