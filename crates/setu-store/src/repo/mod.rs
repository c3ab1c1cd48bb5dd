pub mod live_locations;
pub mod locations;
pub mod sos;
pub mod users;

pub use live_locations::LiveLocationsRepo;
pub use locations::{LocationUpdate, LocationUpdateNew, LocationsRepo};
pub use sos::{SosRecord, SosRepo};
pub use users::{UserNew, UsersRepo};
