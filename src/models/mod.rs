pub mod user;
pub mod venue;
pub mod booking;

pub use user::{NewUser, User};
pub use venue::{Building, Floor, Seat, SeatId, Venue};
pub use booking::{BookedSeat, Booking, BookingError, NewBooking, TeamMember};
