//! Rental domain: booking records, the repository port, and calendar helpers

pub mod model;
pub mod pg;
pub mod store;
pub mod time;

pub use model::{
    Car, CarStatus, NewRefund, OwnerProfile, Payment, PaymentStatus, PayoutStatus, Refund, Rental,
    RentalPaymentStatus, RentalStatus,
};
pub use pg::PgBookingStore;
pub use store::{BookingStore, BookingUnit};
