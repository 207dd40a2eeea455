mod appointment;
mod customer;
mod message;
mod revenue;
mod subscription;
mod tenant;
mod waitlist;

pub use appointment::*;
pub use customer::*;
pub use message::*;
pub use revenue::*;
pub use subscription::*;
pub use tenant::*;
pub use waitlist::*;
