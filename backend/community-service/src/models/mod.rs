//! Domain models shared by repositories, services and handlers

mod notification;
mod post;
mod quiz;
mod user;

pub use notification::*;
pub use post::*;
pub use quiz::*;
pub use user::*;
