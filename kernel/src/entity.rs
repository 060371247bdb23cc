mod item;
mod rental;
mod user;

pub use self::{item::*, rental::*, user::*};
