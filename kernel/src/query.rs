mod item;
mod rental;

pub use self::{item::*, rental::*};
