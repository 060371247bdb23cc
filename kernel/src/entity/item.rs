mod id;
mod name;
mod rented;

pub use self::{id::*, name::*, rented::*};
use destructure::Destructure;
use serde::{Deserialize, Serialize};
use vodca::References;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, References, Destructure)]
pub struct Item {
    id: ItemId,
    name: ItemName,
    is_rented: IsRented,
}

impl Item {
    pub fn new(id: ItemId, name: ItemName, is_rented: IsRented) -> Self {
        Self {
            id,
            name,
            is_rented,
        }
    }
}
