use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

/// True while the item is checked out.
#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize, Fromln, AsRefln,
)]
pub struct IsRented(bool);

impl IsRented {
    pub fn new(value: impl Into<bool>) -> Self {
        Self(value.into())
    }
}
