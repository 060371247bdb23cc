use error_stack::Report;
use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

use crate::KernelError;

/// Opaque borrower identifier supplied by the caller.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Default, Serialize, Deserialize, Fromln, AsRefln)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Same as [`UserId::new`] but rejects blank identifiers.
    pub fn validated(id: impl Into<String>) -> error_stack::Result<Self, KernelError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Report::new(KernelError::InvalidArgument)
                .attach_printable("user id must not be empty"));
        }
        Ok(Self(id))
    }
}

#[cfg(test)]
mod test {
    use crate::entity::UserId;
    use crate::KernelError;

    #[test]
    fn blank_user_id_is_rejected() {
        for raw in ["", "   ", "\t"] {
            let report = UserId::validated(raw).unwrap_err();
            assert_eq!(report.current_context(), &KernelError::InvalidArgument);
        }
        let id = UserId::validated("U1").unwrap();
        assert_eq!(id.as_ref(), "U1");
    }
}
