/// Result of a create-if-absent call.
///
/// A failed create is an `Err` on the surrounding result, so only the two
/// successful outcomes are represented here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provisioned<T> {
    /// The resource did not exist and was created by this run.
    Created(T),
    /// The resource was already present; holds its current remote state.
    AlreadyExists(T),
}

impl<T> Provisioned<T> {
    pub fn resource(&self) -> &T {
        match self {
            Provisioned::Created(x) | Provisioned::AlreadyExists(x) => x,
        }
    }

    pub fn into_resource(self) -> T {
        match self {
            Provisioned::Created(x) | Provisioned::AlreadyExists(x) => x,
        }
    }

    pub fn already_existed(&self) -> bool {
        matches!(self, Provisioned::AlreadyExists(_))
    }
}
