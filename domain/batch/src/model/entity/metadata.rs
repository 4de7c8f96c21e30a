use std::collections::BTreeMap;

/// A name/value tag attached to a pool or a job.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MetadataItem {
    pub name: String,
    pub value: String,
}

impl MetadataItem {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Converts a configured tag map into an ordered metadata list.
    pub fn from_map(map: &BTreeMap<String, String>) -> Vec<Self> {
        map.iter().map(|(name, value)| Self::new(name, value)).collect()
    }
}
