use serde::{Deserialize, Serialize};

/// A facet value with the number of hits it received.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrowseFacet {
    pub value: String,
    pub hit_count: u32,
}

impl BrowseFacet {
    pub fn new(value: impl Into<String>, hit_count: u32) -> BrowseFacet {
        BrowseFacet {
            value: value.into(),
            hit_count,
        }
    }
}

impl std::fmt::Display for BrowseFacet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.value, self.hit_count)
    }
}
