use serde::{Deserialize, Serialize};

/// Address of a single blob: a container and a blob name within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobKey {
    pub container: String,
    pub name: String,
}

impl BlobKey {
    /// Create a new blob key.
    #[must_use]
    pub fn new(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for BlobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.container, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_form() {
        let key = BlobKey::new("newcontainer", "metadata.log");
        assert_eq!(key.to_string(), "newcontainer/metadata.log");
    }

    #[test]
    fn keys_compare_by_parts() {
        assert_ne!(BlobKey::new("a/b", "c"), BlobKey::new("a", "b/c"));
    }
}
