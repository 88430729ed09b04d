//! Per-layer restriction of the skeleton paths a layer may drive.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskEntry {
    /// Also include every descendant of this path.
    #[serde(default)]
    pub children: bool,
}

/// Bone paths (`/`-separated) mapped to their mask entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask {
    entries: HashMap<String, MaskEntry>,
}

impl LayerMask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<String>, children: bool) -> Self {
        self.insert(path, children);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, children: bool) {
        self.entries.insert(path.into(), MaskEntry { children });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&MaskEntry> {
        self.entries.get(path)
    }

    /// Exact entries always match; ancestors match when they include children.
    pub fn affects(&self, path: &str) -> bool {
        if self.entries.contains_key(path) {
            return true;
        }
        path.char_indices()
            .filter(|(_, c)| *c == '/')
            .map(|(i, _)| &path[..i])
            .any(|ancestor| self.entries.get(ancestor).is_some_and(|e| e.children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_flag_extends_to_descendants() {
        let mask = LayerMask::new()
            .with_path("root/spine", true)
            .with_path("root/hips", false);
        assert!(mask.affects("root/spine"));
        assert!(mask.affects("root/spine/chest/neck"));
        assert!(mask.affects("root/hips"));
        assert!(!mask.affects("root/hips/leg"));
        assert!(!mask.affects("root"));
        assert!(!mask.affects("root/spinet"));
    }

    #[test]
    fn parses_as_plain_map() {
        let mask: LayerMask =
            serde_json::from_str(r#"{ "root/arm": { "children": true }, "root/head": {} }"#)
                .unwrap();
        assert_eq!(mask.len(), 2);
        assert!(mask.affects("root/arm/hand"));
        assert_eq!(mask.get("root/head"), Some(&MaskEntry { children: false }));
    }
}
