use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct Label(String);

crate::impl_string_newtype!(Label);

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct ImageRef(String);

crate::impl_string_newtype!(ImageRef);

impl ImageRef {
    /// Prefixes site-absolute locators (`/images/x.webp`) with the static base
    /// path. URLs and relative paths pass through untouched.
    pub fn with_base_path(&self, base_path: &str) -> ImageRef {
        let base = base_path.trim_end_matches('/');
        if base.is_empty() || !self.0.starts_with('/') || self.0.starts_with("//") {
            return self.clone();
        }
        ImageRef(format!("{}{}", base, self.0))
    }

    /// Inverse of [`ImageRef::with_base_path`]: the site-absolute locator
    /// with the base path prefix removed.
    pub fn strip_base_path(&self, base_path: &str) -> ImageRef {
        let base = base_path.trim_end_matches('/');
        if base.is_empty() {
            return self.clone();
        }
        match self.0.strip_prefix(base) {
            Some(rest) if rest.starts_with('/') && !rest.starts_with("//") => {
                ImageRef(rest.to_string())
            }
            _ => self.clone(),
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct NavigationKey(String);

crate::impl_string_newtype!(NavigationKey);

impl NavigationKey {
    pub fn escaped(&self) -> EscapedKey {
        EscapedKey(urlencoding::encode(&self.0).into_owned())
    }
}

/// A navigation key percent-encoded as a single path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deref, AsRef)]
pub struct EscapedKey(String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarouselItem {
    pub label: Label,
    pub image: ImageRef,
    pub key: NavigationKey,
}

impl CarouselItem {
    pub fn new(
        label: impl Into<String>,
        image: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            label: Label::new(label),
            image: ImageRef::new(image),
            key: NavigationKey::new(key),
        }
    }
}

/// The input list logically repeated `duplication` times.
///
/// Angular spacing uses the expanded length, data lookups fold back onto the
/// original list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSequence {
    items: Vec<CarouselItem>,
    duplication: usize,
}

impl Default for ItemSequence {
    fn default() -> Self {
        Self::new(Vec::new(), 1)
    }
}

impl ItemSequence {
    pub fn new(items: Vec<CarouselItem>, duplication: usize) -> Self {
        Self {
            items,
            duplication: duplication.max(1),
        }
    }

    pub fn items(&self) -> &[CarouselItem] {
        &self.items
    }

    pub fn duplication(&self) -> usize {
        self.duplication
    }

    pub fn original_len(&self) -> usize {
        self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len() * self.duplication
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn original_index(&self, slot: usize) -> Option<usize> {
        (slot < self.len()).then(|| slot % self.original_len())
    }

    pub fn resolve(&self, slot: usize) -> Option<&CarouselItem> {
        self.original_index(slot).map(|i| &self.items[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &CarouselItem)> {
        (0..self.len()).filter_map(|slot| self.resolve(slot).map(|item| (slot, item)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(count: usize) -> Vec<CarouselItem> {
        (0..count)
            .map(|i| CarouselItem::new(format!("Case {i}"), format!("/img/{i}.webp"), format!("case-{i}")))
            .collect()
    }

    #[test]
    fn test_expanded_slots_resolve_modulo_original() {
        let seq = ItemSequence::new(sample(5), 3);
        assert_eq!(seq.original_len(), 5);
        assert_eq!(seq.len(), 15);

        for slot in 0..seq.len() {
            assert_eq!(seq.resolve(slot), Some(&seq.items()[slot % 5]));
        }
        assert_eq!(seq.resolve(15), None);
    }

    #[test]
    fn test_empty_sequence() {
        let seq = ItemSequence::new(Vec::new(), 3);
        assert!(seq.is_empty());
        assert_eq!(seq.len(), 0);
        assert_eq!(seq.resolve(0), None);
        assert_eq!(seq.iter().count(), 0);
    }

    #[test]
    fn test_duplication_is_at_least_one() {
        let seq = ItemSequence::new(sample(2), 0);
        assert_eq!(seq.duplication(), 1);
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn test_navigation_key_escaping() {
        let cases = vec![
            ("brand-identity", "brand-identity"),
            ("Brand Identity", "Brand%20Identity"),
            ("a/b?c&d", "a%2Fb%3Fc%26d"),
            ("кейс", "%D0%BA%D0%B5%D0%B9%D1%81"),
        ];

        for (raw, expected) in cases {
            assert_eq!(NavigationKey::from(raw).escaped().as_str(), expected);
        }
    }

    #[test]
    fn test_image_base_path() {
        let base = "/Portfolio";
        assert_eq!(
            ImageRef::from("/images/a.webp").with_base_path(base),
            ImageRef::from("/Portfolio/images/a.webp")
        );
        assert_eq!(
            ImageRef::from("https://cdn.example/a.webp").with_base_path(base),
            ImageRef::from("https://cdn.example/a.webp")
        );
        assert_eq!(
            ImageRef::from("/images/a.webp").with_base_path(""),
            ImageRef::from("/images/a.webp")
        );
    }

    #[test]
    fn test_image_strip_base_path() {
        let base = "/Portfolio/";
        assert_eq!(
            ImageRef::from("/images/a.webp").with_base_path(base).strip_base_path(base),
            ImageRef::from("/images/a.webp")
        );
        assert_eq!(
            ImageRef::from("/PortfolioX/a.webp").strip_base_path(base),
            ImageRef::from("/PortfolioX/a.webp")
        );
        assert_eq!(
            ImageRef::from("https://cdn.example/a.webp").strip_base_path(base),
            ImageRef::from("https://cdn.example/a.webp")
        );
        assert_eq!(
            ImageRef::from("/images/a.webp").strip_base_path(""),
            ImageRef::from("/images/a.webp")
        );
    }

    #[test]
    fn test_item_deserialization() {
        let json = r#"{"label": "Nebula", "image": "/n.webp", "key": "nebula"}"#;
        let item: CarouselItem = serde_json::from_str(json).unwrap();
        assert_eq!(item, CarouselItem::new("Nebula", "/n.webp", "nebula"));
    }
}
