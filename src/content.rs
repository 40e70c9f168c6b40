use carousel::CarouselItem;
use parking_lot::RwLock;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// One portfolio case as stored on disk. Fields the carousel has no use for
/// are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub year: i32,
    pub preview_image: String,
    #[serde(default)]
    pub published: bool,
}

#[derive(Error, Debug)]
pub enum ContentError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Malformed case file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn read_case(path: &Path) -> Result<Case, ContentError> {
    let text = fs_err::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| ContentError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn collect_case_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(read_dir) = fs_err::read_dir(dir) else {
        log::debug!("No cases directory at {}", dir.display());
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = read_dir
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    files.sort();
    files
}

/// Every readable case in `dir`, in file name order. Bad files are logged
/// and skipped.
pub fn read_all_cases(dir: &Path) -> Vec<Case> {
    collect_case_files(dir)
        .iter()
        .filter_map(|path| match read_case(path) {
            Ok(case) => Some(case),
            Err(e) => {
                log::warn!("Skipping case {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

/// The `max_items` newest published cases as carousel items.
pub fn published_items(mut cases: Vec<Case>, max_items: usize) -> Vec<CarouselItem> {
    cases.retain(|c| c.published);
    cases.sort_by(|a, b| b.year.cmp(&a.year));
    cases
        .into_iter()
        .take(max_items)
        .map(|c| CarouselItem::new(c.title, c.preview_image, c.slug))
        .collect()
}

static ITEMS: OnceLock<RwLock<Vec<CarouselItem>>> = OnceLock::new();

pub fn refresh_cache(dir: &Path, max_items: usize) -> usize {
    let items = published_items(read_all_cases(dir), max_items);
    let count = items.len();
    let lock = ITEMS.get_or_init(|| RwLock::new(Vec::new()));
    *lock.write() = items;
    count
}

pub fn cached_items() -> Vec<CarouselItem> {
    ITEMS
        .get()
        .map(|lock| lock.read().clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_case(dir: &Path, slug: &str, year: i32, published: bool) {
        let json = format!(
            r#"{{
                "id": "{slug}-id",
                "slug": "{slug}",
                "title": "Title {slug}",
                "year": {year},
                "techStack": ["Rust"],
                "previewImage": "/images/{slug}.webp",
                "heroImage": "/images/{slug}-hero.webp",
                "screenshotBlocks": [],
                "published": {published}
            }}"#
        );
        fs_err::write(dir.join(format!("{slug}.json")), json).unwrap();
    }

    #[test]
    fn test_case_deserialization_ignores_extra_fields() {
        let case: Case = serde_json::from_str(
            r#"{"id":"1","slug":"nova","title":"Nova","year":2023,
                "previewImage":"/p.webp","caseType":"web","published":true}"#,
        )
        .unwrap();

        assert_eq!(case.slug, "nova");
        assert_eq!(case.preview_image, "/p.webp");
        assert!(case.published);
    }

    #[test]
    fn test_published_items_newest_first_and_stable() {
        let dir = tempfile::tempdir().unwrap();
        write_case(dir.path(), "a-old", 2021, true);
        write_case(dir.path(), "b-draft", 2025, false);
        write_case(dir.path(), "c-new", 2024, true);
        write_case(dir.path(), "d-new", 2024, true);

        let items = published_items(read_all_cases(dir.path()), 5);
        let keys: Vec<&str> = items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["c-new", "d-new", "a-old"]);

        assert_eq!(items[0].label.as_str(), "Title c-new");
        assert_eq!(items[0].image.as_str(), "/images/c-new.webp");
    }

    #[test]
    fn test_published_items_keeps_newest_five() {
        let dir = tempfile::tempdir().unwrap();
        for (i, year) in [2018, 2024, 2019, 2023, 2020, 2022, 2021].iter().enumerate() {
            write_case(dir.path(), &format!("case-{i}"), *year, true);
        }
        write_case(dir.path(), "draft", 2026, false);

        let items = published_items(read_all_cases(dir.path()), 5);
        let keys: Vec<&str> = items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["case-1", "case-3", "case-5", "case-6", "case-4"]);

        assert_eq!(published_items(read_all_cases(dir.path()), 0).len(), 0);
        assert_eq!(published_items(read_all_cases(dir.path()), 100).len(), 7);
    }

    #[test]
    fn test_bad_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_case(dir.path(), "good", 2022, true);
        fs_err::write(dir.path().join("broken.json"), "{ not json").unwrap();
        fs_err::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let cases = read_all_cases(dir.path());
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].slug, "good");

        assert!(matches!(
            read_case(&dir.path().join("broken.json")),
            Err(ContentError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_all_cases(&dir.path().join("nope")).is_empty());
    }

    #[test]
    fn test_refresh_cache() {
        let dir = tempfile::tempdir().unwrap();
        write_case(dir.path(), "one", 2020, true);
        write_case(dir.path(), "two", 2021, true);

        assert_eq!(refresh_cache(dir.path(), 5), 2);
        assert_eq!(cached_items().len(), 2);
    }
}
