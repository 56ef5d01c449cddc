use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{LazyLock, Mutex};

use nutype::nutype;
use regex::Regex;
use serde::Serialize;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

pub const SLUG_MAX_CHARS: usize = 120;

static SLUG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug regex must be valid")
});

/// URL-safe identifier of a content record.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 120, regex = SLUG_REGEX),
    derive(Clone, Debug, Display, AsRef, PartialEq, Eq, Hash, Serialize, Deserialize)
)]
pub struct Slug(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugStatus {
    Idle,
    Checking,
    Available,
    Taken,
}

/// Derives a slug from a title: lowercase ASCII, diacritics stripped,
/// every run of other characters collapsed into one hyphen.
pub fn derive_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    let folded = title
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase);

    for c in folded {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    truncate(slug, SLUG_MAX_CHARS)
}

/// `base-<n>`, shortening `base` when the suffix would not fit.
pub fn with_suffix(base: &str, n: u32) -> String {
    let suffix = format!("-{n}");
    let base = truncate(base.to_string(), SLUG_MAX_CHARS - suffix.len());
    format!("{base}{suffix}")
}

fn truncate(mut slug: String, max: usize) -> String {
    // slugs are ASCII, byte length equals char length
    if slug.len() > max {
        slug.truncate(max);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

/// Availability indicator of one editing session.
///
/// Every check takes a new generation; a result is applied only if no newer
/// check started in the meantime, so a slow lookup cannot overwrite a later one.
#[derive(Debug)]
pub struct SlugValidator {
    generation: AtomicU64,
    status: Mutex<SlugStatus>,
}

impl Default for SlugValidator {
    fn default() -> Self {
        Self {
            generation: AtomicU64::new(0),
            status: Mutex::new(SlugStatus::Idle),
        }
    }
}

impl SlugValidator {
    pub fn status(&self) -> SlugStatus {
        *self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Starts a check and returns its generation.
    pub fn begin(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.set(SlugStatus::Checking);
        generation
    }

    /// Applies `status` if `generation` is still the latest one.
    pub fn finish(&self, generation: u64, status: SlugStatus) -> bool {
        let mut current = self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        *current = status;
        true
    }

    /// Invalidates any running check.
    pub fn reset(&self, status: SlugStatus) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.set(status);
    }

    fn set(&self, status: SlugStatus) {
        *self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_slug_strips_diacritics_and_symbols() {
        assert_eq!(derive_slug("Forró & Samba!!"), "forro-samba");
        assert_eq!(derive_slug("  Show no Parque  "), "show-no-parque");
        assert_eq!(derive_slug("São João -- 2026"), "sao-joao-2026");
        assert_eq!(derive_slug("!!!"), "");
    }

    #[test]
    fn test_derived_slugs_are_well_formed() {
        let titles = [
            "Forró & Samba!!",
            "--Rolê__de__sábado--",
            "Açaí, Pão de Queijo e Café",
            "ÀÉÎÕÜ ç ñ",
            "a",
            "Noite   do    Jazz / Blues",
        ];
        for title in titles {
            let slug = derive_slug(title);
            assert!(
                slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
                "{slug}"
            );
            assert!(!slug.starts_with('-') && !slug.ends_with('-'), "{slug}");
            assert!(!slug.contains("--"), "{slug}");
            assert!(Slug::try_new(slug.as_str()).is_ok(), "{slug}");
        }
    }

    #[test]
    fn test_long_titles_are_truncated_on_a_clean_boundary() {
        let title = "palavra ".repeat(40);
        let slug = derive_slug(&title);
        assert!(slug.len() <= SLUG_MAX_CHARS);
        assert!(!slug.ends_with('-'));

        let suffixed = with_suffix(&slug, 12);
        assert!(suffixed.len() <= SLUG_MAX_CHARS);
        assert!(suffixed.ends_with("-12"));
    }

    #[test]
    fn test_slug_rejects_malformed_values() {
        assert!(Slug::try_new("forro-samba").is_ok());
        assert!(Slug::try_new("Forro").is_err());
        assert!(Slug::try_new("forro--samba").is_err());
        assert!(Slug::try_new("-forro").is_err());
        assert!(Slug::try_new("").is_err());
    }

    #[test]
    fn test_superseded_check_is_discarded() {
        let validator = SlugValidator::default();

        let slow = validator.begin();
        let fast = validator.begin();
        assert_eq!(validator.status(), SlugStatus::Checking);

        assert!(validator.finish(fast, SlugStatus::Available));
        assert!(!validator.finish(slow, SlugStatus::Taken));
        assert_eq!(validator.status(), SlugStatus::Available);
    }
}
