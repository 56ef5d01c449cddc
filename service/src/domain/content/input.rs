use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, NaiveDateTime, Utc};
use role_common::{Field, FieldKind};
use serde::{Deserialize, Serialize};

use crate::domain::content::ContentTitle;
use crate::domain::slug::Slug;

/// Field values exactly as the admin typed them. Empty string means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftInput {
    pub title: String,
    pub slug: String,
    pub subtitle: String,
    pub summary: String,
    pub city: String,
    pub venue: String,
    pub start_at: String,
    pub end_at: String,
    pub cover_url: String,
    pub cover_alt: String,
    pub ticket_url: String,
}

/// The typed view of a [`DraftInput`] that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDraft {
    pub title: ContentTitle,
    pub slug: Option<Slug>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
}

/// Validation messages keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

const TITLE_MAX_CHARS: usize = 200;

impl DraftInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Slug => &self.slug,
            Field::Subtitle => &self.subtitle,
            Field::Summary => &self.summary,
            Field::City => &self.city,
            Field::Venue => &self.venue,
            Field::StartAt => &self.start_at,
            Field::EndAt => &self.end_at,
            Field::CoverUrl => &self.cover_url,
            Field::CoverAlt => &self.cover_alt,
            Field::TicketUrl => &self.ticket_url,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        *self.slot_mut(field) = match field {
            Field::Slug => value.trim().to_owned(),
            _ => value,
        };
    }

    /// Stored slugs carry no surrounding whitespace, so uniqueness compares like with like.
    pub fn normalize(&mut self) {
        let trimmed = self.slug.trim();
        if trimmed.len() != self.slug.len() {
            self.slug = trimmed.to_owned();
        }
    }

    pub fn is_set(&self, field: Field) -> bool {
        !self.get(field).trim().is_empty()
    }

    fn slot_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Slug => &mut self.slug,
            Field::Subtitle => &mut self.subtitle,
            Field::Summary => &mut self.summary,
            Field::City => &mut self.city,
            Field::Venue => &mut self.venue,
            Field::StartAt => &mut self.start_at,
            Field::EndAt => &mut self.end_at,
            Field::CoverUrl => &mut self.cover_url,
            Field::CoverAlt => &mut self.cover_alt,
            Field::TicketUrl => &mut self.ticket_url,
        }
    }

    /// The only rule a draft save enforces; everything else waits for publish.
    pub fn validate_title(&self) -> Result<ContentTitle, FieldErrors> {
        let mut errors = FieldErrors::default();
        self.checked_title(&mut errors).ok_or(errors)
    }

    fn checked_title(&self, errors: &mut FieldErrors) -> Option<ContentTitle> {
        match ContentTitle::try_new(self.title.as_str()) {
            Ok(title) => Some(title),
            Err(_) if self.title.trim().is_empty() => {
                errors.insert(Field::Title, "title is required");
                None
            }
            Err(_) => {
                errors.insert(
                    Field::Title,
                    format!("title must be at most {TITLE_MAX_CHARS} characters"),
                );
                None
            }
        }
    }

    /// Validates the whole value set at once, so cross-field rules
    /// (end after start) are always evaluated against current values.
    pub fn validate(&self) -> Result<ValidatedDraft, FieldErrors> {
        let mut errors = FieldErrors::default();
        let title = self.checked_title(&mut errors);

        let mut slug = None;
        let mut start_at = None;
        let mut end_at = None;

        for field in Field::ALL {
            if !self.is_set(field) {
                continue;
            }
            let raw = self.get(field).trim();
            match field.kind() {
                FieldKind::Text => {}
                FieldKind::Slug => match Slug::try_new(raw) {
                    Ok(valid) => slug = Some(valid),
                    Err(_) => errors.insert(
                        field,
                        "slug may only contain lowercase letters, digits and single hyphens",
                    ),
                },
                FieldKind::DateTime => match parse_timestamp(raw) {
                    Some(ts) if field == Field::StartAt => start_at = Some(ts),
                    Some(ts) => end_at = Some(ts),
                    None => errors.insert(field, "invalid date-time"),
                },
                FieldKind::Url => {
                    if !(raw.starts_with("http://") || raw.starts_with("https://")) {
                        errors.insert(field, "must be an http(s) URL");
                    }
                }
            }
        }

        if let (Some(start), Some(end)) = (start_at, end_at) {
            if end < start {
                errors.insert(Field::EndAt, "end must not precede start");
            }
        }

        match title {
            Some(title) if errors.is_empty() => Ok(ValidatedDraft {
                title,
                slug,
                start_at,
                end_at,
            }),
            _ => Err(errors),
        }
    }
}

/// Accepts RFC 3339 or the `datetime-local` form `YYYY-MM-DDTHH:MM[:SS]`, read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

impl FieldErrors {
    #[cfg(test)]
    pub fn single(field: Field, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.insert(field, message);
        errors
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use itertools::Itertools;

        let joined = self
            .0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .join("; ");
        f.write_str(&joined)
    }
}
