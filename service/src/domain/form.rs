use chrono::{DateTime, Utc};
use role_common::Field;

use crate::domain::content::input::{DraftInput, FieldErrors};
use crate::domain::slug::derive_slug;

/// Single source of truth for one record being edited:
/// current values, validation errors and the dirty flag.
#[derive(Debug, Clone)]
pub struct FormState {
    values: DraftInput,
    errors: FieldErrors,
    dirty: bool,
    /// bumped on every update, lets a save tell whether it covered the latest edit
    revision: u64,
    /// the admin typed a slug; stop deriving it from the title
    slug_touched: bool,
    last_saved_at: Option<DateTime<Utc>>,
}

impl Default for FormState {
    fn default() -> Self {
        Self::from_values(DraftInput::default(), None)
    }
}

impl FormState {
    /// Clean baseline from already persisted values.
    pub fn from_values(values: DraftInput, saved_at: Option<DateTime<Utc>>) -> Self {
        let slug_touched = values.is_set(Field::Slug) && values.slug != derive_slug(&values.title);
        let errors = validation_errors(&values);
        Self {
            values,
            errors,
            dirty: false,
            revision: 0,
            slug_touched,
            last_saved_at: saved_at,
        }
    }

    pub fn values(&self) -> &DraftInput {
        &self.values
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn has_title(&self) -> bool {
        self.values.is_set(Field::Title)
    }

    /// Sets one field and re-validates the whole value set.
    /// Marks the form dirty even when the value did not change.
    /// Returns whether the slug changed as a consequence.
    pub fn update(&mut self, field: Field, value: impl Into<String>) -> bool {
        let previous_slug = self.values.slug.clone();
        let value = value.into();

        match field {
            Field::Slug => {
                self.slug_touched = !value.trim().is_empty();
                self.values.set(Field::Slug, value);
                if !self.slug_touched {
                    self.values.slug = derive_slug(&self.values.title);
                }
            }
            Field::Title => {
                self.values.set(Field::Title, value);
                if !self.slug_touched {
                    self.values.slug = derive_slug(&self.values.title);
                }
            }
            other => self.values.set(other, value),
        }

        self.dirty = true;
        self.revision += 1;
        self.errors = validation_errors(&self.values);

        self.values.slug != previous_slug
    }

    /// Records a successful save of the snapshot taken at `revision`.
    /// The form becomes clean only if nothing was edited after the snapshot.
    pub fn mark_saved(&mut self, revision: u64, at: DateTime<Utc>) {
        self.last_saved_at = Some(at);
        if self.revision == revision {
            self.dirty = false;
        }
    }

    /// Takes over values rewritten by the server (e.g. rounded dates),
    /// unless the admin edited the form in the meantime.
    pub fn adopt_saved(&mut self, revision: u64, values: DraftInput) {
        if self.revision == revision {
            self.errors = validation_errors(&values);
            self.values = values;
        }
    }
}

fn validation_errors(values: &DraftInput) -> FieldErrors {
    values.validate().err().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_derives_slug_until_slug_is_edited() {
        let mut form = FormState::default();

        assert!(form.update(Field::Title, "Forró & Samba!!"));
        assert_eq!(form.values().slug, "forro-samba");

        form.update(Field::Slug, "forro-na-praca");
        assert!(!form.update(Field::Title, "Forró na Praça da Estação"));
        assert_eq!(form.values().slug, "forro-na-praca");

        // clearing the slug hands it back to the title
        form.update(Field::Slug, "");
        assert_eq!(form.values().slug, "forro-na-praca-da-estacao");
    }

    #[test]
    fn test_update_marks_dirty_without_value_diffing() {
        let mut form = FormState::from_values(DraftInput::new("Show"), None);
        assert!(!form.is_dirty());

        form.update(Field::Title, "Show");
        assert!(form.is_dirty());
    }

    #[test]
    fn test_save_resets_dirty_and_next_edit_sets_it_again() {
        let mut form = FormState::default();
        form.update(Field::Title, "Show no Parque");

        form.mark_saved(form.revision(), Utc::now());
        assert!(!form.is_dirty());
        assert!(form.last_saved_at().is_some());

        // saving again with no edits keeps it clean
        form.mark_saved(form.revision(), Utc::now());
        assert!(!form.is_dirty());

        form.update(Field::City, "Belo Horizonte");
        assert!(form.is_dirty());
    }

    #[test]
    fn test_save_of_stale_snapshot_keeps_dirty() {
        let mut form = FormState::default();
        form.update(Field::Title, "Show no Parque");
        let snapshot = form.revision();

        form.update(Field::City, "Belo Horizonte");
        form.mark_saved(snapshot, Utc::now());

        assert!(form.is_dirty());
    }

    #[test]
    fn test_revalidates_whole_form_on_each_change() {
        let mut form = FormState::default();
        form.update(Field::Title, "Show");
        form.update(Field::EndAt, "2026-11-20T17:00");
        assert!(!form.errors().contains(Field::EndAt));

        // changing start re-evaluates the rule reported on end
        form.update(Field::StartAt, "2026-11-20T18:00");
        assert!(form.errors().contains(Field::EndAt));

        form.update(Field::StartAt, "2026-11-20T16:00");
        assert!(form.errors().is_empty());
    }
}
