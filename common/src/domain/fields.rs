use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::entities::UnknownValueError;

/// Editable fields shared by all content kinds.
/// Which of them are needed to publish is decided by the entity schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Title,
    Slug,
    Subtitle,
    Summary,
    City,
    Venue,
    StartAt,
    EndAt,
    CoverUrl,
    CoverAlt,
    TicketUrl,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    Slug,
    DateTime,
    Url,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Field::Title,
        Field::Slug,
        Field::Subtitle,
        Field::Summary,
        Field::City,
        Field::Venue,
        Field::StartAt,
        Field::EndAt,
        Field::CoverUrl,
        Field::CoverAlt,
        Field::TicketUrl,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Slug => "slug",
            Field::Subtitle => "subtitle",
            Field::Summary => "summary",
            Field::City => "city",
            Field::Venue => "venue",
            Field::StartAt => "startAt",
            Field::EndAt => "endAt",
            Field::CoverUrl => "coverUrl",
            Field::CoverAlt => "coverAlt",
            Field::TicketUrl => "ticketUrl",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Slug => FieldKind::Slug,
            Field::StartAt | Field::EndAt => FieldKind::DateTime,
            Field::CoverUrl | Field::TicketUrl => FieldKind::Url,
            _ => FieldKind::Text,
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = UnknownValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.name() == s.trim())
            .ok_or_else(|| UnknownValueError {
                kind: "field",
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_match_serde() {
        for field in Field::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.name()));
            assert_eq!(field.name().parse::<Field>(), Ok(field));
        }
    }
}
