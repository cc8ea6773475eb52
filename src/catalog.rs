use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::errors::ValidationError;
use crate::normalization;
use crate::validation::{integer_in_range, is_integer, length_in_range};

/// An ID in the database.
pub type Id = i32;

pub const GENRE_NAME_MAX: usize = 100;
pub const PROGRAM_NAME_MAX: usize = 120;
pub const DESCRIPTION_MAX: usize = 1000;

/// The first and last years in which programs in the catalog could have been
/// broadcast.
pub const FIRST_YEAR: i32 = 1920;
pub const LAST_YEAR: i32 = 1980;

/// A signed-in user, refreshed from the identity provider on every login.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Account {
    pub id: Id,

    /// The display name reported by the provider.
    pub username: String,

    /// The URL of the avatar reported by the provider, if any.
    pub picture: Option<String>,

    /// The email address. Accounts are reconciled by this.
    pub email: String,

    #[serde(skip)]
    pub created_at: OffsetDateTime,

    #[serde(skip)]
    pub updated_at: OffsetDateTime,
}

/// The profile fields the identity provider reports for a user.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Profile {
    pub name: String,
    pub picture: Option<String>,
    pub email: String,
}

/// A category of programs.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Genre {
    pub name: String,

    pub id: Id,

    /// The account that created the genre and may change it.
    #[serde(skip)]
    pub account_id: Id,

    #[serde(skip)]
    pub created_at: OffsetDateTime,

    #[serde(skip)]
    pub updated_at: OffsetDateTime,
}

/// A single radio series.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Program {
    pub name: String,

    pub description: Option<String>,

    pub id: Id,

    #[serde(rename = "yearBegan")]
    pub year_began: i32,

    #[serde(rename = "yearEnded")]
    pub year_ended: i32,

    pub genre_id: Id,

    /// The account that created the program and may change it.
    #[serde(skip)]
    pub account_id: Id,

    #[serde(skip)]
    pub created_at: OffsetDateTime,

    #[serde(skip)]
    pub updated_at: OffsetDateTime,
}

/// A recently added program along with the name of its genre.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct LatestProgram {
    pub id: Id,
    pub genre_id: Id,
    pub name: String,
    pub genre_name: String,
    #[serde(skip)]
    pub created_at: OffsetDateTime,
}

/// A genre name that passed validation.
#[derive(Clone, Debug, PartialEq)]
pub struct GenreName(String);

impl GenreName {
    /// Normalizes and checks a submitted genre name.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        const FIELD: &str = "Genre name";

        let name = normalization::normalize_text(raw);

        if name.is_empty() {
            return Err(ValidationError::Missing(FIELD));
        }

        if !length_in_range(&name, 1, GENRE_NAME_MAX) {
            return Err(ValidationError::Length {
                field: FIELD,
                min: 1,
                max: GENRE_NAME_MAX,
            });
        }

        Ok(GenreName(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The genre form as submitted.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GenreForm {
    #[serde(default, deserialize_with = "normalization::deserialize")]
    pub name: String,
}

/// The program form as submitted. Field names follow the form inputs.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProgramForm {
    #[serde(default, deserialize_with = "normalization::deserialize")]
    pub name: String,

    #[serde(default, deserialize_with = "normalization::deserialize")]
    pub description: String,

    #[serde(rename = "yearBegan", default, deserialize_with = "normalization::deserialize")]
    pub year_began: String,

    #[serde(rename = "yearEnded", default, deserialize_with = "normalization::deserialize")]
    pub year_ended: String,
}

/// The user-editable fields of a program, validated as a whole.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgramFields {
    pub name: String,
    pub description: Option<String>,
    pub year_began: i32,
    pub year_ended: i32,
}

impl ProgramFields {
    /// Checks a complete submission. All fields are present when this runs,
    /// so the year order check always compares the submitted years.
    pub fn validate(form: &ProgramForm) -> Result<Self, ValidationError> {
        const NAME: &str = "Program name";
        const DESCRIPTION: &str = "Program description";

        let name = normalization::normalize_text(&form.name);

        if name.is_empty() {
            return Err(ValidationError::Missing(NAME));
        }

        if !length_in_range(&name, 1, PROGRAM_NAME_MAX) {
            return Err(ValidationError::Length {
                field: NAME,
                min: 1,
                max: PROGRAM_NAME_MAX,
            });
        }

        let year_began = parse_year("yearBegan", &form.year_began)?;
        let year_ended = parse_year("yearEnded", &form.year_ended)?;

        if year_ended < year_began {
            return Err(ValidationError::YearOrder);
        }

        let description = normalization::normalize_text(&form.description);

        if !length_in_range(&description, 0, DESCRIPTION_MAX) {
            return Err(ValidationError::TooLong {
                field: DESCRIPTION,
                max: DESCRIPTION_MAX,
            });
        }

        Ok(ProgramFields {
            name,
            description: Some(description).filter(|d| !d.is_empty()),
            year_began,
            year_ended,
        })
    }
}

fn parse_year(field: &'static str, raw: &str) -> Result<i32, ValidationError> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::Missing(field));
    }

    let out_of_range = || ValidationError::Year {
        field,
        min: FIRST_YEAR,
        max: LAST_YEAR,
    };

    if !is_integer(raw) {
        return Err(out_of_range());
    }

    match integer_in_range(raw, i64::from(FIRST_YEAR), i64::from(LAST_YEAR)) {
        Ok(true) => raw.parse().map_err(|_| out_of_range()),
        _ => Err(out_of_range()),
    }
}
