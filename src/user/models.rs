use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

use crate::shared::AppError;

/// Database model for users table
///
/// `password` is stored and compared in plaintext; there is no hashing.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct UserModel {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, alias = "isAdmin")]
    #[sqlx(rename = "is_admin")]
    pub admin: bool,
}

impl UserModel {
    /// An administrator with only credentials set
    pub fn admin(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            name: None,
            surname: None,
            birthdate: None,
            gender: None,
            email: None,
            location: None,
            admin: true,
        }
    }

    /// Plaintext comparison against the stored password
    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password == candidate
    }

    /// Overwrites a single attribute from its string form
    pub fn apply(&mut self, field: UserField, value: &str) -> Result<(), AppError> {
        match field {
            UserField::Username => self.username = value.to_string(),
            UserField::Password => self.password = value.to_string(),
            UserField::Name => self.name = Some(value.to_string()),
            UserField::Surname => self.surname = Some(value.to_string()),
            UserField::Birthdate => {
                let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
                    AppError::BadRequest(format!("Invalid birthdate {:?}: {}", value, e))
                })?;
                self.birthdate = Some(date);
            }
            UserField::Gender => self.gender = Some(value.to_string()),
            UserField::Email => self.email = Some(value.to_string()),
            UserField::Location => self.location = Some(value.to_string()),
            UserField::IsAdmin => self.admin = value.eq_ignore_ascii_case("true"),
        }
        Ok(())
    }
}

/// Attribute names accepted by update and list filters
///
/// Parsing ignores case, which is what update wants. List filters only
/// accept the exact lowercase name, see `UserFilter::parse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum UserField {
    Username,
    Password,
    Name,
    Surname,
    Birthdate,
    Gender,
    Email,
    Location,
    IsAdmin,
}

/// Single-field predicate for the user listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    /// Case-insensitive substring match on a text column
    Contains(TextColumn, String),
    /// Case-insensitive equality on gender
    GenderIs(String),
    /// Substring of the `YYYY-MM-DD` rendering of birthdate
    BirthdateContains(String),
    IsAdmin(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColumn {
    Username,
    Name,
    Surname,
    Email,
    Location,
}

impl TextColumn {
    pub fn column(&self) -> &'static str {
        match self {
            TextColumn::Username => "username",
            TextColumn::Name => "name",
            TextColumn::Surname => "surname",
            TextColumn::Email => "email",
            TextColumn::Location => "location",
        }
    }

    fn value_of<'a>(&self, user: &'a UserModel) -> Option<&'a str> {
        match self {
            TextColumn::Username => Some(user.username.as_str()),
            TextColumn::Name => user.name.as_deref(),
            TextColumn::Surname => user.surname.as_deref(),
            TextColumn::Email => user.email.as_deref(),
            TextColumn::Location => user.location.as_deref(),
        }
    }
}

impl UserFilter {
    /// `None` when no user can match: a field name that is not exactly one
    /// of the lowercase names, `password`, or an `isadmin` value other than
    /// true/false.
    pub fn parse(field: &str, value: &str) -> Option<Self> {
        let parsed = UserField::from_str(field).ok()?;
        if parsed.to_string() != field {
            return None;
        }

        let filter = match parsed {
            UserField::Username => Self::Contains(TextColumn::Username, value.to_string()),
            UserField::Name => Self::Contains(TextColumn::Name, value.to_string()),
            UserField::Surname => Self::Contains(TextColumn::Surname, value.to_string()),
            UserField::Email => Self::Contains(TextColumn::Email, value.to_string()),
            UserField::Location => Self::Contains(TextColumn::Location, value.to_string()),
            UserField::Gender => Self::GenderIs(value.to_string()),
            UserField::Birthdate => Self::BirthdateContains(value.to_string()),
            UserField::IsAdmin => match value.to_lowercase().as_str() {
                "true" => Self::IsAdmin(true),
                "false" => Self::IsAdmin(false),
                _ => return None,
            },
            UserField::Password => return None,
        };
        Some(filter)
    }

    pub fn matches(&self, user: &UserModel) -> bool {
        match self {
            Self::Contains(column, needle) => column
                .value_of(user)
                .is_some_and(|v| contains_ignore_case(v, needle)),
            Self::GenderIs(gender) => user
                .gender
                .as_deref()
                .is_some_and(|g| g.to_lowercase() == gender.to_lowercase()),
            Self::BirthdateContains(needle) => user
                .birthdate
                .is_some_and(|d| d.format("%Y-%m-%d").to_string().contains(needle.as_str())),
            Self::IsAdmin(admin) => user.admin == *admin,
        }
    }
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
