use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::ValidationErrors;

#[derive(Default, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Text(pub String);

impl Display for Text {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Text(value.to_string())
    }
}

/// Declaration of a text column on a model, used to clean submitted values.
#[derive(Debug, Clone, Copy)]
pub struct TextField {
    pub name:       &'static str,
    /// Whether the empty string is an acceptable value.
    pub blank:      bool,
    pub max_length: Option<usize>,
}

impl TextField {
    pub const fn char_field(name: &'static str, max_length: usize) -> Self {
        Self {
            name,
            blank: false,
            max_length: Some(max_length),
        }
    }

    pub const fn text_field(name: &'static str) -> Self {
        Self {
            name,
            blank: true,
            max_length: None,
        }
    }

    /// Trims `value` and checks it against the field declaration. Problems are
    /// recorded in `errors` under the field name.
    pub fn clean(&self, value: String, errors: &mut ValidationErrors) -> Option<Text> {
        let value = value.trim();
        if value.is_empty() && !self.blank {
            errors.add(self.name, "This field may not be blank.");
            return None;
        }
        if let Some(max_length) = self.max_length {
            if value.chars().count() > max_length {
                errors.add(
                    self.name,
                    format!("Ensure this field has no more than {max_length} characters."),
                );
                return None;
            }
        }
        Some(Text(value.to_string()))
    }

    /// Like [TextField::clean], but a missing value is an error unless the
    /// field may be blank, in which case it defaults to the empty string.
    pub fn clean_required(
        &self,
        value: Option<String>,
        errors: &mut ValidationErrors,
    ) -> Option<Text> {
        match value {
            Some(value) => self.clean(value, errors),
            None if self.blank => Some(Text::default()),
            None => {
                errors.add(self.name, "This field is required.");
                None
            }
        }
    }
}

impl sqlx::Type<sqlx::Sqlite> for Text {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for Text {
    fn encode_by_ref(
        &self,
        args: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> sqlx::encode::IsNull {
        args.push(sqlx::sqlite::SqliteArgumentValue::Text(
            self.0.clone().into(),
        ));

        sqlx::encode::IsNull::No
    }
}

impl<'r, DB: sqlx::Database> sqlx::Decode<'r, DB> for Text
where
    String: sqlx::Decode<'r, DB>,
{
    fn decode(
        value: <DB as sqlx::database::HasValueRef<'r>>::ValueRef,
    ) -> Result<Self, Box<dyn std::error::Error + 'static + Send + Sync>> {
        let value = <String as sqlx::Decode<DB>>::decode(value)?;
        Ok(Text(value))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const NAME: TextField = TextField::char_field("name", 5);
    const BODY: TextField = TextField::text_field("body");

    #[test]
    fn trims_accepted_values() {
        let mut errors = ValidationErrors::default();
        assert_eq!(
            NAME.clean("  Natan ".into(), &mut errors),
            Some(Text::from("Natan"))
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn rejects_blank_and_overlong_values() {
        let mut errors = ValidationErrors::default();
        assert_eq!(NAME.clean("   ".into(), &mut errors), None);
        assert_eq!(
            errors.messages("name"),
            &["This field may not be blank.".to_string()]
        );

        let mut errors = ValidationErrors::default();
        assert_eq!(NAME.clean("Morais".into(), &mut errors), None);
        assert_eq!(
            errors.messages("name"),
            &["Ensure this field has no more than 5 characters.".to_string()]
        );
    }

    #[test]
    fn counts_characters_not_bytes() {
        let mut errors = ValidationErrors::default();
        assert_eq!(
            NAME.clean("Ørjan".into(), &mut errors),
            Some(Text::from("Ørjan"))
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn missing_values() {
        let mut errors = ValidationErrors::default();
        assert_eq!(NAME.clean_required(None, &mut errors), None);
        assert_eq!(
            errors.messages("name"),
            &["This field is required.".to_string()]
        );

        let mut errors = ValidationErrors::default();
        assert_eq!(
            BODY.clean_required(None, &mut errors),
            Some(Text::default())
        );
        assert_eq!(
            BODY.clean_required(Some("".into()), &mut errors),
            Some(Text::default())
        );
        assert!(errors.is_empty());
    }
}
