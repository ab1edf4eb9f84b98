//! Form binding helpers shared by the add and edit views.

use std::collections::BTreeMap;
use std::str::FromStr;

use axum::{extract::rejection::FormRejection, Form};
use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

/// Field name to the list of messages for that field.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Outcome of submitting a bound form.
#[derive(Debug)]
pub enum Submit<T> {
    Saved(T),
    Invalid(FieldErrors),
}

/// Run field validation and flatten the result into [`FieldErrors`].
pub fn check<F: Validate>(form: &F) -> Result<(), FieldErrors> {
    form.validate().map_err(|e| field_errors(&e))
}

pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => e.code.to_string(),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// Parse an optional numeric input. A blank value means the field is unset.
pub fn parse_blank<T: FromStr>(raw: &str) -> Result<Option<T>, T::Err> {
    match raw.trim() {
        "" => Ok(None),
        s => s.parse().map(Some),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CheckboxValue {
    Flag(bool),
    Text(String),
}

/// HTML checkboxes submit `on` when ticked and nothing otherwise. A rendered
/// form carries a plain boolean instead.
pub fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match CheckboxValue::deserialize(deserializer)? {
        CheckboxValue::Flag(flag) => flag,
        CheckboxValue::Text(raw) => matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "on" | "true" | "1" | "yes"
        ),
    })
}

/// A form body whose decoding is deferred until the request has passed its
/// permission and lookup checks.
pub type FormBody<F> = Result<Form<F>, FormRejection>;

pub fn take<F>(body: FormBody<F>) -> Result<F, AppError> {
    let Form(form) = body?;
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PostForm, ProposalForm};

    #[test]
    fn blank_numbers_parse_as_none() {
        assert_eq!(parse_blank::<f64>("  "), Ok(None));
        assert_eq!(parse_blank::<f64>("2.5"), Ok(Some(2.5)));
        assert!(parse_blank::<f64>("north").is_err());
    }

    #[test]
    fn garbage_coordinates_still_bind() {
        let form: ProposalForm =
            serde_urlencoded::from_str("title=t&description=d&latitude=north").unwrap();
        assert_eq!(form.latitude, "north");
        assert!(check(&form).unwrap_err().contains_key("latitude"));
    }

    #[test]
    fn checkbox_values() {
        let on: PostForm = serde_urlencoded::from_str("title=t&message=m&pub_index=on").unwrap();
        assert!(on.pub_index);
        let off: PostForm = serde_urlencoded::from_str("title=t&message=m").unwrap();
        assert!(!off.pub_index);
        let explicit: PostForm =
            serde_urlencoded::from_str("title=t&message=m&pub_index=false").unwrap();
        assert!(!explicit.pub_index);
    }

    #[test]
    fn rendered_forms_read_back() {
        let post = PostForm {
            title: "t".to_string(),
            message: "m".to_string(),
            pub_index: true,
        };
        let json = serde_json::to_string(&post).unwrap();
        assert_eq!(serde_json::from_str::<PostForm>(&json).unwrap(), post);

        let proposal = ProposalForm {
            title: "t".to_string(),
            description: "d".to_string(),
            latitude: "42.23".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&proposal).unwrap();
        assert_eq!(serde_json::from_str::<ProposalForm>(&json).unwrap(), proposal);
    }

    #[test]
    fn check_collects_messages_per_field() {
        let errors = check(&PostForm::default()).unwrap_err();
        assert_eq!(
            errors.get("title").map(Vec::as_slice),
            Some(&["Title must be between 1 and 200 characters".to_string()][..])
        );
        assert!(errors.contains_key("message"));
        assert!(!errors.contains_key("pub_index"));
    }
}
