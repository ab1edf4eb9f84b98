use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::forms::parse_blank;

/// A citizen-submitted proposal inside a [`Space`](super::Space).
///
/// `space_id`, `author` and `support_votes` are assigned by the server when
/// the proposal is created and never read from client input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: i64,
    pub space_id: i64,
    pub title: String,
    pub description: String,
    pub tags: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub closed: bool,
    /// Username of the submitter.
    pub author: String,
    pub support_votes: i64,
    pub pub_date: DateTime<Utc>,
}

/// The user-editable fields of a proposal, as submitted from the add and
/// edit forms.
///
/// Coordinates stay as submitted text so that a bad value comes back as a
/// field error alongside what the user typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProposalForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "Tags must be at most 255 characters"))]
    pub tags: String,
    #[serde(default)]
    #[validate(custom(function = "validate_latitude"))]
    pub latitude: String,
    #[serde(default)]
    #[validate(custom(function = "validate_longitude"))]
    pub longitude: String,
}

impl ProposalForm {
    /// Parsed `(latitude, longitude)`. Blank or unparsable values are `None`;
    /// callers persist only validated forms.
    pub fn coordinates(&self) -> (Option<f64>, Option<f64>) {
        (
            parse_blank(&self.latitude).ok().flatten(),
            parse_blank(&self.longitude).ok().flatten(),
        )
    }
}

fn coordinate(raw: &str, limit: f64, name: &'static str) -> Result<(), ValidationError> {
    match parse_blank::<f64>(raw) {
        Ok(None) => Ok(()),
        Ok(Some(v)) if (-limit..=limit).contains(&v) => Ok(()),
        Ok(Some(_)) => Err(ValidationError::new("range").with_message(Cow::Owned(format!(
            "{name} must be between -{limit} and {limit}"
        )))),
        Err(_) => Err(ValidationError::new("number")
            .with_message(Cow::Owned(format!("{name} must be a number")))),
    }
}

fn validate_latitude(raw: &str) -> Result<(), ValidationError> {
    coordinate(raw, 90.0, "Latitude")
}

fn validate_longitude(raw: &str) -> Result<(), ValidationError> {
    coordinate(raw, 180.0, "Longitude")
}

fn coordinate_text(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl From<&Proposal> for ProposalForm {
    fn from(p: &Proposal) -> Self {
        Self {
            title: p.title.clone(),
            description: p.description.clone(),
            tags: p.tags.clone(),
            latitude: coordinate_text(p.latitude),
            longitude: coordinate_text(p.longitude),
        }
    }
}

/// Input for persisting a new proposal. Built by the server from a validated
/// [`ProposalForm`] plus the server-owned fields.
#[derive(Debug, Clone)]
pub struct CreateProposalInput {
    pub space_id: i64,
    pub author: String,
    pub form: ProposalForm,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ProposalForm {
        ProposalForm {
            title: "More bike lanes".to_string(),
            description: "Connect the university with the centre".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_minimal_form() {
        assert!(valid_form().validate().is_ok());
    }

    #[test]
    fn rejects_missing_title_and_description() {
        let errors = ProposalForm::default().validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("description"));
    }

    #[test]
    fn rejects_overlong_title() {
        let form = ProposalForm {
            title: "x".repeat(101),
            ..valid_form()
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let form = ProposalForm {
            latitude: "91".to_string(),
            longitude: "-181".to_string(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("latitude"));
        assert!(errors.field_errors().contains_key("longitude"));
    }

    #[test]
    fn rejects_non_numeric_coordinates() {
        let form = ProposalForm {
            latitude: "north".to_string(),
            ..valid_form()
        };
        let errors = crate::forms::check(&form).unwrap_err();
        assert_eq!(errors["latitude"], vec!["Latitude must be a number".to_string()]);
        assert!(!errors.contains_key("longitude"));
    }

    #[test]
    fn coordinates_parse_blank_as_unset() {
        let form = ProposalForm {
            latitude: " 42.23 ".to_string(),
            ..valid_form()
        };
        assert!(form.validate().is_ok());
        assert_eq!(form.coordinates(), (Some(42.23), None));
    }

    #[test]
    fn prefilled_form_round_trips_coordinates() {
        let proposal = Proposal {
            id: 1,
            space_id: 1,
            title: "t".to_string(),
            description: "d".to_string(),
            tags: String::new(),
            latitude: Some(42.23),
            longitude: None,
            closed: false,
            author: "ana".to_string(),
            support_votes: 0,
            pub_date: Utc::now(),
        };
        let form = ProposalForm::from(&proposal);
        assert_eq!(form.latitude, "42.23");
        assert_eq!(form.longitude, "");
        assert_eq!(form.coordinates(), (Some(42.23), None));
    }
}
