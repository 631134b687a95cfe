use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::order::Customer;
use crate::forms::sanitize_inline_text;

lazy_static! {
    /// Local mobile numbers: `03` followed by nine digits, e.g. `03001234567`.
    pub static ref PHONE_PATTERN: Regex = Regex::new(r"^03\d{9}$").expect("valid phone pattern");
}

/// Per-field messages keyed by the form field name.
pub type FieldErrors = BTreeMap<String, String>;

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Shipping form submitted from the checkout page.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct CheckoutForm {
    #[validate(custom(function = "not_blank", message = "First name is required"))]
    #[serde(default)]
    pub first_name: String,
    #[validate(custom(function = "not_blank", message = "Last name is required"))]
    #[serde(default)]
    pub last_name: String,
    #[validate(custom(function = "not_blank", message = "Address is required"))]
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub apartment: Option<String>,
    #[validate(custom(function = "not_blank", message = "City is required"))]
    #[serde(default)]
    pub city: String,
    #[validate(regex(
        path = *PHONE_PATTERN,
        message = "Enter a valid phone number, e.g. 03001234567"
    ))]
    #[serde(default)]
    pub phone: String,
    #[validate(email(message = "Enter a valid email address"))]
    #[serde(default)]
    pub email: Option<String>,
    /// HTML checkboxes are only submitted when ticked.
    #[serde(default)]
    pub save_info: Option<String>,
}

impl CheckoutForm {
    /// Trim every field and turn blank optional fields into `None`.
    fn normalized(self) -> Self {
        let optional = |value: Option<String>| {
            value
                .map(|value| sanitize_inline_text(&value))
                .filter(|value| !value.is_empty())
        };

        Self {
            first_name: sanitize_inline_text(&self.first_name),
            last_name: sanitize_inline_text(&self.last_name),
            address: sanitize_inline_text(&self.address),
            apartment: optional(self.apartment),
            city: sanitize_inline_text(&self.city),
            phone: self.phone.chars().filter(|ch| !ch.is_whitespace()).collect(),
            email: optional(self.email),
            save_info: self.save_info,
        }
    }

    /// Validate the shipping details and freeze them into a [`Customer`].
    pub fn into_customer(self) -> Result<Customer, FieldErrors> {
        let form = self.normalized();
        form.validate().map_err(|errors| field_errors(&errors))?;

        let save_info = form
            .save_info
            .as_deref()
            .is_some_and(|value| matches!(value, "on" | "true" | "1"));

        Ok(Customer {
            first_name: form.first_name,
            last_name: form.last_name,
            address: form.address,
            apartment: form.apartment,
            city: form.city,
            phone: form.phone,
            email: form.email,
            save_info,
        })
    }
}

/// Flatten validator output into one message per field.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errors)| {
            let message = errors.first().map(|error| {
                error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| format!("Invalid {field}"))
            })?;
            Some((field.to_string(), message))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> CheckoutForm {
        CheckoutForm {
            first_name: "Ayesha".to_string(),
            last_name: "Khan".to_string(),
            address: "12 Mall Road".to_string(),
            apartment: Some("  ".to_string()),
            city: "Lahore".to_string(),
            phone: "03001234567".to_string(),
            email: None,
            save_info: Some("on".to_string()),
        }
    }

    #[test]
    fn valid_form_becomes_customer() {
        let customer = valid_form().into_customer().unwrap();

        assert_eq!(customer.full_name(), "Ayesha Khan");
        assert_eq!(customer.apartment, None);
        assert!(customer.save_info);
    }

    #[test]
    fn blank_first_name_is_reported_on_that_field() {
        let errors = CheckoutForm {
            first_name: "   ".to_string(),
            ..valid_form()
        }
        .into_customer()
        .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get("first_name").map(String::as_str),
            Some("First name is required")
        );
    }

    #[test]
    fn phone_must_match_local_pattern() {
        for phone in ["3001234567", "0300123456", "04001234567", "0300-1234567x"] {
            let errors = CheckoutForm {
                phone: phone.to_string(),
                ..valid_form()
            }
            .into_customer()
            .unwrap_err();
            assert!(errors.contains_key("phone"), "{phone} should be rejected");
        }
    }

    #[test]
    fn phone_whitespace_is_ignored() {
        let customer = CheckoutForm {
            phone: " 0300 1234567 ".to_string(),
            ..valid_form()
        }
        .into_customer()
        .unwrap();

        assert_eq!(customer.phone, "03001234567");
    }

    #[test]
    fn every_failing_field_gets_a_message() {
        let errors = CheckoutForm::default().into_customer().unwrap_err();

        for field in ["first_name", "last_name", "address", "city", "phone"] {
            assert!(errors.contains_key(field), "missing error for {field}");
        }
        assert!(!errors.contains_key("email"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let errors = CheckoutForm {
            email: Some("not-an-email".to_string()),
            ..valid_form()
        }
        .into_customer()
        .unwrap_err();

        assert!(errors.contains_key("email"));
    }

    #[test]
    fn unticked_checkbox_means_no_save() {
        let customer = CheckoutForm {
            save_info: None,
            ..valid_form()
        }
        .into_customer()
        .unwrap();

        assert!(!customer.save_info);
    }
}
