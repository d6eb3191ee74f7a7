//! Shipping addresses.

use serde::{Deserialize, Serialize};

use super::validation::required;
use super::{AddressId, Email, UserId, ValidationError};

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
    pub phone: String,
}

/// Address input from the checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
    pub phone: String,
}

/// A validated [`NewAddress`], ready to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
    pub phone: String,
}

impl NewAddress {
    /// Check required fields and normalize the address.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, in form order.
    pub fn validate(&self) -> Result<ValidAddress, ValidationError> {
        let first_name = required("firstName", &self.first_name)?;
        let last_name = required("lastName", &self.last_name)?;
        let email = Email::parse(&self.email)
            .map_err(|e| ValidationError::invalid("email", e.to_string()))?;
        let street = required("street", &self.street)?;
        let city = required("city", &self.city)?;
        let state = required("state", &self.state)?;
        let zipcode = required("zipcode", &self.zipcode)?;
        if !zipcode
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
        {
            return Err(ValidationError::invalid(
                "zipcode",
                "may only contain letters, digits, spaces and dashes",
            ));
        }
        let country = required("country", &self.country)?;
        let phone = required("phone", &self.phone)?;
        if phone.chars().filter(char::is_ascii_digit).count() < 6 {
            return Err(ValidationError::invalid("phone", "must contain at least 6 digits"));
        }

        Ok(ValidAddress {
            first_name,
            last_name,
            email,
            street,
            city,
            state,
            zipcode,
            country,
            phone,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> NewAddress {
        NewAddress {
            first_name: "Asha".to_owned(),
            last_name: "Rao".to_owned(),
            email: "Asha@Example.com".to_owned(),
            street: "12 MG Road".to_owned(),
            city: "Bengaluru".to_owned(),
            state: "KA".to_owned(),
            zipcode: "560001".to_owned(),
            country: "India".to_owned(),
            phone: "+91 98450 00000".to_owned(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_form() {
        let address = form().validate().unwrap();
        assert_eq!(address.email.as_str(), "asha@example.com");
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let mut input = form();
        input.city = "  ".to_owned();
        input.phone = String::new();
        assert_eq!(input.validate(), Err(ValidationError::Missing("city")));
    }

    #[test]
    fn test_validate_rejects_bad_phone_and_zip() {
        let mut input = form();
        input.phone = "12-34".to_owned();
        assert!(matches!(
            input.validate(),
            Err(ValidationError::Invalid { field: "phone", .. })
        ));

        let mut input = form();
        input.zipcode = "56#001".to_owned();
        assert!(matches!(
            input.validate(),
            Err(ValidationError::Invalid { field: "zipcode", .. })
        ));
    }
}
