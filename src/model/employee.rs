use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": "5f0c1f7e-1c1b-4a57-9c43-46a2a3d1f2b1",
        "name": "Asha Patel",
        "mobile": "9876543210",
        "role_id": 2
    })
)]
pub struct Employee {
    #[schema(example = "5f0c1f7e-1c1b-4a57-9c43-46a2a3d1f2b1")]
    pub id: String,

    #[schema(example = "Asha Patel")]
    pub name: String,

    #[schema(example = "9876543210")]
    pub mobile: String,

    #[schema(example = 2)]
    pub role_id: u8,
}

/// Strips everything but digits: "+91 98765-43210" -> "919876543210".
pub fn normalize_mobile(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Mobile numbers are stored as exactly ten digits.
pub fn is_valid_mobile(normalized: &str) -> bool {
    normalized.len() == 10 && normalized.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_is_normalized_to_digits() {
        assert_eq!(normalize_mobile("98765-43210"), "9876543210");
        assert_eq!(normalize_mobile(" (987) 654 3210 "), "9876543210");
        assert_eq!(normalize_mobile("abc"), "");
    }

    #[test]
    fn only_ten_digit_numbers_are_valid() {
        assert!(is_valid_mobile("9876543210"));
        assert!(!is_valid_mobile("987654321"));
        assert!(!is_valid_mobile("919876543210"));
        assert!(!is_valid_mobile(""));
    }
}
