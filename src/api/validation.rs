use super::ApiError;

pub const ADMIN_ROLES: [&str; 3] = ["super_admin", "admin", "staff"];
pub const ADMIN_STATUSES: [&str; 3] = ["active", "inactive", "suspended"];
pub const ATTENDANCE_STATUSES: [&str; 3] = ["present", "absent", "late"];
pub const FEE_FREQUENCIES: [&str; 4] = ["monthly", "quarterly", "annual", "one_time"];
pub const PAYMENT_METHODS: [&str; 7] = [
    "cash",
    "card",
    "credit_card",
    "bank_transfer",
    "check",
    "online",
    "other",
];

pub fn validate_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

pub fn validate_page_size(page_size: u64) -> Result<u64, ApiError> {
    const MAX_PAGE_SIZE: u64 = 200;

    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ApiError::validation(format!(
            "Invalid page size: {}. Must be between 1 and {}",
            page_size, MAX_PAGE_SIZE
        )));
    }
    Ok(page_size)
}

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    if username.is_empty() {
        return Err(ApiError::validation("Username cannot be empty"));
    }

    if username.len() > 150 {
        return Err(ApiError::validation(
            "Username must be 150 characters or less",
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == '_' || c == '@')
    {
        return Err(ApiError::validation(
            "Username can only contain letters, numbers, and . - _ @",
        ));
    }

    Ok(username)
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Email cannot be empty"));
    }

    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(ApiError::validation("Email must contain an @"));
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ApiError::validation("Email address is malformed"));
    }

    Ok(trimmed)
}

pub fn validate_date<'a>(date: &'a str, field: &str) -> Result<&'a str, ApiError> {
    if chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        return Err(ApiError::validation(format!(
            "Invalid {}: '{}'. Expected YYYY-MM-DD",
            field, date
        )));
    }
    Ok(date)
}

pub fn validate_choice<'a>(
    value: &'a str,
    allowed: &[&str],
    field: &str,
) -> Result<&'a str, ApiError> {
    if !allowed.contains(&value) {
        return Err(ApiError::validation(format!(
            "Invalid {}: '{}'. Allowed values: {}",
            field,
            value,
            allowed.join(", ")
        )));
    }
    Ok(value)
}

pub fn validate_name<'a>(name: &'a str, field: &str) -> Result<&'a str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{} cannot be empty", field)));
    }
    if trimmed.len() > 100 {
        return Err(ApiError::validation(format!(
            "{} must be 100 characters or less",
            field
        )));
    }
    Ok(trimmed)
}

pub fn validate_non_negative(value: f64, field: &str) -> Result<f64, ApiError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::validation(format!(
            "Invalid {}: {}. Must be a non-negative number",
            field, value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id(1).is_ok());
        assert!(validate_id(12345).is_ok());
        assert!(validate_id(0).is_err());
        assert!(validate_id(-1).is_err());
    }

    #[test]
    fn test_validate_page_size() {
        assert!(validate_page_size(1).is_ok());
        assert!(validate_page_size(50).is_ok());
        assert!(validate_page_size(200).is_ok());
        assert!(validate_page_size(0).is_err());
        assert!(validate_page_size(201).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("jdoe").is_ok());
        assert!(validate_username("j.doe-2@school").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username("a".repeat(151).as_str()).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("jdoe@school.example").is_ok());
        assert!(validate_email("  padded@school.example ").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("user@nodot").is_err());
    }

    #[test]
    fn test_validate_date() {
        assert!(validate_date("2024-09-01", "date").is_ok());
        assert!(validate_date("2024-13-01", "date").is_err());
        assert!(validate_date("yesterday", "date").is_err());
    }

    #[test]
    fn test_validate_choice() {
        assert!(validate_choice("present", &ATTENDANCE_STATUSES, "status").is_ok());
        assert!(validate_choice("osmosis", &ATTENDANCE_STATUSES, "status").is_err());
        assert!(validate_choice("super_admin", &ADMIN_ROLES, "role").is_ok());
        assert!(validate_choice("overlord", &ADMIN_ROLES, "role").is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative(0.0, "amount").is_ok());
        assert!(validate_non_negative(120.5, "amount").is_ok());
        assert!(validate_non_negative(-1.0, "amount").is_err());
        assert!(validate_non_negative(f64::NAN, "amount").is_err());
    }
}
