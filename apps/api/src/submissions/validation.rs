//! Application form validation.
//!
//! Checks every field and reports all violations at once, so the client can
//! show them together. A successful validation yields normalized values:
//! trimmed email in lowercase, blank phone dropped.

use serde::{Deserialize, Serialize};

const NAME_MAX_CHARS: usize = 50;
const EMAIL_MAX_CHARS: usize = 255;
const PHONE_MIN_CHARS: usize = 10;
const JOB_DESCRIPTION_MIN_CHARS: usize = 10;
const JOB_DESCRIPTION_MAX_CHARS: usize = 2000;

/// Raw form fields as received from the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub job_description: String,
}

/// Form fields after validation and normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidApplication {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub job_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_form(form: ApplicationForm) -> Result<ValidApplication, Vec<FieldError>> {
    let mut errors = Vec::new();

    validate_name("firstName", "First name", &form.first_name, &mut errors);
    validate_name("lastName", "Last name", &form.last_name, &mut errors);

    let email = form.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        errors.push(FieldError::new("email", "Invalid email address"));
    } else if email.chars().count() > EMAIL_MAX_CHARS {
        errors.push(FieldError::new(
            "email",
            format!("Email must be less than {EMAIL_MAX_CHARS} characters"),
        ));
    }

    let phone = form.phone.filter(|p| !p.trim().is_empty());
    if let Some(phone) = &phone {
        if !is_valid_phone(phone) {
            errors.push(FieldError::new("phone", "Please enter a valid phone number"));
        }
    }

    let description_chars = form.job_description.chars().count();
    if description_chars < JOB_DESCRIPTION_MIN_CHARS {
        errors.push(FieldError::new(
            "jobDescription",
            format!("Job description must be at least {JOB_DESCRIPTION_MIN_CHARS} characters"),
        ));
    } else if description_chars > JOB_DESCRIPTION_MAX_CHARS {
        errors.push(FieldError::new(
            "jobDescription",
            format!("Job description must be less than {JOB_DESCRIPTION_MAX_CHARS} characters"),
        ));
    } else if form.job_description.trim().chars().count() < JOB_DESCRIPTION_MIN_CHARS {
        errors.push(FieldError::new(
            "jobDescription",
            "Job description cannot be just whitespace",
        ));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidApplication {
        first_name: form.first_name,
        last_name: form.last_name,
        email,
        phone,
        job_description: form.job_description,
    })
}

/// Joins field errors into one human-readable message.
pub fn describe_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn validate_name(field: &'static str, label: &str, value: &str, errors: &mut Vec<FieldError>) {
    let chars = value.chars().count();
    if chars == 0 {
        errors.push(FieldError::new(field, format!("{label} is required")));
    } else if chars > NAME_MAX_CHARS {
        errors.push(FieldError::new(
            field,
            format!("{label} must be less than {NAME_MAX_CHARS} characters"),
        ));
    } else if !value
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || c == '-' || c == '\'')
    {
        errors.push(FieldError::new(
            field,
            format!("{label} can only contain letters, spaces, hyphens, and apostrophes"),
        ));
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

fn is_valid_phone(phone: &str) -> bool {
    phone.chars().count() >= PHONE_MIN_CHARS
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '-' | '+' | '(' | ')'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ApplicationForm {
        ApplicationForm {
            first_name: "Mary-Jane".to_string(),
            last_name: "O'Neil".to_string(),
            email: "  Mary.ONeil@Example.COM ".to_string(),
            phone: Some("+1 (555) 123-4567".to_string()),
            job_description: "Backend engineer working on payments".to_string(),
        }
    }

    fn fields(errors: &[FieldError]) -> Vec<&'static str> {
        errors.iter().map(|e| e.field).collect()
    }

    #[test]
    fn test_valid_form_is_normalized() {
        let valid = validate_form(valid_form()).unwrap();
        assert_eq!(valid.email, "mary.oneil@example.com");
        assert_eq!(valid.phone.as_deref(), Some("+1 (555) 123-4567"));
        assert_eq!(valid.first_name, "Mary-Jane");
    }

    #[test]
    fn test_blank_phone_is_dropped() {
        let mut form = valid_form();
        form.phone = Some("   ".to_string());
        assert_eq!(validate_form(form).unwrap().phone, None);
    }

    #[test]
    fn test_all_errors_are_collected() {
        let form = ApplicationForm {
            first_name: String::new(),
            last_name: "Smith3".to_string(),
            email: "not-an-email".to_string(),
            phone: Some("12345".to_string()),
            job_description: "short".to_string(),
        };
        let errors = validate_form(form).unwrap_err();
        assert_eq!(
            fields(&errors),
            vec!["firstName", "lastName", "email", "phone", "jobDescription"]
        );
        assert!(describe_errors(&errors).contains("First name is required"));
    }

    #[test]
    fn test_name_length_limit() {
        let mut form = valid_form();
        form.first_name = "a".repeat(51);
        let errors = validate_form(form).unwrap_err();
        assert_eq!(errors[0].message, "First name must be less than 50 characters");

        let mut form = valid_form();
        form.first_name = "a".repeat(50);
        assert!(validate_form(form).is_ok());
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@@b.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@b..co"));
    }

    #[test]
    fn test_overlong_email_rejected() {
        let mut form = valid_form();
        form.email = format!("{}@example.com", "a".repeat(250));
        let errors = validate_form(form).unwrap_err();
        assert_eq!(fields(&errors), vec!["email"]);
    }

    #[test]
    fn test_phone_rules() {
        assert!(is_valid_phone("555-123-4567"));
        assert!(!is_valid_phone("555-1234"));
        assert!(!is_valid_phone("555-123-4567 ext"));
    }

    #[test]
    fn test_whitespace_padded_description_rejected() {
        let mut form = valid_form();
        form.job_description = format!("  {}  ", "abc def");
        let errors = validate_form(form).unwrap_err();
        assert_eq!(errors[0].message, "Job description cannot be just whitespace");
    }

    #[test]
    fn test_description_upper_bound() {
        let mut form = valid_form();
        form.job_description = "x".repeat(2001);
        assert!(validate_form(form).is_err());

        let mut form = valid_form();
        form.job_description = "x".repeat(2000);
        assert!(validate_form(form).is_ok());
    }
}
