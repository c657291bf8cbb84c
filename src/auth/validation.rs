use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::dto::{LoginRequest, RegisterRequest};

pub const REGISTER_PASSWORD_MIN: usize = 6;
pub const LOGIN_PASSWORD_MAX: usize = 128;

/// One field-level problem found while checking a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub code: &'static str,
    pub path: Vec<String>,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(code: &'static str, field: &str, message: impl Into<String>) -> Self {
        Self {
            code,
            path: vec![field.to_string()],
            message: message.into(),
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registration input after a successful check.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub fn validate_registration(req: RegisterRequest) -> Result<NewRegistration, Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let name = req.name.unwrap_or_default().trim().to_string();
    if name.is_empty() {
        issues.push(ValidationIssue::new("too_small", "name", "Name is required"));
    }

    let email = normalize_email(&req.email.unwrap_or_default());
    if !is_valid_email(&email) {
        issues.push(ValidationIssue::new("invalid_string", "email", "Invalid email"));
    }

    let password = req.password.unwrap_or_default();
    if password.chars().count() < REGISTER_PASSWORD_MIN {
        issues.push(ValidationIssue::new(
            "too_small",
            "password",
            format!("Password must be at least {REGISTER_PASSWORD_MIN} characters"),
        ));
    }

    if issues.is_empty() {
        Ok(NewRegistration { name, email, password })
    } else {
        Err(issues)
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Server-side login check. Strength rules are the form's job; here a
/// password only has to be present and bounded so credentials from any
/// registration can be checked.
pub fn validate_login(req: LoginRequest) -> Result<Credentials, Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let email = normalize_email(&req.email.unwrap_or_default());
    if email.is_empty() {
        issues.push(ValidationIssue::new("too_small", "email", "Email is required"));
    } else if !is_valid_email(&email) {
        issues.push(ValidationIssue::new(
            "invalid_string",
            "email",
            "Email must be a valid email address",
        ));
    }

    let password = req.password.unwrap_or_default();
    let len = password.chars().count();
    if len == 0 {
        issues.push(ValidationIssue::new("too_small", "password", "Password is required"));
    } else if len > LOGIN_PASSWORD_MAX {
        issues.push(ValidationIssue::new(
            "too_big",
            "password",
            format!("Password must be at most {LOGIN_PASSWORD_MAX} characters"),
        ));
    }

    if issues.is_empty() {
        Ok(Credentials { email, password })
    } else {
        Err(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: Some(name.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    fn fields(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.path[0].as_str()).collect()
    }

    #[test]
    fn accepts_minimal_registration_and_normalizes_email() {
        let ok = validate_registration(register(" A ", "  A@X.com ", "secret1")).unwrap();
        assert_eq!(ok.name, "A");
        assert_eq!(ok.email, "a@x.com");
        assert_eq!(ok.password, "secret1");
    }

    #[test]
    fn reports_every_bad_registration_field() {
        let issues = validate_registration(register("", "not-an-email", "12345")).unwrap_err();
        assert_eq!(fields(&issues), vec!["name", "email", "password"]);
        assert_eq!(issues[2].message, "Password must be at least 6 characters");
    }

    #[test]
    fn missing_registration_fields_are_issues() {
        let req = RegisterRequest { name: None, email: None, password: None };
        let issues = validate_registration(req).unwrap_err();
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a x@y.com"));
        assert!(!is_valid_email("@x.com"));
    }

    #[test]
    fn login_accepts_any_registered_password() {
        let req = LoginRequest {
            email: Some(" Shopper@Example.COM".into()),
            password: Some("secret1".into()),
        };
        let creds = validate_login(req).unwrap();
        assert_eq!(creds.email, "shopper@example.com");
        assert_eq!(creds.password, "secret1");
    }

    #[test]
    fn login_reports_missing_fields() {
        let req = LoginRequest { email: Some("   ".into()), password: None };
        let issues = validate_login(req).unwrap_err();
        assert_eq!(fields(&issues), vec!["email", "password"]);
        assert_eq!(issues[0].message, "Email is required");
        assert_eq!(issues[1].message, "Password is required");
    }

    #[test]
    fn login_password_upper_bound() {
        let req = LoginRequest {
            email: Some("a@x.com".into()),
            password: Some("x".repeat(LOGIN_PASSWORD_MAX)),
        };
        assert!(validate_login(req).is_ok());

        let req = LoginRequest {
            email: Some("a@x.com".into()),
            password: Some("x".repeat(LOGIN_PASSWORD_MAX + 1)),
        };
        let issues = validate_login(req).unwrap_err();
        assert_eq!(issues[0].code, "too_big");
    }
}
