//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::error::AuthError;
use crate::models::{
    LearningStyle, NewStudent, PersonalityType, ProfileChanges, ProfileUpdate, RegistrationRequest,
};

const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_TEXT_LENGTH: usize = 100;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate phone number (exactly 10 digits)
pub fn validate_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit())
}

/// Validate year of study
pub fn validate_year(year: i64) -> bool {
    (1..=6).contains(&year)
}

/// Validate GPA on a 10-point scale, both ends inclusive
pub fn validate_gpa(gpa: f64) -> bool {
    (0.0..=10.0).contains(&gpa)
}

/// Strip HTML tags, trim, and cap the length in characters
pub fn sanitize_input(text: &str, max_length: usize) -> String {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = TAG_REGEX.get_or_init(|| Regex::new(r"<[^>]+>").expect("Failed to compile tag regex"));

    let stripped = regex.replace_all(text, "");
    stripped.trim().chars().take(max_length).collect()
}

/// Check a login request before any store access
///
/// Returns the trimmed email and password.
pub fn validate_login<'a>(email: &'a str, password: &'a str) -> Result<(&'a str, &'a str), AuthError> {
    let email = email.trim();
    let password = password.trim();

    if email.is_empty() || password.is_empty() {
        return Err(AuthError::InvalidInput(
            "Email and password are required".to_string(),
        ));
    }

    validate_email(email).map_err(AuthError::InvalidInput)?;

    Ok((email, password))
}

fn trimmed(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Validate a registration request, reporting every problem at once
pub fn validate_registration(request: &RegistrationRequest) -> Result<NewStudent, AuthError> {
    let mut errors = Vec::new();

    let name = trimmed(&request.name);
    if name.is_none() {
        errors.push("Name is required");
    }

    let email = trimmed(&request.email);
    if !email.as_deref().is_some_and(|e| validate_email(e).is_ok()) {
        errors.push("Valid email is required");
    }

    let srn = trimmed(&request.srn);
    if srn.is_none() {
        errors.push("SRN (Student ID) is required");
    }

    let phone = trimmed(&request.phone);
    if !phone.as_deref().is_some_and(validate_phone) {
        errors.push("Valid 10-digit phone number is required");
    }

    let password = trimmed(&request.password);
    if !password
        .as_deref()
        .is_some_and(|p| p.chars().count() >= MIN_PASSWORD_LENGTH)
    {
        errors.push("Password must be at least 6 characters");
    }

    let major = trimmed(&request.major);
    if major.is_none() {
        errors.push("Major is required");
    }

    let year = request.year.filter(|y| validate_year(*y));
    if year.is_none() {
        errors.push("Year must be between 1 and 6");
    }

    let gpa = request.gpa.filter(|g| validate_gpa(*g));
    if gpa.is_none() {
        errors.push("GPA must be between 0.0 and 10.0");
    }

    let learning_style =
        trimmed(&request.learning_style).and_then(|s| s.parse::<LearningStyle>().ok());
    if learning_style.is_none() {
        errors.push("Valid learning style is required");
    }

    let personality_type =
        trimmed(&request.personality_type).and_then(|s| s.parse::<PersonalityType>().ok());
    if personality_type.is_none() {
        errors.push("Valid personality type is required");
    }

    match (
        name,
        email,
        srn,
        phone,
        password,
        major,
        year,
        gpa,
        learning_style,
        personality_type,
    ) {
        (
            Some(name),
            Some(email),
            Some(srn),
            Some(phone),
            Some(password),
            Some(major),
            Some(year),
            Some(gpa),
            Some(learning_style),
            Some(personality_type),
        ) if errors.is_empty() => Ok(NewStudent {
            name,
            email,
            srn,
            phone,
            password,
            major,
            // 1..=6, checked above
            year: year as i16,
            gpa,
            learning_style,
            personality_type,
        }),
        _ => Err(AuthError::InvalidInput(errors.join("; "))),
    }
}

/// Validate a partial profile update
pub fn validate_profile_update(update: &ProfileUpdate) -> Result<ProfileChanges, AuthError> {
    let mut errors = Vec::new();
    let mut changes = ProfileChanges {
        needs_help: update.needs_help,
        can_teach: update.can_teach,
        ..Default::default()
    };

    if let Some(name) = trimmed(&update.name) {
        let name = sanitize_input(&name, MAX_TEXT_LENGTH);
        if name.is_empty() {
            errors.push("Name is required");
        } else {
            changes.name = Some(name);
        }
    }

    if let Some(phone) = trimmed(&update.phone) {
        if validate_phone(&phone) {
            changes.phone = Some(phone);
        } else {
            errors.push("Valid 10-digit phone number is required");
        }
    }

    if let Some(major) = trimmed(&update.major) {
        let major = sanitize_input(&major, MAX_TEXT_LENGTH);
        if !major.is_empty() {
            changes.major = Some(major);
        }
    }

    if let Some(year) = update.year {
        if validate_year(year) {
            changes.year = Some(year as i16);
        } else {
            errors.push("Year must be between 1 and 6");
        }
    }

    if let Some(gpa) = update.gpa {
        if validate_gpa(gpa) {
            changes.gpa = Some(gpa);
        } else {
            errors.push("GPA must be between 0.0 and 10.0");
        }
    }

    if let Some(style) = trimmed(&update.learning_style) {
        match style.parse::<LearningStyle>() {
            Ok(style) => changes.learning_style = Some(style),
            Err(()) => errors.push("Invalid learning style"),
        }
    }

    if let Some(kind) = trimmed(&update.personality_type) {
        match kind.parse::<PersonalityType>() {
            Ok(kind) => changes.personality_type = Some(kind),
            Err(()) => errors.push("Invalid personality type"),
        }
    }

    if errors.is_empty() {
        Ok(changes)
    } else {
        Err(AuthError::InvalidInput(errors.join("; ")))
    }
}
