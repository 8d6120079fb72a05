// ============================
// crates/backend-lib/src/validation.rs
// ============================
//! Input validation for the REST surface.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

const MIN_NAME_LENGTH: usize = 2;
const MAX_NAME_LENGTH: usize = 50;
const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_TITLE_LENGTH: usize = 100;
const MAX_DESCRIPTION_LENGTH: usize = 1000;
const MAX_DESTINATION_LENGTH: usize = 100;
pub const MIN_PARTICIPANTS: u32 = 2;
pub const MAX_PARTICIPANTS: u32 = 50;
const MAX_REQUEST_MESSAGE_LENGTH: usize = 500;
const MAX_CHAT_CONTENT_LENGTH: usize = 1000;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Name must be between 2 and 50 characters")]
    InvalidName,

    #[error("Please provide a valid email")]
    InvalidEmail,

    #[error("Password must be at least 6 characters")]
    InvalidPassword,

    #[error("Please add a trip title")]
    MissingTitle,

    #[error("Title cannot be more than 100 characters")]
    TitleTooLong,

    #[error("Please add a description")]
    MissingDescription,

    #[error("Description cannot be more than 1000 characters")]
    DescriptionTooLong,

    #[error("Please add a destination")]
    MissingDestination,

    #[error("Destination cannot be more than 100 characters")]
    DestinationTooLong,

    #[error("End date must be after start date")]
    InvalidDateRange,

    #[error("Maximum participants must be at least 2")]
    TooFewParticipants,

    #[error("Maximum participants cannot exceed 50")]
    TooManyParticipants,

    #[error("Estimated cost cannot be negative")]
    NegativeCost,

    #[error("Please add a message")]
    MissingRequestMessage,

    #[error("Message cannot be more than 500 characters")]
    RequestMessageTooLong,

    #[error("Message cannot be empty")]
    EmptyChatContent,

    #[error("Message cannot be more than 1000 characters")]
    ChatContentTooLong,
}

pub type ValidationResult = Result<(), ValidationError>;

pub fn validate_name(name: &str) -> ValidationResult {
    let len = name.trim().chars().count();
    if len < MIN_NAME_LENGTH || len > MAX_NAME_LENGTH {
        return Err(ValidationError::InvalidName);
    }
    Ok(())
}

pub fn validate_email(email: &str) -> ValidationResult {
    if !EMAIL_REGEX.is_match(email.trim()) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> ValidationResult {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword);
    }
    Ok(())
}

pub fn validate_trip_fields(
    title: &str,
    description: &str,
    destination: &str,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    max_participants: u32,
    estimated_cost: f64,
) -> ValidationResult {
    if title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong);
    }
    if description.trim().is_empty() {
        return Err(ValidationError::MissingDescription);
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooLong);
    }
    if destination.trim().is_empty() {
        return Err(ValidationError::MissingDestination);
    }
    if destination.chars().count() > MAX_DESTINATION_LENGTH {
        return Err(ValidationError::DestinationTooLong);
    }
    if end_date <= start_date {
        return Err(ValidationError::InvalidDateRange);
    }
    if max_participants < MIN_PARTICIPANTS {
        return Err(ValidationError::TooFewParticipants);
    }
    if max_participants > MAX_PARTICIPANTS {
        return Err(ValidationError::TooManyParticipants);
    }
    if estimated_cost < 0.0 {
        return Err(ValidationError::NegativeCost);
    }
    Ok(())
}

pub fn validate_request_message(message: &str) -> ValidationResult {
    if message.trim().is_empty() {
        return Err(ValidationError::MissingRequestMessage);
    }
    if message.chars().count() > MAX_REQUEST_MESSAGE_LENGTH {
        return Err(ValidationError::RequestMessageTooLong);
    }
    Ok(())
}

pub fn validate_chat_content(content: &str) -> ValidationResult {
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyChatContent);
    }
    if content.chars().count() > MAX_CHAT_CONTENT_LENGTH {
        return Err(ValidationError::ChatContentTooLong);
    }
    Ok(())
}
