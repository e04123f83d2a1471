//! Registration script — the fixed question sequence as a tagged step machine.

use serde::{Deserialize, Serialize};

/// Fallback prompt for a session that somehow outlived its final step.
pub const RESTART_PROMPT: &str = "Please start again by typing 'start'.";

/// The steps of the registration conversation.
///
/// Progresses linearly: AwaitingFullName → AwaitingEmail → … →
/// AwaitingTransmission → Confirming → Closed. `Confirming` is the terminal
/// scripted step ("you're now registered"); processing it triggers record
/// finalization. `Closed` is defensive only — a session should never be
/// observed there because finalization removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStep {
    AwaitingFullName,
    AwaitingEmail,
    AwaitingPhone,
    AwaitingBirthDate,
    AwaitingAddress,
    AwaitingLicenseAnswer,
    AwaitingLicenseNumber,
    AwaitingTransmission,
    Confirming,
    Closed,
}

impl RegistrationStep {
    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<RegistrationStep> {
        use RegistrationStep::*;
        match self {
            AwaitingFullName => Some(AwaitingEmail),
            AwaitingEmail => Some(AwaitingPhone),
            AwaitingPhone => Some(AwaitingBirthDate),
            AwaitingBirthDate => Some(AwaitingAddress),
            AwaitingAddress => Some(AwaitingLicenseAnswer),
            AwaitingLicenseAnswer => Some(AwaitingLicenseNumber),
            AwaitingLicenseNumber => Some(AwaitingTransmission),
            AwaitingTransmission => Some(Confirming),
            Confirming => Some(Closed),
            Closed => None,
        }
    }

    /// Whether this is the terminal scripted step — the one whose
    /// processing finalizes the record instead of merely prompting.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirming)
    }

    /// The prompt emitted when a message is handled at this step.
    ///
    /// `Closed` maps to the restart fallback, covering the "beyond the
    /// script" case.
    pub fn prompt(&self) -> &'static str {
        use RegistrationStep::*;
        match self {
            AwaitingFullName => "Hi there! What's your full name?",
            AwaitingEmail => "Great! What's your email address?",
            AwaitingPhone => "Can you provide your phone number?",
            AwaitingBirthDate => "What's your date of birth?",
            AwaitingAddress => "Please provide your address.",
            AwaitingLicenseAnswer => "Do you have a driving license? (Yes/No)",
            AwaitingLicenseNumber => {
                "If you have a license, please provide the license number."
            }
            AwaitingTransmission => "What transmission do you prefer? (Automatic/Manual)",
            Confirming => "Thanks for the info! You're now registered.",
            Closed => RESTART_PROMPT,
        }
    }

    /// The record field this step's question targets, if any.
    pub fn field(&self) -> Option<&'static str> {
        use RegistrationStep::*;
        match self {
            AwaitingFullName => Some("first_name"),
            AwaitingEmail => Some("email"),
            AwaitingPhone => Some("phone"),
            AwaitingBirthDate => Some("date_of_birth"),
            AwaitingAddress => Some("address"),
            AwaitingLicenseAnswer => Some("has_license"),
            AwaitingLicenseNumber => Some("license_number"),
            AwaitingTransmission => Some("preferred_transmission"),
            Confirming | Closed => None,
        }
    }
}

impl Default for RegistrationStep {
    fn default() -> Self {
        Self::AwaitingFullName
    }
}

impl std::fmt::Display for RegistrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingFullName => "awaiting_full_name",
            Self::AwaitingEmail => "awaiting_email",
            Self::AwaitingPhone => "awaiting_phone",
            Self::AwaitingBirthDate => "awaiting_birth_date",
            Self::AwaitingAddress => "awaiting_address",
            Self::AwaitingLicenseAnswer => "awaiting_license_answer",
            Self::AwaitingLicenseNumber => "awaiting_license_number",
            Self::AwaitingTransmission => "awaiting_transmission",
            Self::Confirming => "confirming",
            Self::Closed => "closed",
        };
        write!(f, "{s}")
    }
}
