//! Provider error signatures.
//!
//! The identity provider reports misconfiguration and user abandonment only
//! through error codes and message text. These classifiers cover the known
//! signatures; the set is closed but not exhaustive, so a new provider code
//! lands in [`ErrorSignature::Unrecognized`] until a classifier is added.

use crate::error::{codes, ProviderError};
use crate::types::ConfigurationErrorKind;

const REDIRECT_MISMATCH_CODE: &str = "AADSTS50011";
const REDIRECT_MISMATCH_PATTERNS: &[&str] = &[
    "AADSTS50011",
    "redirect URI",
    "does not match the redirect URIs configured",
];

const SPA_CODE: &str = "invalid_request";
const SPA_PATTERNS: &[&str] = &[
    "AADSTS9002326",
    "Cross-origin token redemption is permitted only for the 'Single-Page Application'",
];

const POPUP_CLOSED_PATTERNS: &[&str] = &["window closed", "popup"];

/// Known failure shapes, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSignature {
    RedirectUriMismatch,
    SpaMisconfiguration,
    InteractionInProgress,
    PopupClosed,
    UserCancelled,
    Unrecognized,
}

impl ErrorSignature {
    pub fn configuration_kind(&self) -> Option<ConfigurationErrorKind> {
        match self {
            ErrorSignature::RedirectUriMismatch => {
                Some(ConfigurationErrorKind::RedirectUriMismatch)
            }
            ErrorSignature::SpaMisconfiguration => Some(ConfigurationErrorKind::Spa),
            _ => None,
        }
    }
}

pub fn is_redirect_uri_mismatch(err: &ProviderError) -> bool {
    err.is_code(REDIRECT_MISMATCH_CODE)
        || REDIRECT_MISMATCH_PATTERNS
            .iter()
            .any(|pattern| err.message.contains(pattern))
}

pub fn is_spa_configuration_error(err: &ProviderError) -> bool {
    err.is_code(SPA_CODE) || SPA_PATTERNS.iter().any(|pattern| err.message.contains(pattern))
}

/// Popup closed, by explicit code or by message pattern.
pub fn is_popup_closed(err: &ProviderError) -> bool {
    if err.is_code(codes::POPUP_WINDOW_CLOSED) {
        return true;
    }
    let message = err.message.to_lowercase();
    POPUP_CLOSED_PATTERNS
        .iter()
        .any(|pattern| message.contains(pattern))
}

pub fn is_user_cancelled(err: &ProviderError) -> bool {
    err.is_code(codes::USER_CANCELLED)
}

pub fn is_interaction_in_progress(err: &ProviderError) -> bool {
    err.is_code(codes::INTERACTION_IN_PROGRESS)
}

/// Configuration sub-kind, if the error carries a registration signature.
///
/// Redirect-URI mismatch is checked first: a mismatch reported with code
/// `invalid_request` must not be reported as an SPA problem.
pub fn configuration_error(err: &ProviderError) -> Option<ConfigurationErrorKind> {
    classify(err).configuration_kind()
}

/// Classify `err` into exactly one signature.
///
/// Popup-closed wins over user cancellation when both could apply.
pub fn classify(err: &ProviderError) -> ErrorSignature {
    if is_redirect_uri_mismatch(err) {
        ErrorSignature::RedirectUriMismatch
    } else if is_spa_configuration_error(err) {
        ErrorSignature::SpaMisconfiguration
    } else if is_interaction_in_progress(err) {
        ErrorSignature::InteractionInProgress
    } else if is_popup_closed(err) {
        ErrorSignature::PopupClosed
    } else if is_user_cancelled(err) {
        ErrorSignature::UserCancelled
    } else {
        ErrorSignature::Unrecognized
    }
}
