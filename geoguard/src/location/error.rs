//! Location error taxonomy and message classification.
//!
//! The location collaborator usually reports failures as free text. The
//! [`classify_message`] function maps that text onto a fixed taxonomy so the
//! rest of the crate can branch on [`LocationErrorKind`] instead of matching
//! strings. Collaborators that know the failure kind up front can report it
//! with [`SourceError::Classified`] and skip text matching entirely.

use std::fmt;

use thiserror::Error;

/// Failure reported by a location collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Free-text failure message; classified by [`classify_message`].
    #[error("{0}")]
    Message(String),

    /// Failure whose kind the collaborator already knows.
    #[error("{detail}")]
    Classified {
        kind: LocationErrorKind,
        detail: String,
    },
}

impl SourceError {
    /// Resolve the taxonomy entry for this failure.
    pub fn kind(&self) -> LocationErrorKind {
        match self {
            Self::Message(message) => classify_message(message),
            Self::Classified { kind, .. } => *kind,
        }
    }
}

impl From<String> for SourceError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for SourceError {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

/// Location failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationErrorKind {
    /// The user denied location permission.
    PermissionDenied,
    /// Location access is restricted by policy (parental controls, MDM).
    PermissionRestricted,
    /// Location services / GPS are switched off.
    GpsDisabled,
    /// No satellite or network fix is available.
    NoSignal,
    /// No fix arrived within the allotted time.
    Timeout,
    /// The host view providing location is not ready.
    ViewNotReady,
    /// Anything the classifier does not recognise.
    Unknown,
    /// Another location operation is already in flight.
    Busy,
}

impl LocationErrorKind {
    /// Canned user-facing message.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Location permission was denied.",
            Self::PermissionRestricted => "Location access is restricted on this device.",
            Self::GpsDisabled => "Location services are disabled.",
            Self::NoSignal => "No location signal is available.",
            Self::Timeout => "Timed out waiting for a location fix.",
            Self::ViewNotReady => "The map view is not ready yet.",
            Self::Unknown => "An unexpected location error occurred.",
            Self::Busy => "Another location request is already in progress.",
        }
    }

    /// Canned suggestion for the user.
    pub fn suggested_action(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Please grant location permission to this app in your device settings"
            }
            Self::PermissionRestricted => {
                "Check device restrictions or management policies that limit location access"
            }
            Self::GpsDisabled => "Please enable location services in your device settings",
            Self::NoSignal => "Move to an area with a clear view of the sky and try again",
            Self::Timeout => "Try again, moving outdoors may speed up the fix",
            Self::ViewNotReady => "Wait for the map to finish loading and try again",
            Self::Unknown => "Try again, restart location tracking if the problem persists",
            Self::Busy => "Wait for the current request to finish and try again",
        }
    }

    /// Whether a retry can reasonably succeed.
    ///
    /// Every kind is retryable by default; stop failures override this.
    pub fn default_can_retry(&self) -> bool {
        true
    }

    /// Kinds that mean tracking cannot continue without user action.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied | Self::PermissionRestricted | Self::GpsDisabled
        )
    }

    /// Kinds caused by missing location permission.
    pub fn is_permission(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::PermissionRestricted)
    }

    /// Stable snake_case identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::PermissionRestricted => "permission_restricted",
            Self::GpsDisabled => "gps_disabled",
            Self::NoSignal => "no_signal",
            Self::Timeout => "timeout",
            Self::ViewNotReady => "view_not_ready",
            Self::Unknown => "unknown",
            Self::Busy => "busy",
        }
    }
}

impl fmt::Display for LocationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw failure message.
///
/// Case-insensitive substring rules, first match wins:
///
/// | kind | evidence |
/// |---|---|
/// | `PermissionDenied` | "permission" and "denied" |
/// | `PermissionRestricted` | "permission" and "restricted" |
/// | `GpsDisabled` | "gps" or "location services" |
/// | `NoSignal` | "signal" or "no recent location" |
/// | `Timeout` | "timeout" |
/// | `ViewNotReady` | "view" |
/// | `Unknown` | anything else |
pub fn classify_message(message: &str) -> LocationErrorKind {
    let message = message.to_lowercase();
    let has = |needle: &str| message.contains(needle);

    if has("permission") && has("denied") {
        LocationErrorKind::PermissionDenied
    } else if has("permission") && has("restricted") {
        LocationErrorKind::PermissionRestricted
    } else if has("gps") || has("location services") {
        LocationErrorKind::GpsDisabled
    } else if has("signal") || has("no recent location") {
        LocationErrorKind::NoSignal
    } else if has("timeout") {
        LocationErrorKind::Timeout
    } else if has("view") {
        LocationErrorKind::ViewNotReady
    } else {
        LocationErrorKind::Unknown
    }
}

/// A classified location failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct LocationError {
    /// Taxonomy entry.
    pub kind: LocationErrorKind,
    /// User-facing message.
    pub message: String,
    /// Raw failure text from the collaborator.
    pub detail: String,
    /// Whether retrying can help.
    pub can_retry: bool,
    /// What the user should do about it.
    pub suggested_action: String,
}

impl LocationError {
    /// Build an error of a known kind with the canned message and action.
    pub fn new(kind: LocationErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            message: kind.user_message().to_string(),
            detail: detail.into(),
            can_retry: kind.default_can_retry(),
            suggested_action: kind.suggested_action().to_string(),
        }
    }

    /// Classify a collaborator failure.
    pub fn from_source(error: &SourceError) -> Self {
        Self::new(error.kind(), error.to_string())
    }

    /// Rejection for an operation attempted while another is in flight.
    pub fn busy() -> Self {
        Self::new(
            LocationErrorKind::Busy,
            "a location operation is already in flight",
        )
    }

    /// Override retryability.
    pub fn with_can_retry(mut self, can_retry: bool) -> Self {
        self.can_retry = can_retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_permission() {
        assert_eq!(
            classify_message("Location permission denied by user"),
            LocationErrorKind::PermissionDenied
        );
        assert_eq!(
            classify_message("PERMISSION RESTRICTED"),
            LocationErrorKind::PermissionRestricted
        );
        // "permission" alone is not enough
        assert_eq!(
            classify_message("permission pending"),
            LocationErrorKind::Unknown
        );
    }

    #[test]
    fn test_classify_gps() {
        assert_eq!(
            classify_message("GPS is turned off"),
            LocationErrorKind::GpsDisabled
        );
        assert_eq!(
            classify_message("Location Services are disabled"),
            LocationErrorKind::GpsDisabled
        );
    }

    #[test]
    fn test_classify_signal() {
        assert_eq!(
            classify_message("Weak signal"),
            LocationErrorKind::NoSignal
        );
        assert_eq!(
            classify_message("No recent location available"),
            LocationErrorKind::NoSignal
        );
    }

    #[test]
    fn test_classify_timeout_view_unknown() {
        assert_eq!(
            classify_message("Request Timeout"),
            LocationErrorKind::Timeout
        );
        assert_eq!(
            classify_message("Map view not mounted"),
            LocationErrorKind::ViewNotReady
        );
        assert_eq!(
            classify_message("something odd happened"),
            LocationErrorKind::Unknown
        );
        assert_eq!(classify_message(""), LocationErrorKind::Unknown);
    }

    #[test]
    fn test_classify_first_rule_wins() {
        // Mentions both a permission denial and GPS
        assert_eq!(
            classify_message("GPS permission denied"),
            LocationErrorKind::PermissionDenied
        );
        // Mentions both a timeout and the view
        assert_eq!(
            classify_message("timeout waiting for view"),
            LocationErrorKind::Timeout
        );
    }

    #[test]
    fn test_source_error_kind() {
        assert_eq!(
            SourceError::from("gps off").kind(),
            LocationErrorKind::GpsDisabled
        );

        // Structured errors bypass text matching
        let structured = SourceError::Classified {
            kind: LocationErrorKind::NoSignal,
            detail: "permission denied".to_string(),
        };
        assert_eq!(structured.kind(), LocationErrorKind::NoSignal);
    }

    #[test]
    fn test_location_error_from_source() {
        let error = LocationError::from_source(&SourceError::from("Location services off"));

        assert_eq!(error.kind, LocationErrorKind::GpsDisabled);
        assert_eq!(error.message, "Location services are disabled.");
        assert_eq!(
            error.suggested_action,
            "Please enable location services in your device settings"
        );
        assert_eq!(error.detail, "Location services off");
        assert!(error.can_retry);
    }

    #[test]
    fn test_with_can_retry() {
        let error = LocationError::new(LocationErrorKind::Unknown, "boom").with_can_retry(false);
        assert!(!error.can_retry);
    }

    #[test]
    fn test_unrecoverable_kinds() {
        assert!(LocationErrorKind::PermissionDenied.is_unrecoverable());
        assert!(LocationErrorKind::GpsDisabled.is_unrecoverable());
        assert!(!LocationErrorKind::Timeout.is_unrecoverable());
        assert!(!LocationErrorKind::Busy.is_unrecoverable());
    }

    #[test]
    fn test_permission_kinds() {
        assert!(LocationErrorKind::PermissionDenied.is_permission());
        assert!(LocationErrorKind::PermissionRestricted.is_permission());
        assert!(!LocationErrorKind::GpsDisabled.is_permission());
        assert!(!LocationErrorKind::Unknown.is_permission());
    }

    #[test]
    fn test_display() {
        let error = LocationError::new(LocationErrorKind::Timeout, "took too long");
        assert_eq!(
            error.to_string(),
            "timeout: Timed out waiting for a location fix."
        );
        assert_eq!(LocationErrorKind::ViewNotReady.to_string(), "view_not_ready");
    }
}
