//! Structural validation of inbound requests
//!
//! Grant requests and agent enrollments are checked here before any state is
//! touched. Everything except the enrollment exclusivity check is pure.

use crate::effects::{AgentDirectoryEffects, SignatureEffects};
use crate::errors::{KeystoneError, Result};
use crate::types::{AgentEnrollment, GrantRequest, GrantRequestInput, GrantType};

/// Enrollment fields after structural validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEnrollment {
    /// Requested id, if any
    pub id: Option<String>,
    /// Optional email
    pub email: Option<String>,
    /// Display name
    pub name: String,
    /// Public key including its key-type marker
    pub public_key: String,
    /// Owner, if supplied
    pub owner: Option<String>,
    /// Approver, if supplied
    pub approver: Option<String>,
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate a raw grant request.
///
/// Requires requester, target and grant type; the grant type must be one of
/// the fixed set; a positive duration must be present exactly when the type
/// is `timed`.
pub fn validate_grant_request(input: &GrantRequestInput) -> Result<GrantRequest> {
    let (Some(requester), Some(target), Some(raw_type)) = (
        present(&input.requester),
        present(&input.target),
        present(&input.grant_type),
    ) else {
        return Err(KeystoneError::invalid_request(
            "Missing required fields: requester, target, grant_type",
        ));
    };

    let grant_type: GrantType = raw_type.parse().map_err(|_| {
        let allowed: Vec<&str> = GrantType::ALL.iter().map(GrantType::as_str).collect();
        KeystoneError::invalid_request(format!(
            "Invalid grant_type. Must be one of: {}",
            allowed.join(", ")
        ))
    })?;

    let duration = input.duration.filter(|d| *d > 0);
    match (grant_type, duration) {
        (GrantType::Timed, None) => Err(KeystoneError::invalid_request(
            "Duration is required for timed grants",
        )),
        (GrantType::Once | GrantType::Always, Some(_)) => Err(KeystoneError::invalid_request(
            format!("Duration is only allowed for timed grants, not {grant_type}"),
        )),
        _ => Ok(GrantRequest {
            requester,
            target,
            grant_type,
            duration,
        }),
    }
}

/// Reject an agent id that cannot serve as a single storage key segment.
///
/// Ids are also embedded in `agent:<id>` identity strings, so separators,
/// path components and whitespace are refused.
pub fn validate_agent_id(id: &str) -> Result<()> {
    if id == "."
        || id == ".."
        || id.chars().any(|c| matches!(c, ':' | '/' | '\\') || c.is_whitespace() || c.is_control())
    {
        return Err(KeystoneError::invalid_request(
            "Agent id may not be `.` or `..` or contain `:`, `/`, `\\` or whitespace",
        ));
    }
    Ok(())
}

/// Validate the shape of an enrollment request
pub fn validate_enrollment(
    input: &AgentEnrollment,
    public_key_prefix: &str,
) -> Result<ValidatedEnrollment> {
    let (Some(name), Some(public_key)) = (present(&input.name), present(&input.public_key)) else {
        return Err(KeystoneError::invalid_request(
            "Missing required fields: name, public_key",
        ));
    };

    if !public_key.starts_with(public_key_prefix) {
        return Err(KeystoneError::invalid_request(format!(
            "Public key must be in {} format",
            public_key_prefix.trim()
        )));
    }

    let id = present(&input.id);
    if let Some(id) = &id {
        validate_agent_id(id)?;
    }

    Ok(ValidatedEnrollment {
        id,
        email: present(&input.email),
        name,
        public_key,
        owner: present(&input.owner),
        approver: present(&input.approver),
    })
}

/// Reject an enrollment whose email, public key or id is already registered.
///
/// Keys are compared in canonical form, so the same key material with a
/// different comment conflicts. `enrollment.public_key` is expected to be
/// canonical already.
pub async fn check_enrollment_exclusive(
    directory: &dyn AgentDirectoryEffects,
    signatures: &dyn SignatureEffects,
    enrollment: &ValidatedEnrollment,
) -> Result<()> {
    if let Some(email) = &enrollment.email {
        if directory.find_by_email(email).await?.is_some() {
            return Err(KeystoneError::conflict(
                "An agent with this email already exists",
            ));
        }
    }

    let existing = directory.list_all().await?;
    let same_key = |stored: &str| {
        stored == enrollment.public_key
            || signatures
                .canonical_public_key(stored)
                .is_ok_and(|canonical| canonical == enrollment.public_key)
    };
    if existing.iter().any(|a| same_key(&a.public_key)) {
        return Err(KeystoneError::conflict(
            "An agent with this public key already exists",
        ));
    }

    if let Some(id) = &enrollment.id {
        if existing.iter().any(|a| &a.id == id) {
            return Err(KeystoneError::conflict("An agent with this id already exists"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn input(grant_type: &str, duration: Option<u64>) -> GrantRequestInput {
        GrantRequestInput {
            requester: Some("agent:a1".to_string()),
            target: Some("bob@x".to_string()),
            grant_type: Some(grant_type.to_string()),
            duration,
        }
    }

    #[test]
    fn accepts_each_grant_type() {
        assert_eq!(
            validate_grant_request(&input("once", None)).unwrap().grant_type,
            GrantType::Once
        );
        assert_eq!(
            validate_grant_request(&input("always", None)).unwrap().grant_type,
            GrantType::Always
        );
        let timed = validate_grant_request(&input("timed", Some(60))).unwrap();
        assert_eq!(timed.duration, Some(60));
    }

    #[test]
    fn missing_fields_are_rejected() {
        for missing in 0..3 {
            let mut req = input("once", None);
            match missing {
                0 => req.requester = None,
                1 => req.target = Some("  ".to_string()),
                _ => req.grant_type = None,
            }
            assert_matches!(
                validate_grant_request(&req),
                Err(KeystoneError::InvalidRequest { .. })
            );
        }
    }

    #[test]
    fn unknown_grant_type_lists_allowed_values() {
        let err = validate_grant_request(&input("forever", None)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid request: Invalid grant_type. Must be one of: once, timed, always"
        );
    }

    #[test]
    fn duration_present_iff_timed() {
        assert_matches!(
            validate_grant_request(&input("timed", None)),
            Err(KeystoneError::InvalidRequest { .. })
        );
        assert_matches!(
            validate_grant_request(&input("timed", Some(0))),
            Err(KeystoneError::InvalidRequest { .. })
        );
        assert_matches!(
            validate_grant_request(&input("once", Some(30))),
            Err(KeystoneError::InvalidRequest { .. })
        );
    }

    #[test]
    fn enrollment_requires_key_marker() {
        let mut enrollment = AgentEnrollment {
            name: Some("builder".to_string()),
            public_key: Some("ssh-rsa AAAA".to_string()),
            ..AgentEnrollment::default()
        };
        assert_matches!(
            validate_enrollment(&enrollment, "ssh-ed25519 "),
            Err(KeystoneError::InvalidRequest { .. })
        );

        enrollment.public_key = Some("ssh-ed25519 AAAAC3Nz".to_string());
        let valid = validate_enrollment(&enrollment, "ssh-ed25519 ").unwrap();
        assert_eq!(valid.name, "builder");
        assert_eq!(valid.owner, None);

        enrollment.name = None;
        assert_matches!(
            validate_enrollment(&enrollment, "ssh-ed25519 "),
            Err(KeystoneError::InvalidRequest { .. })
        );
    }

    #[test]
    fn enrollment_rejects_unaddressable_ids() {
        let mut enrollment = AgentEnrollment {
            name: Some("builder".to_string()),
            public_key: Some("ssh-ed25519 AAAAC3Nz".to_string()),
            id: Some("bot.v1".to_string()),
            ..AgentEnrollment::default()
        };
        let valid = validate_enrollment(&enrollment, "ssh-ed25519 ").unwrap();
        assert_eq!(valid.id.as_deref(), Some("bot.v1"));

        for bad in ["..", ".", "a:b", "a/b", "a\\b", "bot v1"] {
            enrollment.id = Some(bad.to_string());
            assert_matches!(
                validate_enrollment(&enrollment, "ssh-ed25519 "),
                Err(KeystoneError::InvalidRequest { .. }),
                "{bad:?} should be rejected"
            );
        }
    }
}
