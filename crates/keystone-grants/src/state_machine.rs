//! Grant State Machine
//!
//! ```text
//! pending ──approve──▶ approved ──use (once)──▶ used
//!    │                    │
//!    └──deny──▶ denied    └──revoke──▶ revoked
//! ```
//!
//! Transitions are pure: `apply` inspects a grant and returns the status and
//! metadata to persist, or `Unchanged` when the transition succeeds without a
//! mutation (redeeming a timed or always grant, revoking twice).

use keystone_core::{Grant, GrantStatus, GrantType, GrantUpdate, KeystoneError, Result};

/// A requested lifecycle step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Approve a pending grant
    Approve {
        /// Deciding identity
        by: String,
    },
    /// Deny a pending grant
    Deny {
        /// Deciding identity
        by: String,
    },
    /// Withdraw an approved grant
    Revoke,
    /// Redeem an approved grant
    Use,
}

/// Result of a legal transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Persist the new status with its metadata
    Changed {
        /// Next status
        status: GrantStatus,
        /// Metadata recorded with the status
        update: GrantUpdate,
    },
    /// The transition succeeded and the grant stays as it is
    Unchanged,
}

/// Check `transition` against `grant` at `now_ms`
pub fn apply(grant: &Grant, transition: &Transition, now_ms: u64) -> Result<TransitionOutcome> {
    let status = grant.status;
    match transition {
        Transition::Approve { by } | Transition::Deny { by } => {
            if status != GrantStatus::Pending {
                return Err(KeystoneError::invalid_state(status, "Grant is not pending"));
            }
            let next = if matches!(transition, Transition::Approve { .. }) {
                GrantStatus::Approved
            } else {
                GrantStatus::Denied
            };
            Ok(TransitionOutcome::Changed {
                status: next,
                update: GrantUpdate::decision(by.clone(), now_ms),
            })
        }
        Transition::Revoke => match status {
            GrantStatus::Approved => Ok(TransitionOutcome::Changed {
                status: GrantStatus::Revoked,
                update: GrantUpdate::default(),
            }),
            GrantStatus::Revoked | GrantStatus::Denied => Ok(TransitionOutcome::Unchanged),
            GrantStatus::Pending | GrantStatus::Used => Err(KeystoneError::invalid_state(
                status,
                "Only approved grants can be revoked",
            )),
        },
        Transition::Use => {
            ensure_redeemable(grant, now_ms)?;
            if grant.grant_type() == GrantType::Once {
                Ok(TransitionOutcome::Changed {
                    status: GrantStatus::Used,
                    update: GrantUpdate::used(now_ms),
                })
            } else {
                Ok(TransitionOutcome::Unchanged)
            }
        }
    }
}

/// Fail unless `grant` is approved and, for timed grants, inside its window
pub fn ensure_redeemable(grant: &Grant, now_ms: u64) -> Result<()> {
    if grant.status != GrantStatus::Approved {
        return Err(KeystoneError::invalid_state(
            grant.status,
            "Grant is not approved",
        ));
    }
    if grant.grant_type() == GrantType::Timed {
        match grant.window_end_ms() {
            Some(end) if now_ms <= end => {}
            _ => return Err(KeystoneError::expired("Grant window has elapsed")),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use keystone_core::GrantRequest;

    fn grant(grant_type: GrantType) -> Grant {
        Grant::pending(
            "g1",
            GrantRequest {
                requester: "agent:a1".to_string(),
                target: "bob@x".to_string(),
                grant_type,
                duration: (grant_type == GrantType::Timed).then_some(60),
            },
            0,
        )
    }

    fn step(grant: &mut Grant, transition: Transition, now_ms: u64) -> Result<()> {
        if let TransitionOutcome::Changed { status, update } = apply(grant, &transition, now_ms)? {
            grant.apply_update(status, &update);
        }
        Ok(())
    }

    fn approve() -> Transition {
        Transition::Approve {
            by: "carol@x".to_string(),
        }
    }

    #[test]
    fn once_grant_is_used_exactly_once() {
        let mut g = grant(GrantType::Once);
        step(&mut g, approve(), 10).unwrap();
        assert_eq!(g.decided_by.as_deref(), Some("carol@x"));

        step(&mut g, Transition::Use, 20).unwrap();
        assert_eq!(g.status, GrantStatus::Used);
        assert_eq!(g.used_at, Some(20));

        assert_matches!(
            step(&mut g, Transition::Use, 30),
            Err(KeystoneError::InvalidState { status: GrantStatus::Used, .. })
        );
    }

    #[test]
    fn approve_names_the_current_status() {
        for blocked in [GrantStatus::Approved, GrantStatus::Denied, GrantStatus::Used, GrantStatus::Revoked] {
            let mut g = grant(GrantType::Always);
            g.status = blocked;
            let err = apply(&g, &approve(), 0).unwrap_err();
            assert!(err.to_string().contains(blocked.as_str()), "{err}");
        }
    }

    #[test]
    fn timed_window_is_checked_at_redemption() {
        let mut g = grant(GrantType::Timed);
        step(&mut g, approve(), 1_000).unwrap();

        assert_eq!(apply(&g, &Transition::Use, 61_000).unwrap(), TransitionOutcome::Unchanged);
        assert_matches!(
            apply(&g, &Transition::Use, 61_001),
            Err(KeystoneError::Expired { .. })
        );
    }

    #[test]
    fn always_grant_redeems_without_mutation() {
        let mut g = grant(GrantType::Always);
        step(&mut g, approve(), 0).unwrap();
        assert_eq!(apply(&g, &Transition::Use, u64::MAX).unwrap(), TransitionOutcome::Unchanged);
    }

    #[test]
    fn revoke_is_idempotent_for_closed_grants() {
        let mut g = grant(GrantType::Always);
        assert_matches!(
            apply(&g, &Transition::Revoke, 0),
            Err(KeystoneError::InvalidState { status: GrantStatus::Pending, .. })
        );

        step(&mut g, approve(), 0).unwrap();
        step(&mut g, Transition::Revoke, 1).unwrap();
        assert_eq!(g.status, GrantStatus::Revoked);
        assert_eq!(apply(&g, &Transition::Revoke, 2).unwrap(), TransitionOutcome::Unchanged);
        assert_matches!(
            apply(&g, &Transition::Use, 3),
            Err(KeystoneError::InvalidState { .. })
        );
    }

    mod proptest_lifecycle {
        use super::*;
        use proptest::prelude::*;

        fn arb_transition() -> impl Strategy<Value = Transition> {
            prop_oneof![
                Just(Transition::Approve { by: "carol@x".to_string() }),
                Just(Transition::Deny { by: "carol@x".to_string() }),
                Just(Transition::Revoke),
                Just(Transition::Use),
            ]
        }

        fn arb_grant_type() -> impl Strategy<Value = GrantType> {
            prop_oneof![
                Just(GrantType::Once),
                Just(GrantType::Timed),
                Just(GrantType::Always),
            ]
        }

        proptest! {
            /// Terminal statuses never change and pending is left at most once
            #[test]
            fn transitions_follow_lifecycle_edges(
                grant_type in arb_grant_type(),
                steps in prop::collection::vec((arb_transition(), 0u64..120_000), 0..16),
            ) {
                let mut g = grant(grant_type);
                let mut left_pending = 0;

                for (transition, now_ms) in steps {
                    let before = g.status;
                    let _ = step(&mut g, transition, now_ms);
                    let after = g.status;

                    if before.is_terminal() {
                        prop_assert_eq!(before, after);
                    }
                    if before == GrantStatus::Pending && after != GrantStatus::Pending {
                        left_pending += 1;
                    }
                    let legal = before == after
                        || matches!(
                            (before, after),
                            (GrantStatus::Pending, GrantStatus::Approved | GrantStatus::Denied)
                                | (GrantStatus::Approved, GrantStatus::Used | GrantStatus::Revoked)
                        );
                    prop_assert!(legal, "{before} -> {after}");
                    if after == GrantStatus::Used {
                        prop_assert_eq!(grant_type, GrantType::Once);
                    }
                }
                prop_assert!(left_pending <= 1);
            }
        }
    }
}
