//! Allowlist policy: sender validation per channel.
//!
//! An empty allow-list leaves a channel open to every sender. A sender whose
//! ID could not be extracted (an empty [`Identifier`]) is always refused.

use femtoclaw_config::ChannelConfig;
use femtoclaw_core::bounded::Identifier;

/// Why a sender was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    ChannelDisabled,
    /// The sender ID overflowed or was missing
    UnknownSender,
    NotListed,
}

/// Result of checking a sender against the allowlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderCheckResult {
    /// Sender is on the list
    Allowed,
    /// No list configured, everyone is accepted
    Unrestricted,
    Denied(DenyReason),
}

impl SenderCheckResult {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed | Self::Unrestricted)
    }
}

/// Unified allowlist policy enforcement.
pub struct AllowlistPolicy;

impl AllowlistPolicy {
    /// Check if a sender is allowed for a given channel configuration.
    ///
    /// Rules:
    /// - Disabled channel → deny
    /// - Empty sender ID → deny, even with an empty list
    /// - Empty `allow_from` → allow all
    /// - Otherwise, the sender must match an entry exactly
    pub fn check_sender(config: &ChannelConfig, sender: &Identifier) -> SenderCheckResult {
        if !config.enabled {
            return SenderCheckResult::Denied(DenyReason::ChannelDisabled);
        }
        if sender.is_empty() {
            return SenderCheckResult::Denied(DenyReason::UnknownSender);
        }
        if config.allow_from.is_empty() {
            return SenderCheckResult::Unrestricted;
        }
        if config.allow_from.contains(sender) {
            SenderCheckResult::Allowed
        } else {
            SenderCheckResult::Denied(DenyReason::NotListed)
        }
    }
}
