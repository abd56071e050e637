//! Whitelist-gated access to the expense spreadsheet link.

use serde::Serialize;
use std::collections::HashSet;

/// Message returned when the request carries no email.
pub const EMAIL_REQUIRED: &str = "Email parameter required";

/// Message returned when the email is not whitelisted.
pub const ACCESS_DENIED: &str = "Access denied.";

/// Lowercased set of emails allowed to open the expense sheet.
///
/// Built once at process start and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    emails: HashSet<String>,
}

impl AllowList {
    /// Build from individual addresses; each is trimmed and lowercased and
    /// blanks are dropped.
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emails = emails
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { emails }
    }

    /// Build from a comma-separated configuration string such as
    /// `"owner@example.com, contractor@example.com"`.
    pub fn from_csv(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    /// Exact membership test. Callers lowercase before asking.
    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(email)
    }

    /// Number of distinct whitelisted emails.
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    /// Whether nobody is whitelisted.
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

/// Reason an [`AuthDecision`] was negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No email was supplied.
    MissingEmail,
    /// The email is not on the allow-list.
    NotWhitelisted,
}

/// Result of an access check, serialized as `{authorized, url?, message?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthDecision {
    /// Whether the caller may see the resource.
    pub authorized: bool,
    /// The resource link; present iff `authorized`.
    #[serde(rename = "url", skip_serializing_if = "Option::is_none")]
    pub resource_url: Option<String>,
    /// Human readable reason for a denial.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Machine readable reason for a denial.
    #[serde(skip)]
    pub denial: Option<Denial>,
}

impl AuthDecision {
    /// A positive decision carrying the resource link.
    pub fn granted(resource_url: impl Into<String>) -> Self {
        Self {
            authorized: true,
            resource_url: Some(resource_url.into()),
            message: None,
            denial: None,
        }
    }

    /// A negative decision.
    pub fn denied(denial: Denial) -> Self {
        let message = match denial {
            Denial::MissingEmail => EMAIL_REQUIRED,
            Denial::NotWhitelisted => ACCESS_DENIED,
        };
        Self {
            authorized: false,
            resource_url: None,
            message: Some(message.to_string()),
            denial: Some(denial),
        }
    }

    /// Whether the request itself was malformed rather than refused.
    pub fn is_missing_email(&self) -> bool {
        self.denial == Some(Denial::MissingEmail)
    }
}

/// Decide whether `email` may open `resource_url`.
///
/// The email is lowercased but not trimmed before the lookup.
pub fn authorize(email: Option<&str>, allow_list: &AllowList, resource_url: &str) -> AuthDecision {
    let email = match email {
        Some(e) if !e.is_empty() => e,
        _ => return AuthDecision::denied(Denial::MissingEmail),
    };

    if allow_list.contains(&email.to_lowercase()) {
        AuthDecision::granted(resource_url)
    } else {
        AuthDecision::denied(Denial::NotWhitelisted)
    }
}

/// An allow-list bound to the link it guards.
#[derive(Debug, Clone)]
pub struct Authorizer {
    allow_list: AllowList,
    resource_url: String,
}

impl Authorizer {
    /// Guard `resource_url` with `allow_list`.
    pub fn new(allow_list: AllowList, resource_url: impl Into<String>) -> Self {
        Self {
            allow_list,
            resource_url: resource_url.into(),
        }
    }

    /// See [`authorize`].
    pub fn authorize(&self, email: Option<&str>) -> AuthDecision {
        authorize(email, &self.allow_list, &self.resource_url)
    }

    /// The configured allow-list.
    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://docs.google.com/spreadsheets/d/test/edit";

    fn list() -> AllowList {
        AllowList::from_csv("user@x.com")
    }

    #[test]
    fn test_missing_email_is_rejected() {
        let decision = authorize(None, &list(), URL);
        assert!(!decision.authorized);
        assert_eq!(decision.message.as_deref(), Some(EMAIL_REQUIRED));
        assert!(decision.is_missing_email());

        let decision = authorize(Some(""), &list(), URL);
        assert!(decision.is_missing_email());
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let decision = authorize(Some("USER@X.com"), &list(), URL);
        assert!(decision.authorized);
        assert_eq!(decision.resource_url.as_deref(), Some(URL));
        assert!(decision.message.is_none());
    }

    #[test]
    fn test_unknown_email_is_denied() {
        let decision = authorize(Some("nobody@x.com"), &list(), URL);
        assert!(!decision.authorized);
        assert!(decision.resource_url.is_none());
        assert_eq!(decision.message.as_deref(), Some(ACCESS_DENIED));
        assert!(!decision.is_missing_email());
    }

    #[test]
    fn test_surrounding_whitespace_is_not_trimmed() {
        let decision = authorize(Some(" user@x.com"), &list(), URL);
        assert!(!decision.authorized);
    }

    #[test]
    fn test_from_csv_normalizes_entries() {
        let list = AllowList::from_csv(" A@x.com, ,b@Y.com ,,");
        assert_eq!(list.len(), 2);
        assert!(list.contains("a@x.com"));
        assert!(list.contains("b@y.com"));
        assert!(AllowList::from_csv("").is_empty());
    }

    #[test]
    fn test_large_allow_list() {
        let list = AllowList::new((0..100_000).map(|i| format!("user{}@example.com", i)));
        assert_eq!(list.len(), 100_000);
        assert!(authorize(Some("USER99999@example.com"), &list, URL).authorized);
        assert!(!authorize(Some("user100000@example.com"), &list, URL).authorized);
    }

    #[test]
    fn test_wire_shape() {
        let granted = serde_json::to_value(AuthDecision::granted(URL)).unwrap();
        assert_eq!(granted, json!({ "authorized": true, "url": URL }));

        let denied = serde_json::to_value(AuthDecision::denied(Denial::NotWhitelisted)).unwrap();
        assert_eq!(denied, json!({ "authorized": false, "message": "Access denied." }));
    }

    #[test]
    fn test_authorizer_binds_url() {
        let auth = Authorizer::new(list(), URL);
        assert_eq!(auth.allow_list().len(), 1);
        assert_eq!(auth.authorize(Some("user@x.com")), AuthDecision::granted(URL));
    }
}
