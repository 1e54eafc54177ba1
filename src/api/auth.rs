//! How an API token is presented to the server.

use serde::{Deserialize, Serialize};

/// The scheme prefixed to the token in the `Authorization` header.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    #[default]
    Token,
    Bearer,
}

serde_plain::derive_display_from_serialize!(AuthScheme);
serde_plain::derive_fromstr_from_deserialize!(AuthScheme);

impl AuthScheme {
    fn prefix(self) -> &'static str {
        match self {
            AuthScheme::Token => "Token",
            AuthScheme::Bearer => "Bearer",
        }
    }
}

/// An API token and the scheme it should be sent with.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    scheme: AuthScheme,
}

impl Credential {
    pub fn new(token: impl Into<String>, scheme: AuthScheme) -> Self {
        Self {
            token: token.into(),
            scheme,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    /// The `Authorization` header value. The token is sanitized first. If it already carries a
    /// `Bearer` or `Token` scheme (in any case) it is sent as it is, otherwise the preferred scheme
    /// is prefixed.
    pub fn header_value(&self) -> String {
        let token = sanitize_token(&self.token);
        if has_scheme(token) {
            token.to_string()
        } else {
            format!("{} {token}", self.scheme.prefix())
        }
    }

    pub fn preview(&self) -> String {
        token_preview(&self.token)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &self.preview())
            .field("scheme", &self.scheme)
            .finish()
    }
}

/// Strips one pair of surrounding double quotes and trims whitespace.
pub fn sanitize_token(token: &str) -> &str {
    let trimmed = token.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim()
}

fn has_scheme(token: &str) -> bool {
    let Some((scheme, rest)) = token.split_once(char::is_whitespace) else {
        return false;
    };
    !rest.trim().is_empty()
        && (scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token"))
}

/// A shortened token that is safe to print: the first 12 and last 6 characters of a token longer
/// than 20 characters, or the whole token otherwise.
pub fn token_preview(token: &str) -> String {
    let token = sanitize_token(token);
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 20 {
        return token.to_string();
    }
    let head: String = chars[..12].iter().collect();
    let tail: String = chars[chars.len() - 6..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_value() {
        let c = Credential::new("abc123", AuthScheme::Token);
        assert_eq!(c.header_value(), "Token abc123");

        let c = Credential::new("  \"abc123\" ", AuthScheme::Bearer);
        assert_eq!(c.header_value(), "Bearer abc123");

        let c = Credential::new("bearer xyz", AuthScheme::Token);
        assert_eq!(c.header_value(), "bearer xyz");

        let c = Credential::new("\"Token xyz\"", AuthScheme::Bearer);
        assert_eq!(c.header_value(), "Token xyz");

        // a lone scheme word is a token, not a scheme
        let c = Credential::new("Bearer", AuthScheme::Token);
        assert_eq!(c.header_value(), "Token Bearer");
    }

    #[test]
    fn test_sanitize_token() {
        assert_eq!(sanitize_token("\"abc\""), "abc");
        assert_eq!(sanitize_token("\"abc"), "\"abc");
        assert_eq!(sanitize_token(" \" abc \" "), "abc");
    }

    #[test]
    fn test_token_preview() {
        assert_eq!(token_preview("short"), "short");
        assert_eq!(token_preview("12345678901234567890"), "12345678901234567890");
        assert_eq!(
            token_preview("abcdefghijklmnopqrstuvwxyz"),
            "abcdefghijkl...uvwxyz"
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let c = Credential::new("abcdefghijklmnopqrstuvwxyz", AuthScheme::Token);
        let debug = format!("{c:?}");
        assert!(!debug.contains("mnopqrst"));
    }

    #[test]
    fn test_scheme_parse() {
        assert_eq!("bearer".parse::<AuthScheme>().unwrap(), AuthScheme::Bearer);
        assert_eq!(AuthScheme::Token.to_string(), "token");
        assert!("basic".parse::<AuthScheme>().is_err());
    }
}
