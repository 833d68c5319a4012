//! HS256 bearer tokens.
//!
//! Tokens are `header.payload.signature` where header and payload are JSON
//! encoded as URL-safe base64 segments and the signature is HMAC-SHA256 over
//! `header.payload`. Payload claims use the registered JWT names:
//! `sub` (user id as a string), `email`, `roles`, `iat`, `exp` (Unix seconds).

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

use sushi_delivery_core::{Email, RoleCode, UserId};

use super::codec::{decode_segment, encode_segment, sign};
use crate::config::JwtConfig;

const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Reasons a token is rejected or cannot be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Not three `.`-separated parts.
    #[error("invalid token")]
    Malformed,

    /// Signature does not match header and payload.
    #[error("invalid token signature")]
    InvalidSignature,

    /// Payload is not JSON or is missing or has invalid required claims.
    #[error("invalid token payload")]
    InvalidPayload,

    /// `exp` is at or before the current time.
    #[error("token expired")]
    Expired,

    /// The token could not be signed or its expiry does not fit.
    #[error("token signing failed")]
    Signing,
}

/// Error parsing a token lifetime such as `15m` or `7d`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("expected digits with optional s/m/h/d unit, got {0:?}")]
    Format(String),
    #[error("duration must be greater than zero")]
    Zero,
    #[error("duration is too large")]
    Overflow,
}

/// Parse a lifetime: digits with an optional unit `s`, `m`, `h` or `d`.
///
/// Surrounding whitespace is ignored and a bare number means seconds.
///
/// # Errors
///
/// Returns `DurationError` for anything outside that grammar, for zero, and
/// for values that overflow Unix-second arithmetic.
pub fn parse_duration(raw: &str) -> Result<Duration, DurationError> {
    const UNITS: [(char, u64); 4] = [('s', 1), ('m', 60), ('h', 3_600), ('d', 86_400)];

    let value = raw.trim();
    let (digits, multiplier) = UNITS
        .iter()
        .find_map(|(unit, mult)| value.strip_suffix(*unit).map(|d| (d, *mult)))
        .unwrap_or((value, 1));

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DurationError::Format(raw.to_owned()));
    }

    let amount: u64 = digits.parse().map_err(|_| DurationError::Overflow)?;
    let seconds = amount
        .checked_mul(multiplier)
        .filter(|s| i64::try_from(*s).is_ok())
        .ok_or(DurationError::Overflow)?;

    if seconds == 0 {
        return Err(DurationError::Zero);
    }

    Ok(Duration::from_secs(seconds))
}

/// Verified claims of an accepted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub user_id: UserId,
    pub email: Email,
    pub roles: Vec<RoleCode>,
    pub issued_at: Option<i64>,
    pub expires_at: i64,
}

#[derive(Serialize)]
struct OutgoingClaims<'a> {
    sub: String,
    email: &'a str,
    roles: &'a [RoleCode],
    iat: i64,
    exp: i64,
}

/// Payload as found on the wire, before validation.
#[derive(Deserialize)]
struct IncomingClaims {
    sub: Option<serde_json::Value>,
    email: Option<String>,
    roles: Option<Vec<String>>,
    iat: Option<i64>,
    exp: Option<i64>,
}

impl IncomingClaims {
    fn validate(self) -> Option<Claims> {
        let user_id = match self.sub? {
            serde_json::Value::String(s) => UserId::parse_positive(&s)?,
            serde_json::Value::Number(n) => {
                let id = UserId::new(i32::try_from(n.as_i64()?).ok()?);
                if !id.is_positive() {
                    return None;
                }
                id
            }
            _ => return None,
        };

        let email = Email::parse(&self.email?).ok()?;

        let roles = self
            .roles?
            .iter()
            .map(|code| code.parse::<RoleCode>().ok())
            .collect::<Option<Vec<_>>>()?;
        if roles.is_empty() {
            return None;
        }

        Some(Claims {
            user_id,
            email,
            roles,
            issued_at: self.iat,
            expires_at: self.exp?,
        })
    }
}

/// Issues and verifies bearer tokens under one secret.
///
/// Pure and cheap to clone; shared by all request tasks.
#[derive(Clone)]
pub struct TokenService {
    secret: SecretString,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenService {
    #[must_use]
    pub const fn new(secret: SecretString, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    #[must_use]
    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(config.secret.clone(), config.ttl)
    }

    /// Lifetime of issued tokens.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for an identity, valid from now for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if the token cannot be built.
    pub fn issue(
        &self,
        user_id: UserId,
        email: &Email,
        roles: &[RoleCode],
    ) -> Result<String, TokenError> {
        self.issue_at(user_id, email, roles, chrono::Utc::now().timestamp())
    }

    /// Issue a token as if the current Unix time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if the expiry overflows or signing fails.
    pub fn issue_at(
        &self,
        user_id: UserId,
        email: &Email,
        roles: &[RoleCode],
        now: i64,
    ) -> Result<String, TokenError> {
        let ttl = i64::try_from(self.ttl.as_secs()).map_err(|_| TokenError::Signing)?;
        let exp = now.checked_add(ttl).ok_or(TokenError::Signing)?;

        let claims = OutgoingClaims {
            sub: user_id.to_string(),
            email: email.as_str(),
            roles,
            iat: now,
            exp,
        };
        let payload = serde_json::to_vec(&claims).map_err(|_| TokenError::Signing)?;

        let signing_input = format!(
            "{}.{}",
            encode_segment(HEADER_JSON),
            encode_segment(payload)
        );
        let signature = self.signature(&signing_input)?;

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    ///
    /// See [`TokenService::verify_at`].
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify a token as if the current Unix time were `now`.
    ///
    /// Checks run in order: shape, signature, payload, expiry.
    ///
    /// # Errors
    ///
    /// Returns the `TokenError` for the first check that fails.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        if token.split('.').count() != 3 {
            return Err(TokenError::Malformed);
        }
        let (signing_input, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
        let (_, payload) = signing_input
            .split_once('.')
            .ok_or(TokenError::Malformed)?;

        let expected = self.signature(signing_input)?;
        if !bool::from(signature.as_bytes().ct_eq(expected.as_bytes())) {
            return Err(TokenError::InvalidSignature);
        }

        let claims = decode_segment(payload)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<IncomingClaims>(&bytes).ok())
            .and_then(IncomingClaims::validate)
            .ok_or(TokenError::InvalidPayload)?;

        if claims.expires_at <= now {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn signature(&self, signing_input: &str) -> Result<String, TokenError> {
        sign(signing_input, self.secret.expose_secret().as_bytes()).map_err(|_| TokenError::Signing)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000;

    fn service() -> TokenService {
        TokenService::new(
            SecretString::from("k3Y!x9#Lm2@qZ7$wR4%tB8^nC1&vD6*s"),
            Duration::from_secs(3_600),
        )
    }

    fn email() -> Email {
        Email::parse("client@sushi.test").unwrap()
    }

    fn forge(payload: &serde_json::Value, svc: &TokenService) -> String {
        let input = format!(
            "{}.{}",
            encode_segment(HEADER_JSON),
            encode_segment(payload.to_string())
        );
        let sig = svc.signature(&input).unwrap();
        format!("{input}.{sig}")
    }

    #[test]
    fn test_issue_then_verify() {
        let svc = service();
        let token = svc
            .issue_at(UserId::new(7), &email(), &[RoleCode::Client], NOW)
            .unwrap();

        let claims = svc.verify_at(&token, NOW + 10).unwrap();
        assert_eq!(claims.user_id, UserId::new(7));
        assert_eq!(claims.email, email());
        assert_eq!(claims.roles, vec![RoleCode::Client]);
        assert_eq!(claims.issued_at, Some(NOW));
        assert_eq!(claims.expires_at, NOW + 3_600);
    }

    #[test]
    fn test_wire_claim_names() {
        let svc = service();
        let token = svc
            .issue_at(UserId::new(7), &email(), &[RoleCode::Admin], NOW)
            .unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);

        let header: serde_json::Value =
            serde_json::from_slice(&decode_segment(parts[0]).unwrap()).unwrap();
        assert_eq!(header["alg"], "HS256");
        assert_eq!(header["typ"], "JWT");

        let payload: serde_json::Value =
            serde_json::from_slice(&decode_segment(parts[1]).unwrap()).unwrap();
        assert_eq!(payload["sub"], "7");
        assert_eq!(payload["email"], "client@sushi.test");
        assert_eq!(payload["roles"], serde_json::json!(["admin"]));
        assert_eq!(payload["iat"], NOW);
        assert_eq!(payload["exp"], NOW + 3_600);
        assert!(!token.contains('='));
    }

    #[test]
    fn test_expiry_boundary() {
        let svc = service();
        let token = svc
            .issue_at(UserId::new(1), &email(), &[RoleCode::Client], NOW)
            .unwrap();
        assert!(svc.verify_at(&token, NOW + 3_599).is_ok());
        assert_eq!(svc.verify_at(&token, NOW + 3_600), Err(TokenError::Expired));
        assert_eq!(svc.verify_at(&token, NOW + 7_200), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_part_count_is_malformed() {
        let svc = service();
        assert_eq!(svc.verify_at("", NOW), Err(TokenError::Malformed));
        assert_eq!(svc.verify_at("a.b", NOW), Err(TokenError::Malformed));
        assert_eq!(svc.verify_at("a.b.c.d", NOW), Err(TokenError::Malformed));
    }

    #[test]
    fn test_tampered_payload_fails_signature() {
        let svc = service();
        let token = svc
            .issue_at(UserId::new(1), &email(), &[RoleCode::Client], NOW)
            .unwrap();
        let (header, rest) = token.split_once('.').unwrap();
        let (payload, sig) = rest.split_once('.').unwrap();

        let mut chars: Vec<char> = payload.chars().collect();
        chars[3] = if chars[3] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();

        let forged = format!("{header}.{tampered}.{sig}");
        assert_eq!(svc.verify_at(&forged, NOW), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_other_secret_fails_signature() {
        let other = TokenService::new(
            SecretString::from("Zq8#Wm3!pL6@rT1$yN4%uB7^cX2&vK5*"),
            Duration::from_secs(3_600),
        );
        let token = other
            .issue_at(UserId::new(1), &email(), &[RoleCode::Client], NOW)
            .unwrap();
        assert_eq!(
            service().verify_at(&token, NOW),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_truncated_signature_fails_signature() {
        let svc = service();
        let token = svc
            .issue_at(UserId::new(1), &email(), &[RoleCode::Client], NOW)
            .unwrap();
        let short = &token[..token.len() - 1];
        assert_eq!(svc.verify_at(short, NOW), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_signed_but_invalid_payloads() {
        let svc = service();
        let exp = NOW + 60;
        let cases = [
            serde_json::json!({ "email": "a@b.c", "roles": ["client"], "exp": exp }),
            serde_json::json!({ "sub": "0", "email": "a@b.c", "roles": ["client"], "exp": exp }),
            serde_json::json!({ "sub": "abc", "email": "a@b.c", "roles": ["client"], "exp": exp }),
            serde_json::json!({ "sub": "1", "roles": ["client"], "exp": exp }),
            serde_json::json!({ "sub": "1", "email": "nope", "roles": ["client"], "exp": exp }),
            serde_json::json!({ "sub": "1", "email": "a@b.c", "roles": [], "exp": exp }),
            serde_json::json!({ "sub": "1", "email": "a@b.c", "roles": ["root"], "exp": exp }),
            serde_json::json!({ "sub": "1", "email": "a@b.c", "roles": ["client"] }),
        ];
        for payload in cases {
            assert_eq!(
                svc.verify_at(&forge(&payload, &svc), NOW),
                Err(TokenError::InvalidPayload),
                "payload {payload} should be rejected"
            );
        }
    }

    #[test]
    fn test_numeric_subject_accepted() {
        let svc = service();
        let payload =
            serde_json::json!({ "sub": 12, "email": "a@b.c", "roles": ["courier"], "exp": NOW + 60 });
        let claims = svc.verify_at(&forge(&payload, &svc), NOW).unwrap();
        assert_eq!(claims.user_id, UserId::new(12));
        assert_eq!(claims.issued_at, None);
    }

    #[test]
    fn test_non_json_payload_is_invalid_payload() {
        let svc = service();
        let input = format!("{}.{}", encode_segment(HEADER_JSON), encode_segment("not json"));
        let token = format!("{input}.{}", svc.signature(&input).unwrap());
        assert_eq!(svc.verify_at(&token, NOW), Err(TokenError::InvalidPayload));
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("45").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("12h").unwrap(), Duration::from_secs(43_200));
        assert_eq!(parse_duration(" 7d ").unwrap(), Duration::from_secs(604_800));
    }

    #[test]
    fn test_parse_duration_rejects() {
        for raw in ["", "d", "7w", "-5m", "1.5h", "5 m", "1h30m", "abc"] {
            assert!(
                matches!(parse_duration(raw), Err(DurationError::Format(_))),
                "{raw:?} should be a format error"
            );
        }
        assert_eq!(parse_duration("0d"), Err(DurationError::Zero));
        assert_eq!(
            parse_duration("99999999999999999999"),
            Err(DurationError::Overflow)
        );
        assert_eq!(
            parse_duration("999999999999999d"),
            Err(DurationError::Overflow)
        );
    }
}
