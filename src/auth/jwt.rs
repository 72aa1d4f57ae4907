use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{
    auth::claims::Claims,
    config::JwtConfig,
    state::AppState,
    users::repo::User,
};

/// Signing material plus the token policy, derived once from config.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            ttl: Duration::minutes(ttl_minutes),
        }
    }
}

impl JwtKeys {
    /// Issue a signed assertion of the account's identity and role.
    pub fn issue(&self, user: &User) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user.user_id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.unix_timestamp() as usize,
            exp: (now + self.ttl).unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = user.user_id, "jwt signed");
        Ok(token)
    }

    /// Verify signature, issuer, audience and expiry; returns the claims.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Role;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_ref(&AppState::fake())
    }

    fn keys_with_ttl(minutes: i64) -> JwtKeys {
        let mut keys = make_keys();
        keys.ttl = Duration::minutes(minutes);
        keys
    }

    fn sample_user(user_id: i64, name: &str, email: &str, role: Role) -> User {
        User {
            user_id,
            name: name.into(),
            email: email.into(),
            password_hash: "hash".into(),
            department: "Eng".into(),
            tech_stack: vec![],
            role,
            reporting_manager_id: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn issue_then_verify_round_trips_identity() {
        let keys = make_keys();
        let user = sample_user(7, "Alice", "alice@x.com", Role::Admin);
        let token = keys.issue(&user).expect("issue");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.name, "Alice");
        assert_eq!(claims.email, "alice@x.com");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        // Negative TTL puts exp well past the default validation leeway.
        let keys = keys_with_ttl(-5);
        let user = sample_user(1, "Bob", "bob@x.com", Role::Employee);
        let token = keys.issue(&user).expect("issue");
        assert!(keys.verify(&token).is_err());
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let keys = make_keys();
        let user = sample_user(2, "Carol", "carol@x.com", Role::Employee);
        let mut token = keys.issue(&user).expect("issue");
        token.push('x');
        assert!(keys.verify(&token).is_err());
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let keys = make_keys();
        let other = JwtKeys {
            encoding: EncodingKey::from_secret(b"other-secret"),
            decoding: DecodingKey::from_secret(b"other-secret"),
            issuer: keys.issuer.clone(),
            audience: keys.audience.clone(),
            ttl: keys.ttl,
        };
        let user = sample_user(3, "Dave", "dave@x.com", Role::Employee);
        let token = other.issue(&user).expect("issue");
        assert!(keys.verify(&token).is_err());
    }
}
