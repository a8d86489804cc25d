use crate::user::UserId;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use serde::Serialize;

/// Signs and checks the session tokens carried in the session cookie.
#[derive(Clone)]
pub struct JWTAuth {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    exp: usize,
    sub: UserId,
}

impl JWTAuth {
    const EXPIRE_TIME: i64 = 24 * 60 * 60;

    pub fn from_secret(secret: Vec<u8>) -> JWTAuth {
        JWTAuth {
            encoding_key: EncodingKey::from_secret(&secret),
            decoding_key: DecodingKey::from_secret(&secret),
        }
    }

    pub fn create_token(&self, user_id: UserId) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            exp: Self::generate_exp(),
            sub: user_id,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
    }

    pub fn validate_token(&self, token: &str) -> Result<UserId, jsonwebtoken::errors::Error> {
        let claim =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(claim.claims.sub)
    }

    fn generate_exp() -> usize {
        (Utc::now().timestamp() + Self::EXPIRE_TIME) as usize
    }
}
