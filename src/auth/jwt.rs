use crate::error::ApplicationError;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rsa::{pkcs1::DecodeRsaPrivateKey, pkcs8::DecodePrivateKey, traits::PublicKeyParts};
use serde::{Serialize, de::DeserializeOwned};

/// Failure configuring the signing key.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The PEM is neither a PKCS#1 nor a PKCS#8 RSA private key.
    #[error("invalid RSA private key: {0}")]
    InvalidPrivateKey(String),
    /// The signing algorithm is not RS256, RS384 or RS512.
    #[error("unsupported signing algorithm: {0:?}")]
    UnsupportedAlgorithm(Algorithm),
}

/// Signs and validates JWTs with a single RSA key pair.
///
/// Tokens are signed with RS512 unless another algorithm is picked with
/// [`JwtHelper::with_algorithm`]. Validation accepts any RSA algorithm.
///
/// ```rust
/// use lambda_commons::auth::jwt::JwtHelper;
/// use std::collections::HashMap;
///
/// # fn example(pem: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let helper = JwtHelper::new(pem)?;
/// let claims = HashMap::from([("sub", "123")]);
/// let token = helper.generate_token(&claims)?;
/// let decoded: HashMap<String, String> = helper.validate_token(&token)?;
/// assert_eq!(decoded["sub"], "123");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct JwtHelper {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtHelper")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl JwtHelper {
    /// Load a PKCS#1 or PKCS#8 PEM encoded RSA private key.
    pub fn new(private_key_pem: &str) -> Result<Self, KeyError> {
        let private_key = rsa::RsaPrivateKey::from_pkcs1_pem(private_key_pem)
            .or_else(|_| rsa::RsaPrivateKey::from_pkcs8_pem(private_key_pem))
            .map_err(|err| KeyError::InvalidPrivateKey(err.to_string()))?;
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|err| KeyError::InvalidPrivateKey(err.to_string()))?;
        let decoding_key = DecodingKey::from_rsa_raw_components(
            &private_key.n().to_bytes_be(),
            &private_key.e().to_bytes_be(),
        );
        Ok(Self {
            algorithm: Algorithm::RS512,
            encoding_key,
            decoding_key,
        })
    }

    /// Sign with `algorithm` instead of RS512.
    ///
    /// Only RS256, RS384 and RS512 are accepted.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Result<Self, KeyError> {
        if !matches!(
            algorithm,
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512
        ) {
            return Err(KeyError::UnsupportedAlgorithm(algorithm));
        }
        self.algorithm = algorithm;
        Ok(self)
    }

    /// Sign `claims` into a compact JWT.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "lambda_commons.generate_token", skip_all, err)
    )]
    pub fn generate_token<C: Serialize>(
        &self,
        claims: &C,
    ) -> Result<String, ApplicationError> {
        jsonwebtoken::encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|_| ApplicationError::generic_internal_server_error())
    }

    /// Verify `token` and decode its claims.
    ///
    /// An `exp` claim is enforced when present. Every failure, including a
    /// non-RSA signing algorithm, is reported as a generic 401.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "lambda_commons.validate_token", skip_all, err)
    )]
    pub fn validate_token<C: DeserializeOwned>(&self, token: &str) -> Result<C, ApplicationError> {
        jsonwebtoken::decode::<C>(token, &self.decoding_key, &validation())
            .map(|data| data.claims)
            .map_err(|_| ApplicationError::generic_unauthorized())
    }
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::RS512);
    validation.algorithms = vec![Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];
    validation.required_spec_claims.clear();
    validation.validate_aud = false;
    validation
}
