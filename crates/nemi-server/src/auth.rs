//! HTTP Basic authentication against argon2 password hashes

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use nemi_core::{AuthenticatedUser, Error, Handler, Request, Response, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Resolves the actor behind a request.
#[async_trait]
pub trait AuthBackend: Send + Sync {
	/// `Ok(None)` when the request carries no valid credentials.
	async fn authenticate(&self, request: &Request) -> Result<Option<AuthenticatedUser>>;
}

/// Hash `password` into an argon2 PHC string suitable for `auth_users`.
pub fn hash_password(password: &str) -> Result<String> {
	let salt = SaltString::generate(&mut OsRng);
	Argon2::default()
		.hash_password(password.as_bytes(), &salt)
		.map(|hash| hash.to_string())
		.map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))
}

/// Whether `password` matches the PHC string `hash`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
	let parsed = PasswordHash::new(hash)
		.map_err(|e| Error::ImproperlyConfigured(format!("Invalid password hash: {}", e)))?;
	Ok(Argon2::default()
		.verify_password(password.as_bytes(), &parsed)
		.is_ok())
}

/// Splits an `Authorization: Basic ...` header into username and password.
fn basic_credentials(request: &Request) -> Option<(String, String)> {
	let header = request.headers.get(hyper::header::AUTHORIZATION)?.to_str().ok()?;
	let (scheme, encoded) = header.split_once(' ')?;
	if !scheme.eq_ignore_ascii_case("basic") {
		return None;
	}
	let decoded = STANDARD.decode(encoded.trim()).ok()?;
	let decoded = String::from_utf8(decoded).ok()?;
	let (username, password) = decoded.split_once(':')?;
	Some((username.to_string(), password.to_string()))
}

/// Checks Basic credentials against a username to hash map.
#[derive(Debug, Clone, Default)]
pub struct BasicAuthBackend {
	users: BTreeMap<String, String>,
}

impl BasicAuthBackend {
	pub fn new(users: BTreeMap<String, String>) -> Self {
		Self { users }
	}
}

#[async_trait]
impl AuthBackend for BasicAuthBackend {
	async fn authenticate(&self, request: &Request) -> Result<Option<AuthenticatedUser>> {
		let Some((username, password)) = basic_credentials(request) else {
			return Ok(None);
		};
		let Some(hash) = self.users.get(&username) else {
			tracing::debug!(username = %username, "unknown user");
			return Ok(None);
		};
		if verify_password(&password, hash)? {
			Ok(Some(AuthenticatedUser::new(username)))
		} else {
			tracing::debug!(username = %username, "password mismatch");
			Ok(None)
		}
	}
}

/// Guards `inner` behind an [`AuthBackend`].
///
/// Unauthenticated requests get 401 with a Basic challenge for `realm`;
/// authenticated ones reach `inner` with the user set on the request.
pub struct LoginRequired {
	inner: Arc<dyn Handler>,
	backend: Arc<dyn AuthBackend>,
	realm: String,
}

impl LoginRequired {
	pub fn new(inner: Arc<dyn Handler>, backend: Arc<dyn AuthBackend>) -> Self {
		Self {
			inner,
			backend,
			realm: "nemi".to_string(),
		}
	}

	pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
		self.realm = realm.into();
		self
	}

	fn challenge(&self) -> Response {
		Response::unauthorized()
			.with_header(
				"WWW-Authenticate",
				&format!("Basic realm=\"{}\"", self.realm),
			)
			.with_body("Authentication required")
	}
}

#[async_trait]
impl Handler for LoginRequired {
	async fn handle(&self, mut request: Request) -> Result<Response> {
		match self.backend.authenticate(&request).await? {
			Some(user) => {
				request.set_user(user);
				self.inner.handle(request).await
			}
			None => Ok(self.challenge()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};

	struct WhoAmI;

	#[async_trait]
	impl Handler for WhoAmI {
		async fn handle(&self, request: Request) -> Result<Response> {
			let name = request.user().map(|u| u.username.clone()).unwrap_or_default();
			Ok(Response::ok().with_body(name))
		}
	}

	#[fixture]
	fn guarded() -> LoginRequired {
		let hash = hash_password("s3cret").unwrap();
		let users = BTreeMap::from([("curator".to_string(), hash)]);
		LoginRequired::new(Arc::new(WhoAmI), Arc::new(BasicAuthBackend::new(users)))
			.with_realm("methods")
	}

	fn basic(credentials: &str) -> String {
		format!("Basic {}", STANDARD.encode(credentials))
	}

	#[rstest]
	fn test_hash_round_trip() {
		// Arrange
		let hash = hash_password("s3cret").unwrap();

		// Act / Assert
		assert!(hash.starts_with("$argon2"));
		assert!(verify_password("s3cret", &hash).unwrap());
		assert!(!verify_password("other", &hash).unwrap());
	}

	#[rstest]
	fn test_malformed_hash_is_configuration_error() {
		// Act
		let result = verify_password("s3cret", "plaintext");

		// Assert
		assert_eq!(result.unwrap_err().status_code(), 500);
	}

	#[rstest]
	#[tokio::test]
	async fn test_valid_credentials_set_user(guarded: LoginRequired) {
		// Arrange
		let request = Request::builder()
			.uri("/statistics/sources/add/")
			.header("Authorization", &basic("curator:s3cret"))
			.build()
			.unwrap();

		// Act
		let response = guarded.handle(request).await.unwrap();

		// Assert
		assert_eq!(response.status.as_u16(), 200);
		assert_eq!(response.text(), "curator");
	}

	#[rstest]
	#[case(None)]
	#[case(Some("curator:wrong"))]
	#[case(Some("nobody:s3cret"))]
	#[case(Some("no-colon"))]
	#[tokio::test]
	async fn test_missing_or_bad_credentials_are_challenged(
		guarded: LoginRequired,
		#[case] credentials: Option<&str>,
	) {
		// Arrange
		let mut builder = Request::builder().uri("/admin/newsfeed/newsitem/");
		if let Some(credentials) = credentials {
			builder = builder.header("Authorization", &basic(credentials));
		}
		let request = builder.build().unwrap();

		// Act
		let response = guarded.handle(request).await.unwrap();

		// Assert
		assert_eq!(response.status.as_u16(), 401);
		assert_eq!(
			response.headers.get("www-authenticate").unwrap(),
			"Basic realm=\"methods\""
		);
	}
}
