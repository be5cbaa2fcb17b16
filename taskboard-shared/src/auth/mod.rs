/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and the registration password rule
/// - [`jwt`]: HS256 session token issuance and validation
/// - [`session`]: session cookie formatting and token extraction
///
/// Authorization (who may touch which task) is not here; it lives next to
/// the task engine in [`crate::tasks::policy`].
///
/// # Example
///
/// ```no_run
/// use chrono::Duration;
/// use taskboard_shared::auth::jwt::{create_token, Claims};
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::session::session_cookie;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let token = create_token(&Claims::new(Uuid::new_v4(), Duration::days(7)), "secret")?;
/// let set_cookie = session_cookie(&token, 7 * 24 * 3600, true);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod password;
pub mod session;
