//! Authentication service: login, token rotation and user accounts

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared::{permitted_sections, resolve_role, Role, RoleSource, Section};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub username: String,
    /// Role resolved at login time
    pub role: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    /// Username or email
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 3, max = 150))]
    pub username: String,
    #[validate(email)]
    pub email: Option<String>,
    pub password: String,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate]
    #[serde(flatten)]
    pub account: RegisterInput,
    pub role: Role,
}

/// User account as listed to administrators
#[derive(Debug, Serialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub role: Option<Role>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Current session as seen by the frontend
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub user_id: Uuid,
    pub username: String,
    pub role: Option<Role>,
    pub sections: Vec<Section>,
    pub read_only_sections: Vec<Section>,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: Option<String>,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    is_superuser: bool,
    is_active: bool,
    profile_role: Option<String>,
    groups: Vec<String>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn role(&self) -> Option<Role> {
        resolve_role(&RoleSource {
            is_superuser: self.is_superuser,
            profile_role: self.profile_role.as_deref(),
            groups: &self.groups,
        })
    }
}

const USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.email, u.password_hash, u.first_name, u.last_name,
           u.is_superuser, u.is_active, r.name AS profile_role,
           COALESCE(
               ARRAY(SELECT g.group_name FROM user_groups g
                     WHERE g.user_id = u.id ORDER BY g.position, g.group_name),
               '{}'
           ) AS groups,
           u.last_login_at, u.created_at
    FROM users u
    LEFT JOIN roles r ON r.id = u.role_id
"#;

/// Decodes and validates an access token
pub fn decode_access_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

impl AuthService {
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Authenticate by username or email
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthTokens> {
        let identifier = input.username.trim();
        let user = sqlx::query_as::<_, UserRow>(&format!(
            "{} WHERE u.username = $1 OR LOWER(u.email) = LOWER($1)",
            USER_SELECT
        ))
        .bind(identifier)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::Unauthorized {
                message: "Account is disabled".to_string(),
                message_es: "La cuenta está desactivada".to_string(),
            });
        }

        let valid = verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            tracing::info!(username = %identifier, "Rejected login");
            return Err(AppError::InvalidCredentials);
        }

        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&self.db)
            .await?;

        let tokens = self.generate_tokens(&user)?;
        self.store_refresh_token(user.id, &tokens.refresh_token).await?;

        tracing::info!(user_id = %user.id, role = ?tokens.role, "User logged in");
        Ok(tokens)
    }

    /// Exchanges a refresh token for a new token pair; the old one is revoked
    pub async fn refresh_token(&self, input: RefreshInput) -> AppResult<AuthTokens> {
        let token_hash = hash_token(&input.refresh_token);

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT rt.user_id
            FROM refresh_tokens rt
            JOIN users u ON u.id = rt.user_id
            WHERE rt.token_hash = $1
              AND rt.expires_at > NOW()
              AND rt.revoked_at IS NULL
              AND u.is_active = true
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized {
            message: "Invalid or expired refresh token".to_string(),
            message_es: "Token de renovación inválido o expirado".to_string(),
        })?;

        sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE token_hash = $1")
            .bind(&token_hash)
            .execute(&self.db)
            .await?;

        let user = self.fetch_user(user_id).await?;
        let tokens = self.generate_tokens(&user)?;
        self.store_refresh_token(user_id, &tokens.refresh_token).await?;

        Ok(tokens)
    }

    /// Self registration; the account starts without a role
    pub async fn register(&self, input: RegisterInput) -> AppResult<UserAccount> {
        self.insert_user(&input, None).await
    }

    /// Administrator account creation with an explicit role
    pub async fn create_user(&self, input: CreateUserInput) -> AppResult<UserAccount> {
        input.validate()?;
        self.insert_user(&input.account, Some(input.role)).await
    }

    pub async fn list_users(&self) -> AppResult<Vec<UserAccount>> {
        let users = sqlx::query_as::<_, UserRow>(&format!("{} ORDER BY u.username", USER_SELECT))
            .fetch_all(&self.db)
            .await?;

        Ok(users.into_iter().map(UserAccount::from).collect())
    }

    pub fn session(user: &AuthUser) -> SessionInfo {
        SessionInfo {
            user_id: user.user_id,
            username: user.username.clone(),
            role: user.role,
            sections: permitted_sections(user.role),
            read_only_sections: user
                .role
                .map(|r| r.read_only_sections().to_vec())
                .unwrap_or_default(),
        }
    }

    async fn insert_user(&self, input: &RegisterInput, role: Option<Role>) -> AppResult<UserAccount> {
        input.validate()?;
        shared::validate_password(&input.password)?;

        let email = input
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty());

        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE username = $1 OR ($2::TEXT IS NOT NULL AND LOWER(email) = LOWER($2))
            )
            "#,
        )
        .bind(input.username.trim())
        .bind(email)
        .fetch_one(&self.db)
        .await?;

        if taken {
            return Err(AppError::Conflict {
                resource: "user".to_string(),
                message: "Username or email already registered".to_string(),
                message_es: "El usuario o correo ya está registrado".to_string(),
            });
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name, role_id)
            VALUES ($1, $2, $3, $4, $5, (SELECT id FROM roles WHERE name = $6))
            RETURNING id
            "#,
        )
        .bind(input.username.trim())
        .bind(email)
        .bind(&password_hash)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(role.map(|r| r.as_str()))
        .fetch_one(&self.db)
        .await?;

        tracing::info!(%user_id, username = %input.username, role = ?role, "User created");

        self.fetch_user(user_id).await.map(UserAccount::from)
    }

    async fn fetch_user(&self, user_id: Uuid) -> AppResult<UserRow> {
        sqlx::query_as::<_, UserRow>(&format!("{} WHERE u.id = $1", USER_SELECT))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    fn generate_tokens(&self, user: &UserRow) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let role = user.role();

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: role.map(|r| r.as_str().to_string()),
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AuthTokens {
            access_token,
            refresh_token: Uuid::new_v4().to_string(),
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            role,
        })
    }

    async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<()> {
        let expires_at = Utc::now() + Duration::seconds(self.refresh_token_expiry);

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(hash_token(token))
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        let role = row.role();
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            is_active: row.is_active,
            role,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
        }
    }
}

/// Hex SHA-256 of a refresh token; only the digest is stored
fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_for(claims: &Claims, secret: &str) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn claims(exp_offset: i64) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: Uuid::new_v4().to_string(),
            username: "caja1".to_string(),
            role: Some("Vendedor".to_string()),
            exp: now + exp_offset,
            iat: now,
        }
    }

    #[test]
    fn test_token_hash_is_stable_hex() {
        let digest = hash_token("abc");
        assert_eq!(digest.len(), 64);
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(hash_token("abd"), digest);
    }

    #[test]
    fn test_decode_round_trips_claims() {
        let original = claims(3600);
        let token = token_for(&original, "secret");
        let decoded = decode_access_token(&token, "secret").unwrap();
        assert_eq!(decoded.sub, original.sub);
        assert_eq!(decoded.role.as_deref(), Some("Vendedor"));
    }

    #[test]
    fn test_decode_rejects_wrong_secret_and_expired() {
        let token = token_for(&claims(3600), "secret");
        assert!(decode_access_token(&token, "other").is_err());

        let expired = token_for(&claims(-3600), "secret");
        assert!(decode_access_token(&expired, "secret").is_err());
    }

    #[test]
    fn test_session_lists_read_only_sections() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            username: "contador".to_string(),
            role: Some(Role::Contador),
        };
        let session = AuthService::session(&user);
        assert!(session.sections.contains(&Section::Inventario));
        assert_eq!(session.read_only_sections, vec![Section::Inventario]);
    }

    #[test]
    fn test_session_without_role_is_empty() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            username: "nuevo".to_string(),
            role: None,
        };
        assert!(AuthService::session(&user).sections.is_empty());
    }
}
