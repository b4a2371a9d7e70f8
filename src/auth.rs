use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rusqlite::Connection;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{self, users::User};

/// Matricules are role-prefixed: a 4-letter family code followed by digits.
pub const STUDENT_PREFIX: &str = "UNST";
pub const TEACHER_PREFIX: &str = "UNTE";

pub const LEVELS: &[&str] = &["L1", "L2", "L3", "M1", "M2"];

// Argon2id work factor. Changing these only affects newly stored hashes;
// verification reads the parameters embedded in each PHC string.
const ARGON2_MEMORY_KIB: u32 = 19 * 1024;
const ARGON2_TIME_COST: u32 = 2;
const ARGON2_PARALLELISM: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "teacher" => Some(Self::Teacher),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::Student => STUDENT_PREFIX,
            Self::Teacher => TEACHER_PREFIX,
        }
    }
}

#[derive(Debug)]
pub struct SignUpRequest {
    pub name: String,
    pub matricule: String,
    pub role: Role,
    pub level: Option<String>,
    pub password: String,
}

pub fn normalize_matricule(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Format rule checked before any database round trip: four ASCII letters,
/// then at least one digit, nothing else.
pub fn matricule_format_ok(matricule: &str) -> bool {
    let bytes = matricule.as_bytes();
    if bytes.len() < 5 {
        return false;
    }
    bytes[..4].iter().all(|b| b.is_ascii_uppercase())
        && bytes[4..].iter().all(|b| b.is_ascii_digit())
}

/// Role family implied by the matricule prefix, if it is a known one.
pub fn role_for_prefix(matricule: &str) -> Option<Role> {
    if matricule.starts_with(STUDENT_PREFIX) {
        Some(Role::Student)
    } else if matricule.starts_with(TEACHER_PREFIX) {
        Some(Role::Teacher)
    } else {
        None
    }
}

pub fn hash_password(plain: &str) -> Result<String, StoreError> {
    let params = Params::new(ARGON2_MEMORY_KIB, ARGON2_TIME_COST, ARGON2_PARALLELISM, None)
        .map_err(|e| StoreError::Hash(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| StoreError::Hash(e.to_string()))
}

/// A malformed stored hash (corrupted row, hand-edited database) is a
/// verification failure, never a panic or an error.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Registration gated by the pre-seeded matricule allowlist. Every gate is a
/// terminal failure; the insert itself is the only write.
pub fn sign_up(conn: &Connection, req: &SignUpRequest) -> Result<User, StoreError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(StoreError::invalid("name must not be empty"));
    }
    if req.password.is_empty() {
        return Err(StoreError::invalid("password must not be empty"));
    }

    let matricule = normalize_matricule(&req.matricule);
    if !matricule_format_ok(&matricule) {
        return Err(StoreError::invalid(
            "matricule must be a 4-letter prefix followed by digits",
        ));
    }
    if role_for_prefix(&matricule) != Some(req.role) {
        return Err(StoreError::invalid(
            "matricule prefix does not match the declared role",
        ));
    }

    let Some(allowed_role) = store::users::allowlist_role(conn, &matricule)? else {
        return Err(StoreError::invalid(
            "matricule is not eligible for registration",
        ));
    };
    if allowed_role != req.role.as_str() {
        return Err(StoreError::invalid(
            "matricule is not eligible for the declared role",
        ));
    }

    let level = match req.role {
        Role::Student => {
            let Some(level) = req.level.as_deref() else {
                return Err(StoreError::invalid("students must declare a level"));
            };
            if !LEVELS.contains(&level) {
                return Err(StoreError::invalid("level must be one of L1, L2, L3, M1, M2"));
            }
            Some(level.to_string())
        }
        Role::Teacher => {
            if req.level.is_some() {
                return Err(StoreError::invalid("teachers do not carry a level"));
            }
            None
        }
    };

    if store::users::find_by_matricule(conn, &matricule)?.is_some() {
        return Err(StoreError::conflict("matricule already used"));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        matricule,
        role: req.role.as_str().to_string(),
        level,
        created_at: store::now_rfc3339(),
        password_hash: hash_password(&req.password)?,
    };
    // The UNIQUE constraint closes the check-then-insert race; a violation
    // here surfaces as the same conflict as the pre-check above.
    store::users::insert(conn, &user)?;
    Ok(user)
}

/// Unknown matricule and wrong password are indistinguishable to the caller.
pub fn login(conn: &Connection, matricule: &str, password: &str) -> Result<User, StoreError> {
    let matricule = normalize_matricule(matricule);
    let Some(user) = store::users::find_by_matricule(conn, &matricule)? else {
        tracing::debug!(%matricule, "login failed: unknown matricule");
        return Err(StoreError::Auth);
    };
    if !verify_password(password, &user.password_hash) {
        tracing::debug!(%matricule, "login failed: password mismatch");
        return Err(StoreError::Auth);
    }
    Ok(user)
}
