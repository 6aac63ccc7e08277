//! Request bodies sent to the backend.

use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer};

use levelup_core::{Email, Role, UserRecord};

/// `POST /api/auth/login` body.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    /// Account email.
    pub email: &'a Email,
    /// Plain-text password, exposed only while serializing.
    #[serde(serialize_with = "expose")]
    pub password: &'a SecretString,
}

/// User fields for registration, admin creation, and admin updates.
///
/// On update, a `None` password leaves the stored password unchanged.
#[derive(Debug, Clone, Serialize)]
pub struct UserDraft {
    /// Chilean national ID (RUN).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
    /// Given name(s).
    #[serde(rename = "nombre")]
    pub first_name: String,
    /// Family name(s).
    #[serde(rename = "apellidos")]
    pub last_name: String,
    /// Account email.
    pub email: Email,
    /// New password.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "expose_opt"
    )]
    pub password: Option<SecretString>,
    /// Date of birth, sent as `YYYY-MM-DD`.
    #[serde(rename = "fechaNac", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    /// Account role.
    pub role: Role,
    /// Region of residence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Commune of residence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comuna: Option<String>,
    /// Referral code of the friend who invited this user (registration only).
    #[serde(rename = "referralCode", skip_serializing_if = "Option::is_none")]
    pub referred_by: Option<String>,
    /// Points balance (admin only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    /// Loyalty level (admin only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

impl UserDraft {
    /// A draft for a new customer account.
    #[must_use]
    pub fn new(
        email: Email,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            run: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email,
            password: Some(password),
            birth_date: None,
            role: Role::User,
            region: None,
            comuna: None,
            referred_by: None,
            points: None,
            level: None,
        }
    }

    /// A draft that rewrites an existing record as-is (password untouched).
    ///
    /// Admin edits start from this and change individual fields.
    #[must_use]
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            run: record.run.clone(),
            first_name: record.first_name.clone().unwrap_or_default(),
            last_name: record.last_name.clone().unwrap_or_default(),
            email: record.email.clone(),
            password: None,
            birth_date: record.birth_date,
            role: record.role,
            region: record.region.clone(),
            comuna: record.comuna.clone(),
            referred_by: None,
            points: Some(record.points),
            level: Some(record.level.max(1)),
        }
    }
}

fn expose<S: Serializer>(secret: &&SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[allow(clippy::ref_option)]
fn expose_opt<S: Serializer>(
    secret: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(secret) => serializer.serialize_str(secret.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_login_request_exposes_password_only_in_json() {
        let email = Email::parse("x@x.com").unwrap();
        let password = SecretString::from("hunter22");
        let req = LoginRequest {
            email: &email,
            password: &password,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"email": "x@x.com", "password": "hunter22"})
        );
        assert!(!format!("{req:?}").contains("hunter22"));
    }

    #[test]
    fn test_register_draft_wire_shape() {
        let mut draft = UserDraft::new(
            Email::parse("ana@duoc.cl").unwrap(),
            "Ana",
            "Pérez",
            SecretString::from("pw"),
        );
        draft.birth_date = NaiveDate::from_ymd_opt(2001, 4, 9);
        draft.referred_by = Some("BOB-1234".to_string());

        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            json!({
                "nombre": "Ana",
                "apellidos": "Pérez",
                "email": "ana@duoc.cl",
                "password": "pw",
                "fechaNac": "2001-04-09",
                "role": "USER",
                "referralCode": "BOB-1234"
            })
        );
    }

    #[test]
    fn test_update_draft_omits_password() {
        let mut record = UserRecord::new(Email::parse("x@x.com").unwrap());
        record.first_name = Some("Ana".to_string());
        record.points = 300;
        let draft = UserDraft::from_record(&record);

        let value = serde_json::to_value(&draft).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["points"], 300);
        assert_eq!(value["level"], 1);
        assert_eq!(value["nombre"], "Ana");
    }
}
