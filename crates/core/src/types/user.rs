//! User records as exchanged with the backend and kept in the session.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::{Email, Role};

/// A user account (backend wire shape).
///
/// Field names on the wire follow the backend (`nombre`, `fechaNac`,
/// `myReferralCode`, ...). Only `email` is required; everything else
/// decodes leniently so that partially populated records, such as those
/// cached by older clients, still load. Unknown fields are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Account email; the backend's key for the user.
    pub email: Email,
    /// Chilean national ID (RUN).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
    /// Given name(s).
    #[serde(rename = "nombre", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name(s).
    #[serde(rename = "apellidos", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Date of birth.
    #[serde(
        rename = "fechaNac",
        default,
        skip_serializing_if = "Option::is_none",
        with = "birth_date"
    )]
    pub birth_date: Option<NaiveDate>,
    /// Account role.
    #[serde(default, deserialize_with = "role_or_default")]
    pub role: Role,
    /// Region of residence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Commune (comuna) of residence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comuna: Option<String>,
    /// Loyalty points balance.
    #[serde(default, deserialize_with = "points_or_zero")]
    pub points: u32,
    /// Loyalty level, starting at 1.
    #[serde(default = "first_level", deserialize_with = "level_at_least_one")]
    pub level: u32,
    /// The user's own code to share with referred friends.
    #[serde(
        rename = "myReferralCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub referral_code: Option<String>,
}

impl UserRecord {
    /// Create a minimal record: default role, zero points, level 1.
    #[must_use]
    pub const fn new(email: Email) -> Self {
        Self {
            email,
            run: None,
            first_name: None,
            last_name: None,
            birth_date: None,
            role: Role::User,
            region: None,
            comuna: None,
            points: 0,
            level: 1,
            referral_code: None,
        }
    }

    /// Name to greet the user with, falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.first_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.email.as_str())
    }

    /// Whether the user may manage other accounts.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

const fn first_level() -> u32 {
    1
}

fn points_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.map_or(0, |p| u32::try_from(p.max(0)).unwrap_or(u32::MAX)))
}

fn level_at_least_one<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.map_or(1, |l| u32::try_from(l.max(1)).unwrap_or(u32::MAX)))
}

fn role_or_default<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Role>::deserialize(deserializer)?.unwrap_or_default())
}

/// `fechaNac` is written as `YYYY-MM-DD`; the backend sometimes returns a
/// full timestamp, so anything after the date is ignored on read.
mod birth_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| {
            let date_part = s.split('T').next().unwrap_or_default();
            NaiveDate::parse_from_str(date_part.trim(), FORMAT).ok()
        }))
    }
}
