use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// The authenticated user held by the session store.
///
/// Fields the client does not know about are kept in `extra`, so merging a
/// backend row into the session never drops data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionUser {
    /// Create a user record with only the required fields set.
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            nickname: None,
            created_at: None,
            extra: Map::new(),
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Name shown to other users: the nickname, falling back to the email.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.email)
    }

    /// Shallow-merge `patch` over this record.
    ///
    /// Keys in the patch replace keys in the record; every other key is kept.
    /// Fails if the merged object no longer describes a valid user.
    pub fn merged(&self, patch: &UserPatch) -> Result<SessionUser, serde_json::Error> {
        let Value::Object(mut record) = serde_json::to_value(self)? else {
            return Err(serde_json::Error::custom("session user is not a JSON object"));
        };
        record.extend(patch.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        serde_json::from_value(Value::Object(record))
    }
}

/// A partial user record applied with [`SessionUser::merged`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserPatch(Map<String, Value>);

impl UserPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nickname(self, nickname: impl Into<String>) -> Self {
        self.field("nickname", nickname.into())
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

/// Profile row kept by the backend next to its auth records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Profile> for UserPatch {
    fn from(profile: Profile) -> Self {
        let mut fields = profile.extra;
        fields.insert("id".to_string(), Value::String(profile.id.to_string()));
        if let Some(nickname) = profile.nickname {
            fields.insert("nickname".to_string(), Value::String(nickname));
        }
        Self(fields)
    }
}
