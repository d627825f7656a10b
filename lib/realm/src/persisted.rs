//! Persisted form of the realm credentials.
//!
//! The host stores the realm as a flat record of named string fields. Two
//! record versions exist:
//!
//! | version | fields |
//! |---|---|
//! | 1 | `clientID`, `clientSecret` |
//! | 2 | `clientID`, `clientSecret`, `teamName` |
//!
//! Older hosts wrote no `version` key at all, and matched field names without
//! regard to case, so decoding accepts `clientid`, `client_id`, `ClientID` and
//! friends. Encoding always produces the current version.

use rootcause::prelude::Report;
use serde_json::{Map, Value};

use crate::credentials::Credentials;
use crate::error::CredentialsError;

/// Current record version written by [`encode`].
pub const CURRENT_VERSION: u32 = 2;

const VERSION_KEY: &str = "version";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ClientId,
    ClientSecret,
    TeamName,
    Version,
}

fn classify(key: &str) -> Option<Field> {
    let folded: String = key
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    match folded.as_str() {
        "clientid" => Some(Field::ClientId),
        "clientsecret" => Some(Field::ClientSecret),
        "teamname" => Some(Field::TeamName),
        "version" => Some(Field::Version),
        _ => None,
    }
}

/// Decodes a persisted record (JSON object) into credentials.
///
/// # Errors
///
/// Returns `CredentialsError` if the payload is not an object, names an
/// unknown field, lacks the client id or secret, carries a non-string value,
/// or declares a version newer than [`CURRENT_VERSION`].
pub fn decode(payload: &str) -> Result<Credentials, Report<CredentialsError>> {
    let value: Value = serde_json::from_str(payload).map_err(|e| CredentialsError::Malformed {
        reason: e.to_string(),
    })?;
    let Value::Object(fields) = value else {
        return Err(CredentialsError::Malformed {
            reason: "expected an object".to_string(),
        }
        .into());
    };

    let mut client_id = None;
    let mut client_secret = None;
    let mut team_name = None;
    let mut version = None;

    for (key, value) in fields {
        match classify(&key) {
            Some(Field::ClientId) => client_id = string_value(&key, value)?,
            Some(Field::ClientSecret) => client_secret = string_value(&key, value)?,
            Some(Field::TeamName) => team_name = string_value(&key, value)?,
            Some(Field::Version) => version = Some(version_value(value)?),
            None => return Err(CredentialsError::UnknownField { field: key }.into()),
        }
    }

    let version = version.unwrap_or(if team_name.is_some() { 2 } else { 1 });
    if version == 0 || version > CURRENT_VERSION {
        return Err(CredentialsError::UnsupportedVersion { version }.into());
    }

    let client_id = client_id
        .filter(|v| !v.trim().is_empty())
        .ok_or(CredentialsError::MissingField { field: "clientID" })?;
    let client_secret = client_secret
        .filter(|v| !v.trim().is_empty())
        .ok_or(CredentialsError::MissingField {
            field: "clientSecret",
        })?;

    Ok(Credentials::new(client_id, client_secret, team_name))
}

/// Encodes credentials as a current-version record.
#[must_use]
pub fn encode(credentials: &Credentials) -> String {
    let mut fields = Map::new();
    fields.insert(VERSION_KEY.to_string(), Value::from(CURRENT_VERSION));
    fields.insert("clientID".to_string(), Value::from(credentials.client_id()));
    fields.insert(
        "clientSecret".to_string(),
        Value::from(credentials.client_secret()),
    );
    fields.insert(
        "teamName".to_string(),
        credentials
            .team_name()
            .map_or(Value::Null, Value::from),
    );
    Value::Object(fields).to_string()
}

fn string_value(key: &str, value: Value) -> Result<Option<String>, CredentialsError> {
    match value {
        Value::String(s) => Ok(Some(s)),
        Value::Null => Ok(None),
        other => Err(CredentialsError::Malformed {
            reason: format!("field '{key}' must be a string, got {other}"),
        }),
    }
}

fn version_value(value: Value) -> Result<u32, CredentialsError> {
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| CredentialsError::Malformed {
            reason: format!("version must be a small unsigned integer, got {value}"),
        })
}
