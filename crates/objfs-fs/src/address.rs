use std::fmt;
use std::str::FromStr;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

use crate::error::{FsError, FsResult};

/// Bytes escaped when an object id is written back into a URL.
const OBJECT_ID: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A parsed `scheme://pool/object-id` address.
///
/// The URL host names the pool. The path, minus its leading `/`, is the
/// object id; any further `/` characters are part of the id itself. The id
/// is percent-decoded and otherwise taken verbatim: dot segments such as
/// `a/../b` are not resolved, since ids are flat strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectUrl {
    scheme: String,
    pool: String,
    object_id: String,
}

fn invalid(url: &str, reason: impl Into<String>) -> FsError {
    FsError::InvalidUrl {
        url: url.to_string(),
        reason: reason.into(),
    }
}

/// The path exactly as written after the authority, without query or
/// fragment.
fn raw_path(input: &str) -> &str {
    let trimmed = input.trim_matches(|c: char| c <= ' ');
    let Some((_, rest)) = trimmed.split_once("://") else {
        return "";
    };
    let after_authority = rest
        .find(['/', '?', '#'])
        .map_or("", |start| &rest[start..]);
    let end = after_authority.find(['?', '#']).unwrap_or(after_authority.len());
    &after_authority[..end]
}

impl ObjectUrl {
    /// Parse an absolute URL.
    pub fn parse(input: &str) -> FsResult<Self> {
        let parsed = Url::parse(input).map_err(|e| invalid(input, e.to_string()))?;
        let pool = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| invalid(input, "missing pool name (URL host)"))?;
        let path = raw_path(input);
        let encoded = path.strip_prefix('/').unwrap_or(path);
        let object_id = percent_decode_str(encoded)
            .decode_utf8()
            .map_err(|e| invalid(input, format!("object path is not UTF-8: {e}")))?;
        Ok(Self {
            scheme: parsed.scheme().to_string(),
            pool: pool.to_string(),
            object_id: object_id.into_owned(),
        })
    }

    /// Build a URL from its parts.
    pub fn new(scheme: &str, pool: &str, object_id: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            pool: pool.to_string(),
            object_id: object_id.trim_start_matches('/').to_string(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Pool name (the URL host).
    pub fn pool(&self) -> &str {
        &self.pool
    }

    /// Object id (the URL path without its leading `/`). May be empty.
    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// The object id, or an error if the URL does not name an object.
    pub fn require_object_id(&self) -> FsResult<&str> {
        if self.object_id.is_empty() {
            return Err(invalid(&self.to_string(), "missing object path"));
        }
        Ok(&self.object_id)
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}/{}",
            self.scheme,
            self.pool,
            utf8_percent_encode(&self.object_id, OBJECT_ID)
        )
    }
}

impl FromStr for ObjectUrl {
    type Err = FsError;

    fn from_str(s: &str) -> FsResult<Self> {
        Self::parse(s)
    }
}
