//! Collection identity.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied coordinates of a remote collection.
///
/// Bootstrap resolves an identity to a [`CollectionId`]. The identity is
/// fixed for the lifetime of the updater that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionIdentity {
    /// Network (tenant) name.
    pub network: String,
    /// Site ID within the network.
    pub site_id: String,
    /// Article ID within the site.
    pub article_id: String,
    /// Optional deployment environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

impl CollectionIdentity {
    /// Creates a new identity without an environment.
    pub fn new(
        network: impl Into<String>,
        site_id: impl Into<String>,
        article_id: impl Into<String>,
    ) -> Self {
        Self {
            network: network.into(),
            site_id: site_id.into(),
            article_id: article_id.into(),
            environment: None,
        }
    }

    /// Sets the environment.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Checks that every required coordinate is present.
    pub fn validate(&self) -> ProtocolResult<()> {
        for (name, value) in [
            ("network", &self.network),
            ("siteId", &self.site_id),
            ("articleId", &self.article_id),
        ] {
            if value.trim().is_empty() {
                return Err(ProtocolError::InvalidIdentity(format!("{name} is empty")));
            }
        }
        Ok(())
    }
}

impl fmt::Display for CollectionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.network, self.site_id, self.article_id)?;
        if let Some(env) = &self.environment {
            write!(f, "@{env}")?;
        }
        Ok(())
    }
}

/// Server-assigned collection ID, resolved by bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(String);

impl CollectionId {
    /// Creates a collection ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_wire_names() {
        let identity = CollectionIdentity::new("n1", "s1", "a1");
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"network": "n1", "siteId": "s1", "articleId": "a1"})
        );
    }

    #[test]
    fn identity_validation() {
        assert!(CollectionIdentity::new("n1", "s1", "a1").validate().is_ok());

        let err = CollectionIdentity::new("n1", " ", "a1").validate().unwrap_err();
        assert_eq!(err, ProtocolError::InvalidIdentity("siteId is empty".into()));
    }

    #[test]
    fn identity_display() {
        let identity = CollectionIdentity::new("n1", "s1", "a1").with_environment("qa");
        assert_eq!(identity.to_string(), "n1/s1/a1@qa");
    }
}
