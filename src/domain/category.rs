//! Category documents

use serde::{Deserialize, Serialize};

use super::DomainError;

/// Stored category body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
}

impl Category {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::MissingField("name"));
        }
        Ok(())
    }
}

/// Body of `PUT /categories/:id`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CategoryUpdate {
    pub fn into_patch(self) -> Result<serde_json::Value, DomainError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(DomainError::MissingField("name"));
            }
        }

        serde_json::to_value(&self).map_err(|e| DomainError::InvalidField {
            field: "category",
            reason: e.to_string(),
        })
    }
}
