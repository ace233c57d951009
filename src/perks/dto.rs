use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::perks::repo::{Category, Perk};

/// Body for POST /perks. Unknown fields are rejected at deserialization;
/// everything except `title` has a server-side default.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePerkRequest {
    #[validate(length(min = 2, message = "must be at least 2 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "must be between 0 and 100"))]
    pub discount_percent: f64,
    #[serde(default)]
    pub merchant: String,
}

/// Body for PATCH/PUT /perks/:id. Same rules as create with every field
/// optional; unrecognized fields are dropped rather than rejected.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePerkRequest {
    #[validate(length(min = 2, message = "must be at least 2 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    #[validate(range(min = 0.0, max = 100.0, message = "must be between 0 and 100"))]
    pub discount_percent: Option<f64>,
    pub merchant: Option<String>,
}

impl UpdatePerkRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.discount_percent.is_none()
            && self.merchant.is_none()
    }

    /// Partial merge: only supplied fields overwrite the stored record.
    pub fn merge_into(&self, perk: &mut Perk) {
        if let Some(title) = &self.title {
            perk.title = title.clone();
        }
        if let Some(description) = &self.description {
            perk.description = description.clone();
        }
        if let Some(category) = self.category {
            perk.category = category;
        }
        if let Some(discount_percent) = self.discount_percent {
            perk.discount_percent = discount_percent;
        }
        if let Some(merchant) = &self.merchant {
            perk.merchant = merchant.clone();
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerkResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub discount_percent: f64,
    pub merchant: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Perk> for PerkResponse {
    fn from(p: Perk) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            category: p.category,
            discount_percent: p.discount_percent,
            merchant: p.merchant,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::validation_messages;

    fn sample_perk() -> Perk {
        Perk {
            id: Uuid::new_v4(),
            title: "Free coffee".into(),
            description: "One free americano".into(),
            category: Category::Food,
            discount_percent: 100.0,
            merchant: "Beanery".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn create_applies_defaults() {
        let req: CreatePerkRequest =
            serde_json::from_str(r#"{"title": "Free coffee"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.description, "");
        assert_eq!(req.category, Category::Other);
        assert_eq!(req.discount_percent, 0.0);
        assert_eq!(req.merchant, "");
    }

    #[test]
    fn create_rejects_short_title() {
        let req: CreatePerkRequest = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        let errors = req.validate().unwrap_err();
        let messages = validation_messages(&errors);
        assert_eq!(messages, vec!["title: must be at least 2 characters"]);
    }

    #[test]
    fn create_rejects_discount_out_of_range() {
        let req: CreatePerkRequest =
            serde_json::from_str(r#"{"title": "Free coffee", "discountPercent": 150}"#).unwrap();
        let errors = req.validate().unwrap_err();
        let messages = validation_messages(&errors);
        assert_eq!(messages, vec!["discount_percent: must be between 0 and 100"]);
    }

    #[test]
    fn create_collects_all_field_errors() {
        let req: CreatePerkRequest =
            serde_json::from_str(r#"{"title": "x", "discountPercent": -1}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert_eq!(validation_messages(&errors).len(), 2);
    }

    #[test]
    fn create_rejects_unknown_fields() {
        let parsed: Result<CreatePerkRequest, _> =
            serde_json::from_str(r#"{"title": "Free coffee", "priority": 3}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn create_rejects_unknown_category() {
        let parsed: Result<CreatePerkRequest, _> =
            serde_json::from_str(r#"{"title": "Free coffee", "category": "gaming"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn update_drops_unknown_fields() {
        let req: UpdatePerkRequest =
            serde_json::from_str(r#"{"description": "new", "priority": 3}"#).unwrap();
        assert_eq!(req.description.as_deref(), Some("new"));
        assert!(req.title.is_none());
    }

    #[test]
    fn update_detects_empty_body() {
        let req: UpdatePerkRequest = serde_json::from_str("{}").unwrap();
        assert!(req.is_empty());
        let req: UpdatePerkRequest =
            serde_json::from_str(r#"{"merchant": "Beanery"}"#).unwrap();
        assert!(!req.is_empty());
    }

    #[test]
    fn update_validates_supplied_fields_only() {
        let req: UpdatePerkRequest =
            serde_json::from_str(r#"{"description": "new"}"#).unwrap();
        assert!(req.validate().is_ok());

        let req: UpdatePerkRequest =
            serde_json::from_str(r#"{"title": "x", "discountPercent": 150}"#).unwrap();
        let errors = req.validate().unwrap_err();
        let messages = validation_messages(&errors);
        assert_eq!(
            messages,
            vec![
                "discount_percent: must be between 0 and 100",
                "title: must be at least 2 characters",
            ]
        );
    }

    #[test]
    fn merge_changes_only_supplied_fields() {
        let mut perk = sample_perk();
        let req: UpdatePerkRequest =
            serde_json::from_str(r#"{"description": "new"}"#).unwrap();
        req.merge_into(&mut perk);
        assert_eq!(perk.description, "new");
        assert_eq!(perk.title, "Free coffee");
        assert_eq!(perk.category, Category::Food);
        assert_eq!(perk.discount_percent, 100.0);
        assert_eq!(perk.merchant, "Beanery");
    }

    #[test]
    fn response_uses_camel_case_and_rfc3339() {
        let response = PerkResponse::from(sample_perk());
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("discountPercent").is_some());
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00Z");
        assert_eq!(json["category"], "food");
    }
}
