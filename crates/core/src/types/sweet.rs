//! Catalog records and search filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::SweetId;
use super::price::Price;

/// A sellable catalog record, as returned by the remote service.
///
/// `quantity` is unsigned, so a cached record can never hold negative stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sweet {
    /// Server-assigned identifier, unique within the catalog.
    pub id: SweetId,
    pub name: String,
    pub category: String,
    pub price: Price,
    /// Units in stock.
    pub quantity: u32,
    #[serde(default)]
    pub description: String,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Sweet {
    /// Whether the record has no stock left.
    #[must_use]
    pub const fn is_out_of_stock(&self) -> bool {
        self.quantity == 0
    }

    /// The editable fields of this record, e.g. to prefill an edit form.
    #[must_use]
    pub fn to_draft(&self) -> SweetDraft {
        SweetDraft {
            name: self.name.clone(),
            category: self.category.clone(),
            price: self.price,
            quantity: self.quantity,
            description: self.description.clone(),
        }
    }
}

/// Create/update payload: a catalog record without its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweetDraft {
    pub name: String,
    pub category: String,
    pub price: Price,
    pub quantity: u32,
    pub description: String,
}

/// Sparse catalog search filter.
///
/// Blank text fields count as absent: they are never sent to the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub name: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
}

impl SearchFilter {
    /// Filter on a name fragment.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Filter on a category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Filter on an inclusive price range; either bound may be open.
    #[must_use]
    pub const fn with_price_range(mut self, min: Option<Price>, max: Option<Price>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    /// True when no field would be sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }

    /// Query parameters for the outbound request, omitting blank fields.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(ToOwned::to_owned)
        };

        let mut pairs = Vec::with_capacity(4);
        if let Some(name) = text(&self.name) {
            pairs.push(("name", name));
        }
        if let Some(category) = text(&self.category) {
            pairs.push(("category", category));
        }
        if let Some(min) = self.min_price {
            pairs.push(("minPrice", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("maxPrice", max.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "id": 7,
            "name": "Gummy Bears",
            "category": "Gummies",
            "price": 2.5,
            "quantity": 3,
            "description": "Chewy fruit bears",
            "createdAt": 1700000000000,
            "updatedAt": null
        }"#
    }

    #[test]
    fn test_decode_server_record() {
        let sweet: Sweet = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(sweet.id, SweetId::new(7));
        assert_eq!(sweet.price, Price::from_cents(250));
        assert_eq!(sweet.quantity, 3);
        assert_eq!(
            sweet.created_at.map(|t| t.timestamp_millis()),
            Some(1_700_000_000_000)
        );
        assert!(sweet.updated_at.is_none());
    }

    #[test]
    fn test_decode_rejects_negative_quantity() {
        let json = sample_json().replace("\"quantity\": 3", "\"quantity\": -1");
        assert!(serde_json::from_str::<Sweet>(&json).is_err());
    }

    #[test]
    fn test_draft_omits_id_and_timestamps() {
        let sweet: Sweet = serde_json::from_str(sample_json()).unwrap();
        let value = serde_json::to_value(sweet.to_draft()).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("createdAt").is_none());
        assert_eq!(value["quantity"], 3);
        assert_eq!(value["name"], "Gummy Bears");
    }

    #[test]
    fn test_out_of_stock() {
        let mut sweet: Sweet = serde_json::from_str(sample_json()).unwrap();
        assert!(!sweet.is_out_of_stock());
        sweet.quantity = 0;
        assert!(sweet.is_out_of_stock());
    }

    #[test]
    fn test_empty_filter_sends_nothing() {
        let filter = SearchFilter::default();
        assert!(filter.is_empty());
        assert!(filter.query_pairs().is_empty());
    }

    #[test]
    fn test_blank_fields_are_omitted() {
        let filter = SearchFilter::default().with_name("   ").with_category("");
        assert!(filter.is_empty());
    }

    #[test]
    fn test_query_pairs_use_wire_names() {
        let filter = SearchFilter::default()
            .with_name(" bear ")
            .with_price_range(Some(Price::from_cents(100)), None);
        assert_eq!(
            filter.query_pairs(),
            vec![("name", "bear".to_owned()), ("minPrice", "1.00".to_owned())]
        );
    }
}
