//! Item data model, partial-update patches, and field validation.

use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

/// Longest accepted item name, in characters.
pub const NAME_MAX_CHARS: usize = 100;

/// A single record held by the registry.
///
/// Identifiers and timestamps are assigned by the registry; everything else
/// comes from caller input. A stored item always satisfies the field
/// constraints enforced by [`NewItem::validate`] and [`ItemPatch::validate`].
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    /// Opaque unique identifier assigned at creation, immutable thereafter.
    pub id: String,
    /// Human-readable name, 1 to 100 characters.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Price, strictly positive.
    pub price: f64,
    /// Optional tax amount, non-negative.
    pub tax: Option<f64>,
    /// Caller-supplied tags; order and duplicates are preserved as given.
    pub tags: Vec<String>,
    /// Set once when the item is created, never modified.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Refreshed on every successful update.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Caller-supplied fields for creating an item.
#[derive(Debug, Clone)]
pub struct NewItem {
    /// Item name, 1 to 100 characters.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Strictly positive price.
    pub price: f64,
    /// Optional non-negative tax amount.
    pub tax: Option<f64>,
    /// Tags stored verbatim; defaults to none.
    pub tags: Vec<String>,
}

/// A partial update: only fields present are applied to the stored item.
///
/// The nullable fields (`description`, `tax`) use a nested `Option` so an
/// explicitly supplied `null` (`Some(None)`) clears the stored value, while
/// an absent field (`None`) leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement description; `Some(None)` clears the stored value.
    pub description: Option<Option<String>>,
    /// Replacement price.
    pub price: Option<f64>,
    /// Replacement tax; `Some(None)` clears the stored value.
    pub tax: Option<Option<f64>>,
    /// Replacement tag list.
    pub tags: Option<Vec<String>>,
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    /// Name of the offending field.
    pub field: &'static str,
    /// Human-readable description of the constraint that was violated.
    pub message: String,
}

/// Errors surfaced by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The referenced identifier is not present in the registry.
    #[error("Item with ID {id} not found")]
    NotFound {
        /// Identifier the caller asked for.
        id: String,
    },
    /// One or more input fields failed validation.
    ///
    /// Every violated field is enumerated, not just the first one found.
    #[error("Invalid item fields: {}", violated_fields(.0))]
    Validation(Vec<FieldViolation>),
}

fn violated_fields(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|violation| violation.field)
        .collect::<Vec<_>>()
        .join(", ")
}

impl NewItem {
    /// Check every field, collecting all violations rather than stopping at
    /// the first.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut violations = Vec::new();
        check_name(&self.name, &mut violations);
        check_price(self.price, &mut violations);
        if let Some(tax) = self.tax {
            check_tax(tax, &mut violations);
        }
        finish(violations)
    }
}

impl ItemPatch {
    /// Validate only the fields present in the patch.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut violations = Vec::new();
        if let Some(name) = &self.name {
            check_name(name, &mut violations);
        }
        if let Some(price) = self.price {
            check_price(price, &mut violations);
        }
        if let Some(Some(tax)) = self.tax {
            check_tax(tax, &mut violations);
        }
        finish(violations)
    }

    /// Overwrite the stored item with every field present in the patch.
    ///
    /// Timestamps are left alone; the service refreshes `updated_at`.
    pub fn apply_to(&self, item: &mut Item) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(tax) = self.tax {
            item.tax = tax;
        }
        if let Some(tags) = &self.tags {
            item.tags = tags.clone();
        }
    }
}

fn finish(violations: Vec<FieldViolation>) -> Result<(), RegistryError> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(RegistryError::Validation(violations))
    }
}

fn check_name(name: &str, violations: &mut Vec<FieldViolation>) {
    if name.is_empty() {
        violations.push(FieldViolation {
            field: "name",
            message: "must not be empty".into(),
        });
    } else if name.chars().count() > NAME_MAX_CHARS {
        violations.push(FieldViolation {
            field: "name",
            message: format!("must be at most {NAME_MAX_CHARS} characters"),
        });
    }
}

fn check_price(price: f64, violations: &mut Vec<FieldViolation>) {
    // NaN compares false against everything, so reject it explicitly.
    if price.is_nan() || price <= 0.0 {
        violations.push(FieldViolation {
            field: "price",
            message: "must be greater than zero".into(),
        });
    }
}

fn check_tax(tax: f64, violations: &mut Vec<FieldViolation>) {
    if tax.is_nan() || tax < 0.0 {
        violations.push(FieldViolation {
            field: "tax",
            message: "must be greater than or equal to zero".into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn sample_item() -> Item {
        let now = OffsetDateTime::now_utc();
        Item {
            id: "item-1".into(),
            name: "Widget".into(),
            description: Some("A widget".into()),
            price: 9.99,
            tax: Some(0.5),
            tags: vec!["a".into(), "b".into()],
            created_at: now,
            updated_at: now,
        }
    }

    fn valid_input() -> NewItem {
        NewItem {
            name: "Widget".into(),
            description: None,
            price: 9.99,
            tax: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn accepts_boundary_values() {
        let input = NewItem {
            name: "x".repeat(100),
            price: 0.01,
            tax: Some(0.0),
            ..valid_input()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn enumerates_every_violated_field() {
        let input = NewItem {
            name: String::new(),
            price: 0.0,
            tax: Some(-1.0),
            ..valid_input()
        };
        let Err(RegistryError::Validation(violations)) = input.validate() else {
            panic!("expected a validation error");
        };
        let fields: Vec<&str> = violations.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["name", "price", "tax"]);
    }

    #[test]
    fn rejects_overlong_name_and_non_positive_price() {
        let overlong = NewItem {
            name: "x".repeat(101),
            ..valid_input()
        };
        assert!(overlong.validate().is_err());

        let negative = NewItem {
            price: -3.0,
            ..valid_input()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn rejects_nan_numeric_fields() {
        let input = NewItem {
            price: f64::NAN,
            tax: Some(f64::NAN),
            ..valid_input()
        };
        let Err(RegistryError::Validation(violations)) = input.validate() else {
            panic!("expected a validation error");
        };
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn patch_validates_only_present_fields() {
        let patch = ItemPatch {
            price: Some(12.5),
            ..ItemPatch::default()
        };
        assert!(patch.validate().is_ok());

        let patch = ItemPatch {
            name: Some(String::new()),
            ..ItemPatch::default()
        };
        assert!(patch.validate().is_err());

        // An explicit null for tax clears the value and has nothing to check.
        let patch = ItemPatch {
            tax: Some(None),
            ..ItemPatch::default()
        };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn apply_to_merges_present_fields_only() {
        let mut item = sample_item();
        let patch = ItemPatch {
            price: Some(12.5),
            ..ItemPatch::default()
        };
        patch.apply_to(&mut item);

        assert_eq!(item.name, "Widget");
        assert_eq!(item.price, 12.5);
        assert_eq!(item.description.as_deref(), Some("A widget"));
        assert_eq!(item.tags.len(), 2);
    }

    #[test]
    fn apply_to_clears_nullable_fields_on_explicit_null() {
        let mut item = sample_item();
        let patch = ItemPatch {
            description: Some(None),
            tax: Some(None),
            ..ItemPatch::default()
        };
        patch.apply_to(&mut item);

        assert_eq!(item.description, None);
        assert_eq!(item.tax, None);
    }

    #[test]
    fn validation_error_names_violated_fields() {
        let input = NewItem {
            name: String::new(),
            price: 0.0,
            ..valid_input()
        };
        let error = input.validate().unwrap_err();
        assert_eq!(error.to_string(), "Invalid item fields: name, price");
    }
}
