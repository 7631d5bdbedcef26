//! Pure validation for the admin write paths.
//!
//! Validators take raw form input, trim it, and either return a normalized
//! value ready for persistence or the complete list of violation messages
//! in field order. They never touch storage: uniqueness and referential
//! checks belong to the stores.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::{Validate, ValidationError, ValidationErrors};

/// Raw category form input, exactly as submitted.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(custom = "validate_category_name")]
    pub name: String,
}

/// Raw product form input. Price arrives as text so that a non-numeric
/// value is a validation outcome rather than a deserialization failure.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(custom = "validate_product_name")]
    pub name: String,
    #[validate(custom = "validate_category_reference")]
    pub category: String,
    #[validate(custom = "validate_description")]
    pub description: String,
    #[validate(custom = "validate_price")]
    pub price: String,
}

/// Category fields that passed validation, trimmed and ready to persist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
}

/// Product fields that passed validation. The category reference is still
/// raw text; resolving it against live categories is the service's job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: Decimal,
}

// Field order used when flattening violations into messages.
const CATEGORY_FIELDS: &[&str] = &["name"];
const PRODUCT_FIELDS: &[&str] = &["name", "category", "description", "price"];

const PRICE_NOT_A_NUMBER: &str = "Price must be a valid number";

/// Validates a category submission against all rules at once.
pub fn validate_category(input: &CategoryInput) -> Result<NewCategory, Vec<String>> {
    let candidate = CategoryInput {
        name: input.name.trim().to_string(),
    };
    candidate
        .validate()
        .map_err(|errors| collect_messages(&errors, CATEGORY_FIELDS))?;
    Ok(NewCategory {
        name: candidate.name,
    })
}

/// Validates a product submission against all rules at once and normalizes
/// the price to two decimal places.
pub fn validate_product(input: &ProductInput) -> Result<NewProduct, Vec<String>> {
    let candidate = ProductInput {
        name: input.name.trim().to_string(),
        category: input.category.trim().to_string(),
        description: input.description.trim().to_string(),
        price: input.price.trim().to_string(),
    };
    candidate
        .validate()
        .map_err(|errors| collect_messages(&errors, PRODUCT_FIELDS))?;
    let price =
        normalize_price(&candidate.price).ok_or_else(|| vec![PRICE_NOT_A_NUMBER.to_string()])?;
    Ok(NewProduct {
        name: candidate.name,
        category: candidate.category,
        description: candidate.description,
        price,
    })
}

/// Parses an already-validated price string and normalizes it to two
/// decimal places, rounding half away from zero (19.999 becomes 20.00).
fn normalize_price(raw: &str) -> Option<Decimal> {
    let price = Decimal::from_str(raw).ok()?;
    if price <= Decimal::ZERO {
        return None;
    }
    Some(price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Flattens violations into display messages, walking fields in form order
/// so the output is stable regardless of hash map iteration.
fn collect_messages(errors: &ValidationErrors, fields: &[&'static str]) -> Vec<String> {
    let by_field = errors.field_errors();
    let mut messages = Vec::new();
    for &field in fields {
        if let Some(violations) = by_field.get(field) {
            for violation in violations.iter() {
                match &violation.message {
                    Some(message) => messages.push(message.to_string()),
                    None => messages.push(format!("{field} is invalid")),
                }
            }
        }
    }
    messages
}

fn violation(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn validate_category_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(violation("required", "Category name is required"));
    }
    let length = name.chars().count();
    if length < 2 {
        return Err(violation(
            "min_length",
            "Category name must be at least 2 characters long",
        ));
    }
    if length > 100 {
        return Err(violation(
            "max_length",
            "Category name must not exceed 100 characters",
        ));
    }
    Ok(())
}

fn validate_product_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(violation("required", "Product name is required"));
    }
    let length = name.chars().count();
    if length < 2 {
        return Err(violation(
            "min_length",
            "Product name must be at least 2 characters long",
        ));
    }
    if length > 200 {
        return Err(violation(
            "max_length",
            "Product name must not exceed 200 characters",
        ));
    }
    Ok(())
}

fn validate_category_reference(category: &str) -> Result<(), ValidationError> {
    if category.is_empty() {
        return Err(violation("required", "Category is required"));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.is_empty() {
        return Err(violation("required", "Description is required"));
    }
    let length = description.chars().count();
    if length < 10 {
        return Err(violation(
            "min_length",
            "Description must be at least 10 characters long",
        ));
    }
    if length > 2000 {
        return Err(violation(
            "max_length",
            "Description must not exceed 2000 characters",
        ));
    }
    Ok(())
}

fn validate_price(price: &str) -> Result<(), ValidationError> {
    if price.is_empty() {
        return Err(violation("required", "Price is required"));
    }
    match Decimal::from_str(price) {
        Err(_) => Err(violation("not_a_number", PRICE_NOT_A_NUMBER)),
        Ok(value) if value <= Decimal::ZERO => Err(violation(
            "not_positive",
            "Price must be greater than 0",
        )),
        Ok(_) => Ok(()),
    }
}
