//! Mapping between store rows (snake_case columns) and entities.
//!
//! Reading is total: every missing, null or mistyped column resolves to the
//! field's default instead of failing. Writing enumerates every column so the
//! full row shape is visible in one place.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::database::Row;
use crate::models::{
    Business, BusinessStatus, NewBusiness, NewUser, Review, User, UserStatus, UserType,
};

// ============================================================================
// COLUMN READERS
// ============================================================================

fn text(row: &Row, column: &str) -> String {
    opt_text(row, column).unwrap_or_default()
}

fn opt_text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric columns may arrive as JSON strings (`numeric` through PostgREST)
fn opt_number(row: &Row, column: &str) -> Option<f64> {
    match row.get(column)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number(row: &Row, column: &str) -> f64 {
    opt_number(row, column).unwrap_or(0.0)
}

fn integer(row: &Row, column: &str) -> i64 {
    match row.get(column) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn flag(row: &Row, column: &str) -> bool {
    match row.get(column) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn text_list(row: &Row, column: &str) -> Vec<String> {
    match row.get(column) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn timestamp(row: &Row, column: &str) -> Option<DateTime<Utc>> {
    row.get(column)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

fn timestamp_value(value: Option<DateTime<Utc>>) -> Value {
    value
        .map(|t| Value::String(t.to_rfc3339()))
        .unwrap_or(Value::Null)
}

fn into_row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

// ============================================================================
// BUSINESS
// ============================================================================

pub fn business_from_row(row: &Row) -> Business {
    let reviews = match row.get("reviews") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .map(review_from_row)
            .collect(),
        _ => Vec::new(),
    };

    Business {
        id: text(row, "id"),
        name: text(row, "name"),
        category: text(row, "category"),
        description: text(row, "description"),
        address: text(row, "address"),
        phone: text(row, "phone"),
        email: opt_text(row, "email"),
        website: opt_text(row, "website"),
        working_hours: opt_text(row, "working_hours"),
        services: text_list(row, "services"),
        images: text_list(row, "images"),
        latitude: opt_number(row, "latitude"),
        longitude: opt_number(row, "longitude"),
        is_promoted: flag(row, "is_promoted"),
        status: opt_text(row, "status")
            .and_then(|s| BusinessStatus::parse(&s))
            .unwrap_or_default(),
        image: text(row, "image"),
        rating: number(row, "rating"),
        review_count: integer(row, "review_count"),
        distance: number(row, "distance"),
        reviews,
        created_at: timestamp(row, "created_at"),
        updated_at: timestamp(row, "updated_at"),
    }
}

/// Columns every business write carries
fn business_columns(business: &Business) -> Row {
    into_row(json!({
        "name": business.name,
        "category": business.category,
        "description": business.description,
        "address": business.address,
        "phone": business.phone,
        "email": business.email,
        "website": business.website,
        "working_hours": business.working_hours,
        "services": business.services,
        "images": business.images,
        "latitude": business.latitude,
        "longitude": business.longitude,
        "is_promoted": business.is_promoted,
        "status": business.status.as_str(),
        "image": business.image,
    }))
}

/// Complete stored shape of a business, store-managed columns included.
/// Derived fields (`distance`, `reviews`) are never part of a row.
pub fn business_to_row(business: &Business) -> Row {
    let mut row = business_columns(business);
    row.insert("rating".into(), json!(business.rating));
    row.insert("review_count".into(), json!(business.review_count));
    row.insert("id".into(), Value::String(business.id.clone()));
    row.insert("created_at".into(), timestamp_value(business.created_at));
    row.insert("updated_at".into(), timestamp_value(business.updated_at));
    row
}

/// Insert row for a new listing: zero rating and review count, `pending`
/// unless a status was given. Id and timestamps are left to the store.
pub fn new_business_row(new: &NewBusiness) -> Row {
    into_row(json!({
        "name": new.name,
        "category": new.category,
        "description": new.description,
        "address": new.address,
        "phone": new.phone,
        "email": new.email,
        "website": new.website,
        "working_hours": new.working_hours,
        "services": new.services,
        "images": new.images,
        "latitude": new.latitude,
        "longitude": new.longitude,
        "is_promoted": new.is_promoted,
        "status": new.status.unwrap_or_default().as_str(),
        "image": new.image,
        "rating": 0.0,
        "review_count": 0,
    }))
}

/// Full overwrite of the editable columns, stamped with `updated_at`.
/// `rating` and `review_count` are maintained by the review pipeline and
/// only ever read back.
pub fn business_update_row(business: &Business, now: DateTime<Utc>) -> Row {
    let mut row = business_columns(business);
    row.insert("updated_at".into(), Value::String(now.to_rfc3339()));
    row
}

fn review_from_row(row: &Row) -> Review {
    Review {
        id: text(row, "id"),
        user_name: text(row, "user_name"),
        rating: number(row, "rating"),
        comment: text(row, "comment"),
        date: timestamp(row, "created_at"),
    }
}

// ============================================================================
// USER
// ============================================================================

pub fn user_from_row(row: &Row) -> User {
    User {
        id: text(row, "id"),
        first_name: text(row, "first_name"),
        last_name: text(row, "last_name"),
        email: text(row, "email"),
        user_type: opt_text(row, "user_type")
            .and_then(|s| UserType::parse(&s))
            .unwrap_or_default(),
        status: opt_text(row, "status")
            .and_then(|s| UserStatus::parse(&s))
            .unwrap_or_default(),
        national_id: opt_text(row, "national_id"),
        phone: opt_text(row, "phone"),
        created_at: timestamp(row, "created_at"),
    }
}

fn user_columns(user: &User) -> Row {
    into_row(json!({
        "first_name": user.first_name,
        "last_name": user.last_name,
        "email": user.email,
        "user_type": user.user_type.as_str(),
        "status": user.status.as_str(),
        "national_id": user.national_id,
        "phone": user.phone,
    }))
}

pub fn user_to_row(user: &User) -> Row {
    let mut row = user_columns(user);
    row.insert("id".into(), Value::String(user.id.clone()));
    row.insert("created_at".into(), timestamp_value(user.created_at));
    row
}

/// Insert row for a new profile. The id is only sent when the profile
/// mirrors an existing account.
pub fn new_user_row(new: &NewUser) -> Row {
    let mut row = into_row(json!({
        "first_name": new.first_name,
        "last_name": new.last_name,
        "email": new.email,
        "user_type": new.user_type.unwrap_or_default().as_str(),
        "status": new.status.unwrap_or_default().as_str(),
        "national_id": new.national_id,
        "phone": new.phone,
    }));
    if let Some(id) = &new.id {
        row.insert("id".into(), Value::String(id.clone()));
    }
    row
}

/// Profiles carry no `updated_at` column
pub fn user_update_row(user: &User) -> Row {
    user_columns(user)
}
