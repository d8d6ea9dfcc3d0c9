use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::query::{BusinessFilter, UserFilter};

// ============================================================================
// ENUMS
// ============================================================================

/// Moderation status of a listing. Any status may follow any other.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BusinessStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl BusinessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Role of a profile
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    #[default]
    Regular,
    BusinessOwner,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::BusinessOwner => "business_owner",
            Self::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "regular" => Some(Self::Regular),
            "business_owner" => Some(Self::BusinessOwner),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Roles allowed to create and edit listings
    pub fn manages_listings(&self) -> bool {
        matches!(self, Self::BusinessOwner | Self::Admin)
    }
}

/// Account status of a profile
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Pending,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Pending => "pending",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

// ============================================================================
// ENTITIES
// ============================================================================

/// Directory listing as consumed by callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub website: Option<String>,
    pub working_hours: Option<String>,
    pub services: Vec<String>,
    pub images: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_promoted: bool,
    pub status: BusinessStatus,
    pub image: String,
    pub rating: f64,
    pub review_count: i64,
    /// Kilometres from the caller's origin; never persisted
    pub distance: f64,
    pub reviews: Vec<Review>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Customer review attached to a listing. Read-only through this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub user_name: String,
    pub rating: f64,
    pub comment: String,
    pub date: Option<DateTime<Utc>>,
}

/// Listing payload for the add operation: no id, no store-managed or derived fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewBusiness {
    pub name: String,
    pub category: String,
    pub description: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub website: Option<String>,
    pub working_hours: Option<String>,
    pub services: Vec<String>,
    pub images: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_promoted: bool,
    pub status: Option<BusinessStatus>,
    pub image: String,
}

/// Profile as consumed by callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub user_type: UserType,
    pub status: UserStatus,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Profile payload for the add operation. `id` is set when the profile
/// mirrors an account that already exists in the identity provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewUser {
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub user_type: Option<UserType>,
    pub status: Option<UserStatus>,
    pub national_id: Option<String>,
    pub phone: Option<String>,
}

// ============================================================================
// REQUEST/RESPONSE DTOs
// ============================================================================

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Payload sent by business owners to register a listing
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBusinessRequest {
    #[validate(length(min = 2, max = 120))]
    pub name: String,
    #[validate(length(min = 2, max = 120))]
    pub category: String,
    #[validate(length(max = 4000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 3, max = 500))]
    pub address: String,
    #[validate(length(min = 3, max = 32))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(length(max = 200))]
    pub working_hours: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub is_promoted: bool,
    pub status: Option<BusinessStatus>,
    #[serde(default)]
    pub image: String,
}

impl CreateBusinessRequest {
    pub fn into_new_business(self) -> NewBusiness {
        // The primary image falls back to the first gallery image
        let image = if self.image.trim().is_empty() {
            self.images.first().cloned().unwrap_or_default()
        } else {
            self.image
        };

        NewBusiness {
            name: self.name,
            category: self.category,
            description: self.description,
            address: self.address,
            phone: self.phone,
            email: blank_to_none(self.email),
            website: blank_to_none(self.website),
            working_hours: blank_to_none(self.working_hours),
            services: self.services,
            images: self.images,
            latitude: self.latitude,
            longitude: self.longitude,
            is_promoted: self.is_promoted,
            status: self.status,
            image,
        }
    }
}

/// Full-record replacement of a listing's editable fields
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBusinessRequest {
    #[validate(length(min = 2, max = 120))]
    pub name: String,
    #[validate(length(min = 2, max = 120))]
    pub category: String,
    #[validate(length(max = 4000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 3, max = 500))]
    pub address: String,
    #[validate(length(min = 3, max = 32))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(length(max = 200))]
    pub working_hours: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub is_promoted: bool,
    pub status: Option<BusinessStatus>,
    #[serde(default)]
    pub image: String,
}

impl UpdateBusinessRequest {
    /// Overwrites every editable field. Status only changes when
    /// `allow_status` is set; rating, review count and timestamps are
    /// owned by the store and left untouched.
    pub fn apply_to_existing(self, existing: &mut Business, allow_status: bool) {
        existing.name = self.name;
        existing.category = self.category;
        existing.description = self.description;
        existing.address = self.address;
        existing.phone = self.phone;
        existing.email = blank_to_none(self.email);
        existing.website = blank_to_none(self.website);
        existing.working_hours = blank_to_none(self.working_hours);
        existing.services = self.services;
        existing.images = self.images;
        existing.latitude = self.latitude;
        existing.longitude = self.longitude;
        existing.is_promoted = self.is_promoted;
        existing.image = self.image;
        if allow_status {
            if let Some(status) = self.status {
                existing.status = status;
            }
        }
    }
}

/// Moderation decision sent by administrators
#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: BusinessStatus,
}

/// Query string accepted by the listing search endpoint
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "finite_origin"))]
pub struct BusinessListParams {
    pub query: Option<String>,
    pub category: Option<String>,
    pub is_promoted: Option<bool>,
    pub status: Option<BusinessStatus>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: Option<f64>,
}

// Range checks compare with `<`/`>`, which NaN always passes
fn finite_origin(params: &BusinessListParams) -> Result<(), ValidationError> {
    let finite = [params.lat, params.lng]
        .iter()
        .flatten()
        .all(|coordinate| coordinate.is_finite());
    if finite {
        Ok(())
    } else {
        Err(ValidationError::new("non_finite_coordinate"))
    }
}

impl BusinessListParams {
    pub fn filter(&self) -> BusinessFilter {
        BusinessFilter {
            query: self.query.clone(),
            category: self.category.clone(),
            is_promoted: self.is_promoted,
            status: self.status,
        }
    }

    /// Origin for distance computation, only when both coordinates are given
    pub fn origin(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

/// Payload used by administrators to create a profile
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub id: Option<String>,
    #[validate(length(min = 1, max = 60))]
    pub first_name: String,
    #[validate(length(min = 1, max = 60))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub user_type: Option<UserType>,
    pub status: Option<UserStatus>,
    #[validate(length(min = 4, max = 32))]
    pub national_id: Option<String>,
    #[validate(length(min = 3, max = 32))]
    pub phone: Option<String>,
}

impl CreateUserRequest {
    pub fn into_new_user(self) -> NewUser {
        NewUser {
            id: blank_to_none(self.id),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            user_type: self.user_type,
            status: self.status,
            national_id: blank_to_none(self.national_id),
            phone: blank_to_none(self.phone),
        }
    }
}

/// Full-record replacement of a profile
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 60))]
    pub first_name: String,
    #[validate(length(min = 1, max = 60))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub user_type: UserType,
    pub status: UserStatus,
    #[validate(length(min = 4, max = 32))]
    pub national_id: Option<String>,
    #[validate(length(min = 3, max = 32))]
    pub phone: Option<String>,
}

impl UpdateUserRequest {
    pub fn apply_to_existing(self, existing: &mut User) {
        existing.first_name = self.first_name;
        existing.last_name = self.last_name;
        existing.email = self.email;
        existing.user_type = self.user_type;
        existing.status = self.status;
        existing.national_id = blank_to_none(self.national_id);
        existing.phone = blank_to_none(self.phone);
    }
}

/// Query string accepted by the profile listing endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListParams {
    pub query: Option<String>,
    pub user_type: Option<UserType>,
    pub status: Option<UserStatus>,
}

impl UserListParams {
    pub fn filter(&self) -> UserFilter {
        UserFilter {
            query: self.query.clone(),
            user_type: self.user_type,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateBusinessRequest {
        CreateBusinessRequest {
            name: "Toranj Restaurant".into(),
            category: "Restaurant & Cafe".into(),
            description: "Persian dishes".into(),
            address: "12 Valiasr St".into(),
            phone: "+98 21 5555 0101".into(),
            email: None,
            website: None,
            working_hours: None,
            services: vec!["Dine-in".into()],
            images: vec!["https://img.example.com/toranj.jpg".into()],
            latitude: Some(35.7),
            longitude: Some(51.4),
            is_promoted: false,
            status: None,
            image: String::new(),
        }
    }

    #[test]
    fn list_params_reject_unusable_origins() {
        let nan = BusinessListParams {
            lat: Some(f64::NAN),
            lng: Some(51.4),
            ..Default::default()
        };
        assert!(nan.validate().is_err());

        let out_of_range = BusinessListParams {
            lat: Some(35.7),
            lng: Some(181.0),
            ..Default::default()
        };
        assert!(out_of_range.validate().is_err());

        let valid = BusinessListParams {
            lat: Some(35.7),
            lng: Some(51.4),
            ..Default::default()
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn create_request_rejects_out_of_range_coordinates() {
        let mut request = create_request();
        request.latitude = Some(120.0);
        assert!(request.validate().is_err());
    }

    #[test]
    fn create_request_rejects_malformed_email() {
        let mut request = create_request();
        request.email = Some("not-an-email".into());
        assert!(request.validate().is_err());
    }

    #[test]
    fn new_business_normalises_blank_optionals_and_primary_image() {
        let mut request = create_request();
        request.email = Some("  ".into());
        assert!(request.validate().is_err(), "blank email is not an address");

        let new_business = request.into_new_business();
        assert_eq!(new_business.email, None);
        assert_eq!(new_business.image, "https://img.example.com/toranj.jpg");
        assert_eq!(new_business.status, None);
    }

    #[test]
    fn status_strings_round_trip_through_parse() {
        for status in [
            BusinessStatus::Pending,
            BusinessStatus::Approved,
            BusinessStatus::Rejected,
        ] {
            assert_eq!(BusinessStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(UserType::parse("business_owner"), Some(UserType::BusinessOwner));
        assert_eq!(UserStatus::parse("archived"), None);
    }

    #[test]
    fn list_params_origin_requires_both_coordinates() {
        let params = BusinessListParams {
            lat: Some(35.7),
            ..Default::default()
        };
        assert_eq!(params.origin(), None);
    }
}
