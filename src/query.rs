use serde::Deserialize;

use crate::database::SelectQuery;
use crate::models::{Business, BusinessStatus, UserStatus, UserType};

const BUSINESS_SEARCH_COLUMNS: &[&str] = &["name", "description"];
const USER_SEARCH_COLUMNS: &[&str] = &["first_name", "last_name", "email"];

/// Sparse listing constraints. Every present key narrows the result; absent
/// keys leave the field unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessFilter {
    /// Case-insensitive substring of name or description
    pub query: Option<String>,
    pub category: Option<String>,
    pub is_promoted: Option<bool>,
    pub status: Option<BusinessStatus>,
}

impl BusinessFilter {
    /// All listings, newest first, narrowed by each supplied filter
    pub fn to_select(&self) -> SelectQuery {
        let mut select = SelectQuery::new().order_by("created_at", true);

        if let Some(needle) = search_term(&self.query) {
            select = select.contains(BUSINESS_SEARCH_COLUMNS, needle);
        }
        if let Some(category) = present(&self.category) {
            select = select.eq("category", category);
        }
        if let Some(is_promoted) = self.is_promoted {
            select = select.eq("is_promoted", is_promoted);
        }
        if let Some(status) = self.status {
            select = select.eq("status", status.as_str());
        }

        select
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    /// Case-insensitive substring of first name, last name or email
    pub query: Option<String>,
    pub user_type: Option<UserType>,
    pub status: Option<UserStatus>,
}

impl UserFilter {
    pub fn to_select(&self) -> SelectQuery {
        let mut select = SelectQuery::new().order_by("created_at", true);

        if let Some(needle) = search_term(&self.query) {
            select = select.contains(USER_SEARCH_COLUMNS, needle);
        }
        if let Some(user_type) = self.user_type {
            select = select.eq("user_type", user_type.as_str());
        }
        if let Some(status) = self.status {
            select = select.eq("status", status.as_str());
        }

        select
    }
}

/// Blank values constrain nothing, same as an absent key
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn search_term(query: &Option<String>) -> Option<&str> {
    query
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
}

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres between two coordinates
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lng2) = (to.0.to_radians(), to.1.to_radians());

    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

    // Rounding can push `a` just past 1 for antipodal points
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Fills the derived `distance` of every listing that has coordinates.
/// Result order is left untouched.
pub fn annotate_distance(businesses: &mut [Business], origin: (f64, f64)) {
    for business in businesses.iter_mut() {
        if let (Some(lat), Some(lng)) = (business.latitude, business.longitude) {
            business.distance = haversine_km(origin, (lat, lng));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Order, Predicate};
    use serde_json::json;

    #[test]
    fn empty_filter_is_ordered_base_query() {
        let select = BusinessFilter::default().to_select();

        assert!(select.predicates.is_empty());
        assert_eq!(
            select.order,
            Some(Order {
                column: "created_at",
                descending: true
            })
        );
    }

    #[test]
    fn every_supplied_filter_becomes_a_predicate() {
        let filter = BusinessFilter {
            query: Some("  kebab ".into()),
            category: Some("Restaurant & Cafe".into()),
            is_promoted: Some(true),
            status: Some(BusinessStatus::Approved),
        };

        let select = filter.to_select();
        assert_eq!(
            select.predicates,
            vec![
                Predicate::Contains {
                    columns: BUSINESS_SEARCH_COLUMNS,
                    needle: "kebab".into()
                },
                Predicate::Eq {
                    column: "category",
                    value: json!("Restaurant & Cafe")
                },
                Predicate::Eq {
                    column: "is_promoted",
                    value: json!(true)
                },
                Predicate::Eq {
                    column: "status",
                    value: json!("approved")
                },
            ]
        );
    }

    #[test]
    fn blank_search_text_is_ignored() {
        let filter = BusinessFilter {
            query: Some("   ".into()),
            ..Default::default()
        };
        assert!(filter.to_select().predicates.is_empty());
    }

    #[test]
    fn blank_category_is_ignored() {
        let filter = BusinessFilter {
            category: Some(String::new()),
            is_promoted: Some(false),
            ..Default::default()
        };
        assert_eq!(
            filter.to_select().predicates,
            vec![Predicate::Eq {
                column: "is_promoted",
                value: json!(false)
            }]
        );
    }

    #[test]
    fn user_filter_maps_enum_values_to_column_strings() {
        let filter = UserFilter {
            query: None,
            user_type: Some(UserType::BusinessOwner),
            status: Some(UserStatus::Inactive),
        };

        let select = filter.to_select();
        assert_eq!(
            select.predicates,
            vec![
                Predicate::Eq {
                    column: "user_type",
                    value: json!("business_owner")
                },
                Predicate::Eq {
                    column: "status",
                    value: json!("inactive")
                },
            ]
        );
    }

    #[test]
    fn haversine_matches_known_distance() {
        // Tehran to Isfahan is roughly 340 km
        let distance = haversine_km((35.6892, 51.3890), (32.6539, 51.6660));
        assert!((distance - 338.0).abs() < 10.0, "got {distance}");
        assert_eq!(haversine_km((10.0, 10.0), (10.0, 10.0)), 0.0);
    }

    #[test]
    fn haversine_stays_finite_for_antipodal_points() {
        let distance = haversine_km((0.0, 0.0), (0.0, 180.0));
        assert!(distance.is_finite());
        assert!((distance - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }
}
