use serde_json::{json, Value};

use super::Row;

/// Id of the seeded administrator profile, usable as a development token
pub const SEED_ADMIN_ID: &str = "6a1f0c1e-2b7d-4d8e-9a51-0b7c3e1d2f01";

fn into_row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

/// Sample listings used by the in-memory store
pub fn sample_businesses() -> Vec<Row> {
    vec![
        json!({
            "id": "1",
            "name": "Toranj Restaurant",
            "category": "Restaurant & Cafe",
            "description": "Traditional Persian cuisine with kebabs, stews and fresh bread baked on site.",
            "address": "24 Valiasr Street, Tehran",
            "phone": "+98 21 8800 1234",
            "email": "info@toranj.example",
            "website": "https://toranj.example",
            "working_hours": "11:00 - 23:00",
            "services": ["Dine-in", "Takeaway", "Catering"],
            "images": [
                "https://images.example.com/toranj/hall.jpg",
                "https://images.example.com/toranj/kebab.jpg"
            ],
            "latitude": 35.7575,
            "longitude": 51.4098,
            "is_promoted": true,
            "status": "approved",
            "image": "https://images.example.com/toranj/hall.jpg",
            "rating": 4.7,
            "review_count": 128,
            "created_at": "2024-03-04T09:30:00Z",
            "updated_at": "2024-03-04T09:30:00Z"
        }),
        json!({
            "id": "2",
            "name": "Paradise Market",
            "category": "Shopping & Retail",
            "description": "Neighbourhood supermarket with fresh produce, dairy and household goods.",
            "address": "8 Enghelab Square, Tehran",
            "phone": "+98 21 6600 4321",
            "email": null,
            "website": null,
            "working_hours": "08:00 - 22:00",
            "services": ["Home delivery", "Card payment"],
            "images": ["https://images.example.com/paradise/front.jpg"],
            "latitude": 35.7010,
            "longitude": 51.3910,
            "is_promoted": false,
            "status": "approved",
            "image": "https://images.example.com/paradise/front.jpg",
            "rating": 4.2,
            "review_count": 56,
            "created_at": "2024-02-18T14:00:00Z",
            "updated_at": "2024-02-18T14:00:00Z"
        }),
        json!({
            "id": "3",
            "name": "Farah Restaurant",
            "category": "Restaurant & Cafe",
            "description": "Family restaurant serving rice dishes, grills and homemade desserts.",
            "address": "51 Shariati Street, Tehran",
            "phone": "+98 21 2200 7788",
            "email": "hello@farah.example",
            "website": null,
            "working_hours": "12:00 - 22:30",
            "services": ["Dine-in", "Family seating"],
            "images": ["https://images.example.com/farah/table.jpg"],
            "latitude": 35.7402,
            "longitude": 51.4445,
            "is_promoted": false,
            "status": "approved",
            "image": "https://images.example.com/farah/table.jpg",
            "rating": 4.5,
            "review_count": 73,
            "created_at": "2024-01-27T11:15:00Z",
            "updated_at": "2024-01-27T11:15:00Z"
        }),
        json!({
            "id": "4",
            "name": "Iraj Auto Repair",
            "category": "Automotive Services",
            "description": "Engine diagnostics, brake service and oil changes for all car makes.",
            "address": "102 Azadi Avenue, Tehran",
            "phone": "+98 21 6400 9090",
            "email": null,
            "website": "https://iraj-garage.example",
            "working_hours": "09:00 - 19:00",
            "services": ["Diagnostics", "Brake service", "Oil change"],
            "images": ["https://images.example.com/iraj/workshop.jpg"],
            "latitude": 35.6997,
            "longitude": 51.3380,
            "is_promoted": true,
            "status": "pending",
            "image": "https://images.example.com/iraj/workshop.jpg",
            "rating": 4.0,
            "review_count": 21,
            "created_at": "2024-01-10T08:45:00Z",
            "updated_at": "2024-01-10T08:45:00Z"
        }),
    ]
    .into_iter()
    .map(into_row)
    .collect()
}

/// Sample profiles used by the in-memory store
pub fn sample_profiles() -> Vec<Row> {
    vec![json!({
        "id": SEED_ADMIN_ID,
        "first_name": "Site",
        "last_name": "Administrator",
        "email": "admin@directory.example",
        "user_type": "admin",
        "status": "active",
        "national_id": null,
        "phone": null,
        "created_at": "2024-01-01T00:00:00Z"
    })]
    .into_iter()
    .map(into_row)
    .collect()
}
