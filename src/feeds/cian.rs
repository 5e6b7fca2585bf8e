use crate::feeds::{Feed, Schema};
use crate::models::Source;
use crate::validation::decode;
use crate::validation::{check_each_at, Rule, RuleSet};
use serde::Deserialize;

const MIN_PHOTOS: usize = 3;

pub type CianFeed = Feed<Objects>;

/// CIAN feed (`<feed>` root with `feed_version` and `object` items)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Objects {
    pub feed_version: String,
    #[serde(rename = "object")]
    pub objects: Vec<Object>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Object {
    pub external_id: String,
    pub description: String,
    pub address: String,
    pub coordinates: Coordinates,
    pub cadastral_number: String,
    pub phones: Phones,
    pub layout_photo: Photo,
    pub photos: Photos,
    pub category: String,
    pub room_type: String,
    #[serde(deserialize_with = "decode::number")]
    pub flat_rooms_count: i64,
    #[serde(deserialize_with = "decode::number")]
    pub total_area: f32,
    #[serde(deserialize_with = "decode::number")]
    pub living_area: f32,
    #[serde(deserialize_with = "decode::number")]
    pub kitchen_area: f32,
    pub project_declaration_url: String,
    #[serde(deserialize_with = "decode::number")]
    pub floor_number: i64,
    #[serde(deserialize_with = "decode::number")]
    pub combined_wcs_count: i64,
    pub building: Building,
    pub bargain_terms: BargainTerms,
    #[serde(rename = "JKSchema")]
    pub jk_schema: JkSchema,
    pub decoration: String,
    pub windows_view_type: String,
    #[serde(deserialize_with = "decode::number")]
    pub ceiling_height: f32,
    pub undergrounds: Undergrounds,
    #[serde(rename = "isApartments", deserialize_with = "decode::flag")]
    pub is_apartments: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Coordinates {
    #[serde(deserialize_with = "decode::number")]
    pub lat: f32,
    #[serde(deserialize_with = "decode::number")]
    pub lng: f32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Phones {
    pub phone_schema: PhoneSchema,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PhoneSchema {
    pub country_code: String,
    pub number: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Photos {
    pub photo_schema: Vec<Photo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Photo {
    pub full_url: String,
    #[serde(deserialize_with = "decode::flag")]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Building {
    #[serde(deserialize_with = "decode::number")]
    pub floors_count: i64,
    pub material_type: String,
    #[serde(deserialize_with = "decode::number")]
    pub passenger_lifts_count: i64,
    #[serde(deserialize_with = "decode::number")]
    pub cargo_lifts_count: i64,
    pub parking: Parking,
    pub deadline: Deadline,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Parking {
    #[serde(rename = "Type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Deadline {
    pub quarter: String,
    #[serde(deserialize_with = "decode::number")]
    pub year: i64,
    #[serde(deserialize_with = "decode::flag")]
    pub is_complete: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct BargainTerms {
    /// Written with a decimal comma, e.g. `7500000,00`
    #[serde(deserialize_with = "decode::locale_float")]
    pub price: f64,
    pub currency: String,
    #[serde(deserialize_with = "decode::flag")]
    pub mortgage_allowed: bool,
    pub sale_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct JkSchema {
    #[serde(deserialize_with = "decode::number")]
    pub id: i64,
    pub name: String,
    pub house: JkHouse,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct JkHouse {
    #[serde(deserialize_with = "decode::number")]
    pub id: i64,
    pub name: String,
    pub flat: JkFlat,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct JkFlat {
    pub flat_number: String,
    pub section_number: String,
    pub flat_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Undergrounds {
    pub underground_info_schema: Vec<Underground>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Underground {
    pub transport_type: String,
    #[serde(deserialize_with = "decode::number")]
    pub time: i64,
    #[serde(deserialize_with = "decode::number")]
    pub id: i64,
}

/// Findings name the element that is actually checked: `object.LayoutPhoto.FullUrl`
/// and `object.BargainTerms.Price`, not `...FullUrl.IsDefault` or `...Price.Price`.
/// Areas and prices are zero-checked as decoded decimals, so `0.4` is not empty.
static OBJECT_RULES: RuleSet<Object> = RuleSet {
    id: |object| object.external_id.as_str(),
    rules: &[
        Rule::Cross(|object, scope| {
            object
                .external_id
                .is_empty()
                .then(|| format!("field ExternalId is empty. Position: {}", scope.index))
        }),
        Rule::Present { path: "object", field: "Address", value: |o| o.address.as_str() },
        Rule::Present {
            path: "object.Phones.PhoneSchema",
            field: "CountryCode",
            value: |o| o.phones.phone_schema.country_code.as_str(),
        },
        Rule::Present {
            path: "object.Phones.PhoneSchema",
            field: "Number",
            value: |o| o.phones.phone_schema.number.as_str(),
        },
        Rule::Present {
            path: "object.LayoutPhoto",
            field: "FullUrl",
            value: |o| o.layout_photo.full_url.as_str(),
        },
        Rule::Present { path: "object", field: "Category", value: |o| o.category.as_str() },
        Rule::Each(|o, _| {
            check_each_at(
                "object.Photos.PhotoSchema",
                "FullUrl",
                o.photos.photo_schema.iter().map(|photo| photo.full_url.as_str()),
            )
        }),
        Rule::NonZero { path: "object", field: "FlatRoomsCount", value: |o| o.flat_rooms_count as f64 },
        Rule::NonZero { path: "object", field: "TotalArea", value: |o| f64::from(o.total_area) },
        Rule::NonZero { path: "object", field: "FloorNumber", value: |o| o.floor_number as f64 },
        Rule::NonZero {
            path: "object.Building",
            field: "FloorsCount",
            value: |o| o.building.floors_count as f64,
        },
        Rule::NonZero {
            path: "object.Building.Deadline",
            field: "Year",
            value: |o| o.building.deadline.year as f64,
        },
        Rule::Present {
            path: "object.Building.Deadline",
            field: "Quarter",
            value: |o| o.building.deadline.quarter.as_str(),
        },
        Rule::NonZero { path: "object.BargainTerms", field: "Price", value: |o| o.bargain_terms.price },
        Rule::NonZero { path: "object.JKSchema", field: "Id", value: |o| o.jk_schema.id as f64 },
        Rule::Present { path: "object.JKSchema", field: "Name", value: |o| o.jk_schema.name.as_str() },
        Rule::NonZero {
            path: "object.JKSchema.House",
            field: "Id",
            value: |o| o.jk_schema.house.id as f64,
        },
        Rule::Present {
            path: "object.JKSchema.House",
            field: "Name",
            value: |o| o.jk_schema.house.name.as_str(),
        },
        Rule::Cross(|o, scope| {
            let deadline = &o.building.deadline;
            (deadline.year < i64::from(scope.year) && !deadline.is_complete).then(|| {
                format!(
                    "field Building.Deadline is False for {}. {}",
                    deadline.year, scope.locator
                )
            })
        }),
        Rule::Cross(|o, scope| {
            (o.floor_number > o.building.floors_count).then(|| {
                format!(
                    "field FloorNumber is greater than Building.FloorsCount. {}",
                    scope.locator
                )
            })
        }),
        Rule::Cross(|o, scope| {
            let count = o.photos.photo_schema.len();
            (count < MIN_PHOTOS).then(|| {
                format!("field Photos.PhotoSchema contains '{count}' items. {}", scope.locator)
            })
        }),
    ],
};

impl Schema for Objects {
    const SOURCE: Source = Source::Cian;

    fn listing_count(&self) -> usize {
        self.objects.len()
    }

    fn diagnostics(&self, year: i32) -> Vec<String> {
        OBJECT_RULES.apply(&self.objects, year)
    }
}
