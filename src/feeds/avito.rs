use crate::error::FeedError;
use crate::feeds::{Feed, Schema};
use crate::models::Source;
use crate::transport::Transport;
use crate::validation::decode;
use crate::validation::{check_each_at, Rule, RuleSet};
use serde::Deserialize;
use tracing::info;

/// Avito catalogue of new developments, referenced by `Ad.NewDevelopmentId`.
pub const DEVELOPMENTS_URL: &str = "https://autoload.avito.ru/format/New_developments.xml";

const STUDIO: &str = "Студия";
const MIN_IMAGES: usize = 3;
const MAX_IMAGES: usize = 40;

pub type AvitoFeed = Feed<Ads>;

/// Avito autoload feed (`<Ads>` root)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Ads {
    #[serde(rename = "@formatVersion", deserialize_with = "decode::number")]
    pub format_version: i64,
    #[serde(rename = "@target")]
    pub target: String,
    #[serde(rename = "Ad")]
    pub ads: Vec<Ad>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Ad {
    pub id: String,
    pub ad_status: String,
    pub allow_email: String,
    pub contact_phone: String,
    pub latitude: String,
    pub longitude: String,
    pub description: String,
    pub category: String,
    pub operation_type: String,
    #[serde(deserialize_with = "decode::number")]
    pub price: i64,
    pub rooms: String,
    #[serde(deserialize_with = "decode::number")]
    pub square: f32,
    pub balcony_or_loggia: String,
    #[serde(deserialize_with = "decode::number")]
    pub kitchen_space: f32,
    pub view_from_windows: String,
    pub ceiling_height: String,
    #[serde(deserialize_with = "decode::number")]
    pub living_space: f32,
    pub decoration: String,
    pub deal_type: String,
    pub room_type: RoomType,
    pub status: String,
    #[serde(deserialize_with = "decode::number")]
    pub floor: i64,
    #[serde(deserialize_with = "decode::number")]
    pub floors: i64,
    pub house_type: String,
    pub market_type: String,
    pub property_rights: String,
    pub new_development_id: String,
    pub images: Images,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RoomType {
    #[serde(rename = "Option")]
    pub option: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Images {
    #[serde(rename = "Image")]
    pub image: Vec<Image>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Image {
    #[serde(rename = "@url")]
    pub url: String,
}

static AD_RULES: RuleSet<Ad> = RuleSet {
    id: |ad| ad.id.as_str(),
    rules: &[
        Rule::PresentAt { path: "Ad", field: "ID", value: |ad| ad.id.as_str() },
        Rule::Present { path: "Ad", field: "ContactPhone", value: |ad| ad.contact_phone.as_str() },
        Rule::Present { path: "Ad", field: "Description", value: |ad| ad.description.as_str() },
        Rule::Present { path: "Ad", field: "Category", value: |ad| ad.category.as_str() },
        Rule::NonZero { path: "Ad", field: "Price", value: |ad| ad.price as f64 },
        Rule::Present { path: "Ad", field: "OperationType", value: |ad| ad.operation_type.as_str() },
        Rule::Present { path: "Ad", field: "MarketType", value: |ad| ad.market_type.as_str() },
        Rule::Present { path: "Ad", field: "HouseType", value: |ad| ad.house_type.as_str() },
        Rule::NonZero { path: "Ad", field: "Floor", value: |ad| ad.floor as f64 },
        Rule::NonZero { path: "Ad", field: "Floors", value: |ad| ad.floors as f64 },
        Rule::Present { path: "Ad", field: "Rooms", value: |ad| ad.rooms.as_str() },
        Rule::NonZero { path: "Ad", field: "Square", value: |ad| f64::from(ad.square) },
        Rule::Cross(|ad, scope| {
            (ad.living_space == 0.0 && ad.rooms != STUDIO)
                .then(|| format!("field LivingSpace is empty. {}", scope.locator))
        }),
        Rule::Present { path: "Ad", field: "Status", value: |ad| ad.status.as_str() },
        Rule::Present { path: "Ad", field: "NewDevelopmentId", value: |ad| ad.new_development_id.as_str() },
        Rule::Present { path: "Ad", field: "PropertyRights", value: |ad| ad.property_rights.as_str() },
        Rule::Present { path: "Ad", field: "Decoration", value: |ad| ad.decoration.as_str() },
        Rule::Cross(|ad, scope| {
            (ad.floor > ad.floors)
                .then(|| format!("field Floor is bigger than Floors. {}", scope.locator))
        }),
        Rule::Each(|ad, _| {
            check_each_at(
                "Images.Image",
                "URL",
                ad.images.image.iter().map(|image| image.url.as_str()),
            )
        }),
        Rule::Cross(|ad, scope| {
            let count = ad.images.image.len();
            (!(MIN_IMAGES..=MAX_IMAGES).contains(&count)).then(|| {
                format!("field Images.Image contains '{count}' items. {}", scope.locator)
            })
        }),
    ],
};

impl Schema for Ads {
    const SOURCE: Source = Source::Avito;

    fn listing_count(&self) -> usize {
        self.ads.len()
    }

    fn diagnostics(&self, year: i32) -> Vec<String> {
        AD_RULES.apply(&self.ads, year)
    }
}

impl Ads {
    /// Development ids referenced by ads but missing from `catalogue`.
    pub fn unknown_developments<'a>(&'a self, catalogue: &Developments) -> Vec<&'a str> {
        self.ads
            .iter()
            .map(|ad| ad.new_development_id.as_str())
            .filter(|id| !id.is_empty() && catalogue.find(id).is_none())
            .collect()
    }
}

/// Avito new-developments catalogue (`<Developments>` root)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Developments {
    #[serde(rename = "Region")]
    pub regions: Vec<Region>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Region {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "City")]
    pub cities: Vec<City>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct City {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "Object")]
    pub objects: Vec<Development>,
}

/// Residential complex
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Development {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@address")]
    pub address: String,
    #[serde(rename = "@developer")]
    pub developer: String,
    #[serde(rename = "Housing")]
    pub housing: Vec<House>,
}

/// Building inside a residential complex
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct House {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@address")]
    pub address: String,
}

/// Catalogue entry matched by id
#[derive(Debug, Clone, Copy)]
pub enum DevelopmentRef<'a> {
    Object(&'a Development),
    House(&'a Development, &'a House),
}

impl Developments {
    pub fn objects(&self) -> impl Iterator<Item = &Development> {
        self.regions
            .iter()
            .flat_map(|region| &region.cities)
            .flat_map(|city| &city.objects)
    }

    /// Find a complex or one of its buildings by id.
    pub fn find(&self, id: &str) -> Option<DevelopmentRef<'_>> {
        self.objects().find_map(|object| {
            if object.id == id {
                return Some(DevelopmentRef::Object(object));
            }
            object
                .housing
                .iter()
                .find(|house| house.id == id)
                .map(|house| DevelopmentRef::House(object, house))
        })
    }
}

/// Download and decode the new-developments catalogue.
pub async fn fetch_developments(transport: &dyn Transport) -> Result<Developments, FeedError> {
    let payload = transport
        .fetch_body(DEVELOPMENTS_URL)
        .await
        .map_err(|err| FeedError::Data(Box::new(err)))?;
    let developments: Developments = quick_xml::de::from_reader(payload.body.as_slice())?;

    info!(
        "Loaded {} developments from the Avito catalogue",
        developments.objects().count()
    );

    Ok(developments)
}

impl Feed<Ads> {
    /// Fetch the catalogue the ads' `NewDevelopmentId` values refer to.
    pub async fn developments(&self) -> Result<Developments, FeedError> {
        fetch_developments(self.transport()).await
    }
}
