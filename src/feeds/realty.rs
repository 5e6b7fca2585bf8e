use crate::feeds::{Feed, Schema};
use crate::models::Source;
use crate::validation::decode;
use crate::validation::{Rule, RuleSet};
use serde::Deserialize;
use std::collections::HashSet;

const UNFINISHED: &str = "unfinished";
const OPEN_PLAN: &str = "1";
const REQUIRED_TAGS: [&str; 2] = ["plan", "floor-plan"];
const MIN_IMAGES: usize = 3;

pub type RealtyFeed = Feed<Offers>;

/// Yandex Realty feed (`<realty-feed>` root)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Offers {
    pub generation_date: String,
    #[serde(rename = "offer")]
    pub offers: Vec<Offer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Offer {
    #[serde(rename = "@internal-id")]
    pub internal_id: String,
    #[serde(rename = "image")]
    pub images: Vec<Image>,
    #[serde(rename = "type")]
    pub kind: String,
    pub property_type: String,
    pub category: String,
    pub url: String,
    pub window_view: String,
    pub ceiling_height: Vec<String>,
    pub description: String,
    pub creation_date: String,
    pub vas: Vec<Vas>,
    pub last_update_date: String,
    pub expire_date: String,
    pub location: Location,
    pub sales_agent: SalesAgent,
    pub price: Price,
    pub new_flat: String,
    pub deal_status: String,
    #[serde(deserialize_with = "decode::number")]
    pub built_year: i64,
    #[serde(deserialize_with = "decode::number")]
    pub ready_quarter: i64,
    pub area: Value,
    pub room_space: Vec<Value>,
    pub living_space: Value,
    pub kitchen_space: Value,
    pub renovation: String,
    #[serde(deserialize_with = "decode::number")]
    pub rooms: i64,
    pub rubbish_chute: String,
    #[serde(deserialize_with = "decode::number")]
    pub floors_total: i64,
    #[serde(deserialize_with = "decode::number")]
    pub floor: i64,
    pub building_name: String,
    pub building_type: String,
    pub mortgage: String,
    pub building_state: String,
    pub lift: String,
    pub bathroom_unit: String,
    #[serde(deserialize_with = "decode::number")]
    pub yandex_building_id: i64,
    /// `undefined` in the feed decodes to `None`
    #[serde(deserialize_with = "decode::optional_int")]
    pub yandex_house_id: Option<i64>,
    pub building_section: String,
    pub balcony: String,
    pub open_plan: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Image {
    #[serde(rename = "@tag")]
    pub tag: String,
    #[serde(rename = "$text")]
    pub url: String,
}

/// Paid placement option
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Vas {
    #[serde(rename = "$text")]
    pub text: String,
    #[serde(rename = "@start-time")]
    pub start_time: String,
    #[serde(rename = "@schedule")]
    pub schedule: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Location {
    pub country: String,
    pub region: String,
    pub address: String,
    pub locality_name: String,
    pub latitude: String,
    pub longitude: String,
    pub direction: String,
    pub distance: String,
    pub metro: Metro,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Metro {
    pub name: String,
    pub time_on_transport: String,
    pub time_on_foot: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SalesAgent {
    pub category: String,
    pub organization: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Price {
    #[serde(deserialize_with = "decode::number")]
    pub value: f32,
    pub currency: String,
}

/// Measured value with its unit, e.g. `<area><value>54</value><unit>кв. м</unit></area>`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Value {
    #[serde(deserialize_with = "decode::number")]
    pub value: f32,
    pub unit: String,
}

fn missing_tags(offer: &Offer) -> Vec<&'static str> {
    let tags: HashSet<&str> = offer.images.iter().map(|image| image.tag.as_str()).collect();
    REQUIRED_TAGS
        .into_iter()
        .filter(|tag| !tags.contains(tag))
        .collect()
}

static OFFER_RULES: RuleSet<Offer> = RuleSet {
    id: |o| o.internal_id.as_str(),
    rules: &[
        Rule::Cross(|o, scope| {
            o.internal_id
                .is_empty()
                .then(|| format!("field InternalID is empty. Position: {}", scope.index))
        }),
        Rule::Each(|o, scope| {
            missing_tags(o)
                .into_iter()
                .map(|tag| format!("tag '{tag}' for image is not found. {}", scope.locator))
                .collect()
        }),
        Rule::Present { path: "offer", field: "Type", value: |o| o.kind.as_str() },
        Rule::Present { path: "offer", field: "PropertyType", value: |o| o.property_type.as_str() },
        Rule::Present { path: "offer", field: "CreationDate", value: |o| o.creation_date.as_str() },
        Rule::Present { path: "offer.Location", field: "Country", value: |o| o.location.country.as_str() },
        Rule::Present { path: "offer.Location", field: "Address", value: |o| o.location.address.as_str() },
        Rule::Present { path: "offer.SalesAgent", field: "Phone", value: |o| o.sales_agent.phone.as_str() },
        Rule::Present {
            path: "offer.SalesAgent",
            field: "Category",
            value: |o| o.sales_agent.category.as_str(),
        },
        Rule::Present { path: "offer", field: "DealStatus", value: |o| o.deal_status.as_str() },
        Rule::NonZero { path: "offer.Price", field: "Value", value: |o| f64::from(o.price.value) },
        Rule::Present { path: "offer.Price", field: "Currency", value: |o| o.price.currency.as_str() },
        Rule::NonZero { path: "offer.Area", field: "Value", value: |o| f64::from(o.area.value) },
        Rule::Present { path: "offer.Area", field: "Unit", value: |o| o.area.unit.as_str() },
        Rule::NonZero { path: "offer", field: "Rooms", value: |o| o.rooms as f64 },
        Rule::Present { path: "offer", field: "NewFlat", value: |o| o.new_flat.as_str() },
        Rule::NonZero { path: "offer", field: "Floor", value: |o| o.floor as f64 },
        Rule::NonZero { path: "offer", field: "FloorsTotal", value: |o| o.floors_total as f64 },
        Rule::Present { path: "offer", field: "BuildingName", value: |o| o.building_name.as_str() },
        Rule::NonZero {
            path: "offer",
            field: "YandexBuildingID",
            value: |o| o.yandex_building_id as f64,
        },
        Rule::Present { path: "offer", field: "BuildingState", value: |o| o.building_state.as_str() },
        Rule::NonZero { path: "offer", field: "BuiltYear", value: |o| o.built_year as f64 },
        Rule::NonZero { path: "offer", field: "ReadyQuarter", value: |o| o.ready_quarter as f64 },
        Rule::Cross(|o, scope| {
            (o.living_space.value == 0.0 && o.open_plan != OPEN_PLAN)
                .then(|| format!("field LivingSpace.Value is empty. {}", scope.locator))
        }),
        Rule::Cross(|o, scope| {
            (o.built_year < i64::from(scope.year) && o.building_state == UNFINISHED).then(|| {
                format!("BuildingState == unfinished for {}. {}", o.built_year, scope.locator)
            })
        }),
        Rule::Cross(|o, scope| {
            (o.floor > o.floors_total)
                .then(|| format!("field Floor is bigger than FloorsTotal. {}", scope.locator))
        }),
        Rule::Cross(|o, scope| {
            let declared = i64::try_from(o.room_space.len()).unwrap_or(i64::MAX);
            (declared > o.rooms).then(|| {
                format!("field RoomSpace contains more values than Rooms. {}", scope.locator)
            })
        }),
        Rule::Cross(|o, scope| {
            let count = o.images.len();
            (count < MIN_IMAGES)
                .then(|| format!("field Image contains '{count}' items. {}", scope.locator))
        }),
    ],
};

impl Schema for Offers {
    const SOURCE: Source = Source::Realty;

    fn listing_count(&self) -> usize {
        self.offers.len()
    }

    fn diagnostics(&self, year: i32) -> Vec<String> {
        OFFER_RULES.apply(&self.offers, year)
    }

    fn generation_date(&self) -> Option<&str> {
        Some(&self.generation_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(tag: &str) -> Image {
        Image {
            tag: tag.to_string(),
            url: format!("https://img.example.com/{tag}.jpg"),
        }
    }

    fn complete_offer(id: &str) -> Offer {
        Offer {
            internal_id: id.to_string(),
            images: vec![image("plan"), image("floor-plan"), image("")],
            kind: "продажа".to_string(),
            property_type: "жилая".to_string(),
            creation_date: "2024-01-10T10:00:00+03:00".to_string(),
            location: Location {
                country: "Россия".to_string(),
                address: "ул. Лесная, 1".to_string(),
                ..Location::default()
            },
            sales_agent: SalesAgent {
                category: "developer".to_string(),
                phone: "+74950000000".to_string(),
                ..SalesAgent::default()
            },
            deal_status: "primary sale".to_string(),
            price: Price {
                value: 9_900_000.0,
                currency: "RUB".to_string(),
            },
            area: Value {
                value: 48.0,
                unit: "кв. м".to_string(),
            },
            living_space: Value {
                value: 26.0,
                unit: "кв. м".to_string(),
            },
            rooms: 2,
            new_flat: "да".to_string(),
            floor: 6,
            floors_total: 16,
            building_name: "ЖК Лесной".to_string(),
            yandex_building_id: 1_839_224,
            building_state: "hand-over".to_string(),
            built_year: 2023,
            ready_quarter: 3,
            ..Offer::default()
        }
    }

    fn offers(items: Vec<Offer>) -> Offers {
        Offers {
            generation_date: "2024-05-01T12:00:00+03:00".to_string(),
            offers: items,
        }
    }

    #[test]
    fn test_decode_offer() {
        let xml = r#"<realty-feed xmlns="http://webmaster.yandex.ru/schemas/feed/realty/2010-06">
          <generation-date>2024-05-01T12:00:00+03:00</generation-date>
          <offer internal-id="r-1">
            <type>продажа</type>
            <image tag="plan">https://img.example.com/plan.jpg</image>
            <location><country>Россия</country><metro><name>Сокол</name><time-on-foot>7</time-on-foot></metro></location>
            <image>https://img.example.com/1.jpg</image>
            <vas start-time="2024-05-01T10:00:00+03:00">premium</vas>
            <price><value>5500000</value><currency>RUB</currency></price>
            <room-space><value>12</value><unit>кв. м</unit></room-space>
            <room-space><value>14.5</value><unit>кв. м</unit></room-space>
            <rooms>2</rooms>
            <yandex-house-id>undefined</yandex-house-id>
            <open-plan>1</open-plan>
          </offer>
          <offer internal-id="r-2"><yandex-house-id>42</yandex-house-id></offer>
        </realty-feed>"#;

        let feed: Offers = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(feed.generation_date, "2024-05-01T12:00:00+03:00");
        assert_eq!(feed.offers.len(), 2);

        let offer = &feed.offers[0];
        assert_eq!(offer.internal_id, "r-1");
        assert_eq!(offer.kind, "продажа");
        assert_eq!(offer.images.len(), 2);
        assert_eq!(offer.images[0].tag, "plan");
        assert_eq!(offer.images[1].url, "https://img.example.com/1.jpg");
        assert_eq!(offer.location.metro.time_on_foot, "7");
        assert_eq!(offer.vas[0].text, "premium");
        assert_eq!(offer.price.value, 5_500_000.0);
        assert_eq!(offer.room_space.len(), 2);
        assert_eq!(offer.room_space[1].value, 14.5);
        assert_eq!(offer.yandex_house_id, None);
        assert_eq!(offer.open_plan, OPEN_PLAN);
        assert_eq!(feed.offers[1].yandex_house_id, Some(42));
    }

    #[test]
    fn test_decode_rejects_bad_house_id() {
        let xml = "<realty-feed><offer><yandex-house-id>n/a</yandex-house-id></offer></realty-feed>";
        assert!(quick_xml::de::from_str::<Offers>(xml).is_err());
    }

    #[test]
    fn test_complete_offer_has_no_findings() {
        assert!(offers(vec![complete_offer("r")]).diagnostics(2024).is_empty());
    }

    #[test]
    fn test_missing_image_tags() {
        let mut offer = complete_offer("r");
        offer.images = vec![image("plan"), image("plan"), image("plan"), image("plan")];
        assert_eq!(
            offers(vec![offer]).diagnostics(2024),
            vec!["tag 'floor-plan' for image is not found. InternalID: r"]
        );

        let mut bare = complete_offer("b");
        bare.images.clear();
        assert_eq!(
            offers(vec![bare]).diagnostics(2024),
            vec![
                "tag 'plan' for image is not found. InternalID: b",
                "tag 'floor-plan' for image is not found. InternalID: b",
                "field Image contains '0' items. InternalID: b",
            ]
        );
    }

    #[test]
    fn test_cross_field_rules() {
        let mut offer = complete_offer("x");
        offer.living_space.value = 0.0;
        offer.building_state = UNFINISHED.to_string();
        offer.built_year = 2022;
        offer.floor = 17;
        offer.room_space = vec![Value::default(); 3];

        assert_eq!(
            offers(vec![offer]).diagnostics(2024),
            vec![
                "field LivingSpace.Value is empty. InternalID: x",
                "BuildingState == unfinished for 2022. InternalID: x",
                "field Floor is bigger than FloorsTotal. InternalID: x",
                "field RoomSpace contains more values than Rooms. InternalID: x",
            ]
        );
    }

    #[test]
    fn test_each_required_field_is_reported() {
        let cases: &[(fn(&mut Offer), &[&str])] = &[
            (|o| o.internal_id.clear(), &["field InternalID is empty. Position: 0"]),
            (|o| o.kind.clear(), &["field offer.Type is empty. InternalID: r"]),
            (|o| o.property_type.clear(), &["field offer.PropertyType is empty. InternalID: r"]),
            (|o| o.creation_date.clear(), &["field offer.CreationDate is empty. InternalID: r"]),
            (
                |o| o.location.country.clear(),
                &["field offer.Location.Country is empty. InternalID: r"],
            ),
            (
                |o| o.location.address.clear(),
                &["field offer.Location.Address is empty. InternalID: r"],
            ),
            (
                |o| o.sales_agent.phone.clear(),
                &["field offer.SalesAgent.Phone is empty. InternalID: r"],
            ),
            (
                |o| o.sales_agent.category.clear(),
                &["field offer.SalesAgent.Category is empty. InternalID: r"],
            ),
            (|o| o.deal_status.clear(), &["field offer.DealStatus is empty. InternalID: r"]),
            (|o| o.price.value = 0.0, &["field offer.Price.Value is empty. InternalID: r"]),
            (|o| o.price.currency.clear(), &["field offer.Price.Currency is empty. InternalID: r"]),
            (|o| o.area.value = 0.0, &["field offer.Area.Value is empty. InternalID: r"]),
            (|o| o.area.unit.clear(), &["field offer.Area.Unit is empty. InternalID: r"]),
            (|o| o.rooms = 0, &["field offer.Rooms is empty. InternalID: r"]),
            (|o| o.new_flat.clear(), &["field offer.NewFlat is empty. InternalID: r"]),
            (|o| o.floor = 0, &["field offer.Floor is empty. InternalID: r"]),
            (
                |o| o.floors_total = 0,
                &[
                    "field offer.FloorsTotal is empty. InternalID: r",
                    "field Floor is bigger than FloorsTotal. InternalID: r",
                ],
            ),
            (|o| o.building_name.clear(), &["field offer.BuildingName is empty. InternalID: r"]),
            (
                |o| o.yandex_building_id = 0,
                &["field offer.YandexBuildingID is empty. InternalID: r"],
            ),
            (|o| o.building_state.clear(), &["field offer.BuildingState is empty. InternalID: r"]),
            (|o| o.built_year = 0, &["field offer.BuiltYear is empty. InternalID: r"]),
            (|o| o.ready_quarter = 0, &["field offer.ReadyQuarter is empty. InternalID: r"]),
            (|o| o.living_space.value = 0.0, &["field LivingSpace.Value is empty. InternalID: r"]),
        ];

        for (clear, expected) in cases {
            let mut offer = complete_offer("r");
            clear(&mut offer);
            assert_eq!(offers(vec![offer]).diagnostics(2024), *expected);
        }
    }

    #[test]
    fn test_open_plan_needs_no_living_space() {
        let mut offer = complete_offer("o");
        offer.living_space.value = 0.0;
        offer.open_plan = OPEN_PLAN.to_string();
        assert!(offers(vec![offer]).diagnostics(2024).is_empty());
    }

    #[test]
    fn test_missing_internal_id() {
        let mut offer = complete_offer("");
        offer.deal_status.clear();
        assert_eq!(
            offers(vec![complete_offer("a"), offer]).diagnostics(2024),
            vec![
                "field InternalID is empty. Position: 1",
                "field offer.DealStatus is empty. Position: 1",
            ]
        );
    }
}
