use crate::feeds::{Feed, Schema};
use crate::models::Source;
use crate::validation::decode;
use crate::validation::{check_each_at, check_string_at, check_zero_with_id, Locator, Rule, RuleSet};
use serde::Deserialize;

const UNFINISHED: &str = "unfinished";
const BUILDING_PATH: &str = "Complex.Buildings.Building";
const FLAT_PATH: &str = "Flats.Flat";

pub type DomClickFeed = Feed<Complexes>;

/// DomClick feed: a single residential complex (`<complexes><complex>`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Complexes {
    pub complex: Complex,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Complex {
    pub id: String,
    pub name: String,
    pub latitude: String,
    pub longitude: String,
    pub address: String,
    pub images: Images,
    pub description_main: Description,
    pub infrastructure: Infrastructure,
    pub profits_main: ProfitsMain,
    pub profits_secondary: ProfitsSecondary,
    pub buildings: Buildings,
    pub sales_info: SalesInfo,
    pub developer: Developer,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Images {
    pub image: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Description {
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Infrastructure {
    pub parking: String,
    pub security: String,
    pub fenced_area: String,
    pub sports_ground: String,
    pub playground: String,
    pub school: String,
    pub kindergarten: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfitsMain {
    pub profit_main: Vec<Profit>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfitsSecondary {
    pub profit_secondary: Vec<Profit>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Profit {
    pub title: String,
    pub text: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Buildings {
    pub building: Vec<Building>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Building {
    pub id: String,
    pub fz_214: String,
    pub name: String,
    #[serde(deserialize_with = "decode::number")]
    pub floors: i64,
    pub building_state: String,
    #[serde(deserialize_with = "decode::number")]
    pub built_year: i64,
    #[serde(deserialize_with = "decode::number")]
    pub ready_quarter: i64,
    pub building_type: String,
    pub image: String,
    pub flats: Flats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Flats {
    pub flat: Vec<Flat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Flat {
    pub flat_id: String,
    pub apartment: String,
    #[serde(deserialize_with = "decode::number")]
    pub floor: i64,
    /// `None` when the element is missing; studios still carry `<room>0</room>`.
    #[serde(deserialize_with = "decode::optional_number")]
    pub room: Option<i64>,
    pub plan: String,
    pub balcony: String,
    pub renovation: String,
    #[serde(deserialize_with = "decode::number")]
    pub price: f32,
    #[serde(deserialize_with = "decode::number")]
    pub area: f32,
    #[serde(deserialize_with = "decode::number")]
    pub living_area: f32,
    #[serde(deserialize_with = "decode::number")]
    pub kitchen_area: f32,
    pub rooms_area: RoomsArea,
    pub bathroom: String,
    pub housing_type: String,
    #[serde(deserialize_with = "decode::number")]
    pub decoration: i64,
    pub ready_housing: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RoomsArea {
    pub area: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SalesInfo {
    pub sales_phone: String,
    pub responsible_officer_phone: String,
    pub sales_address: String,
    pub sales_latitude: String,
    pub sales_longitude: String,
    pub timezone: String,
    pub work_days: WorkDays,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkDays {
    pub work_day: Vec<WorkDay>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkDay {
    pub day: String,
    pub open_at: String,
    pub close_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Developer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub site: String,
    pub logo: String,
}

/// Complex-wide checks that run before the buildings.
static COMPLEX_HEAD: RuleSet<Complex> = RuleSet {
    id: |c| c.id.as_str(),
    rules: &[
        Rule::Required { path: "Complex", field: "ID", value: |c| c.id.as_str() },
        Rule::Required { path: "Complex", field: "Name", value: |c| c.name.as_str() },
        Rule::Required { path: "Complex", field: "Address", value: |c| c.address.as_str() },
        Rule::Required { path: "Complex", field: "Latitude", value: |c| c.latitude.as_str() },
        Rule::Required { path: "Complex", field: "Longitude", value: |c| c.longitude.as_str() },
        Rule::Each(|c, _| {
            check_each_at(
                "Complex.Images.Image",
                "Image",
                c.images.image.iter().map(String::as_str),
            )
        }),
        Rule::Required {
            path: "Complex.DescriptionMain",
            field: "Title",
            value: |c| c.description_main.title.as_str(),
        },
        Rule::Required {
            path: "Complex.DescriptionMain",
            field: "Text",
            value: |c| c.description_main.text.as_str(),
        },
        Rule::Each(|c, _| {
            let path = "Complex.ProfitsMain.ProfitMain";
            c.profits_main
                .profit_main
                .iter()
                .enumerate()
                .flat_map(|(idx, profit)| {
                    [
                        check_string_at(idx, path, "Title", &profit.title),
                        check_string_at(idx, path, "Text", &profit.text),
                        check_string_at(idx, path, "Image", &profit.image),
                    ]
                })
                .flatten()
                .collect()
        }),
    ],
};

/// Complex-wide checks that run after the buildings.
static COMPLEX_TAIL: RuleSet<Complex> = RuleSet {
    id: |c| c.id.as_str(),
    rules: &[
        Rule::Required {
            path: "Complex.SalesInfo",
            field: "SalesPhone",
            value: |c| c.sales_info.sales_phone.as_str(),
        },
        Rule::Required {
            path: "Complex.SalesInfo",
            field: "SalesAddress",
            value: |c| c.sales_info.sales_address.as_str(),
        },
        Rule::Required {
            path: "Complex.SalesInfo",
            field: "SalesLatitude",
            value: |c| c.sales_info.sales_latitude.as_str(),
        },
        Rule::Required {
            path: "Complex.SalesInfo",
            field: "SalesLongitude",
            value: |c| c.sales_info.sales_longitude.as_str(),
        },
        Rule::Required { path: "Complex.Developer", field: "Name", value: |c| c.developer.name.as_str() },
        Rule::Required { path: "Complex.Developer", field: "Phone", value: |c| c.developer.phone.as_str() },
        Rule::Required { path: "Complex.Developer", field: "Site", value: |c| c.developer.site.as_str() },
        Rule::Required { path: "Complex.Developer", field: "Logo", value: |c| c.developer.logo.as_str() },
    ],
};

static BUILDING_RULES: RuleSet<Building> = RuleSet {
    id: |b| b.id.as_str(),
    rules: &[
        Rule::PresentAt { path: BUILDING_PATH, field: "ID", value: |b| b.id.as_str() },
        Rule::Present { path: BUILDING_PATH, field: "Fz214", value: |b| b.fz_214.as_str() },
        Rule::Present { path: BUILDING_PATH, field: "Name", value: |b| b.name.as_str() },
        Rule::NonZero { path: BUILDING_PATH, field: "Floors", value: |b| b.floors as f64 },
        Rule::Present { path: BUILDING_PATH, field: "BuildingState", value: |b| b.building_state.as_str() },
        Rule::NonZero { path: BUILDING_PATH, field: "BuiltYear", value: |b| b.built_year as f64 },
        Rule::NonZero { path: BUILDING_PATH, field: "ReadyQuarter", value: |b| b.ready_quarter as f64 },
        Rule::Present { path: BUILDING_PATH, field: "BuildingType", value: |b| b.building_type.as_str() },
        Rule::Cross(|b, scope| {
            (b.built_year < i64::from(scope.year) && b.building_state == UNFINISHED).then(|| {
                format!("BuildingState == unfinished for {}. {}", b.built_year, scope.locator)
            })
        }),
    ],
};

static FLAT_RULES: RuleSet<Flat> = RuleSet {
    id: |f| f.flat_id.as_str(),
    rules: &[
        Rule::PresentAt { path: FLAT_PATH, field: "FlatID", value: |f| f.flat_id.as_str() },
        Rule::NonZero { path: FLAT_PATH, field: "Floor", value: |f| f.floor as f64 },
        Rule::Cross(|f, scope| {
            f.room
                .is_none()
                .then(|| format!("Field Flats.Room is empty. {}", scope.locator))
        }),
        Rule::Present { path: FLAT_PATH, field: "Plan", value: |f| f.plan.as_str() },
        Rule::Present { path: FLAT_PATH, field: "Balcony", value: |f| f.balcony.as_str() },
        Rule::NonZero { path: FLAT_PATH, field: "Price", value: |f| f64::from(f.price) },
        Rule::NonZero { path: FLAT_PATH, field: "Area", value: |f| f64::from(f.area) },
        // A flat without living area must at least list its room areas.
        Rule::Each(|f, scope| {
            let Some(missing) = check_zero_with_id(scope.locator, FLAT_PATH, "LivingArea", f.living_area)
            else {
                return Vec::new();
            };

            let rooms = f.rooms_area.area.iter().enumerate().filter(|(_, area)| area.is_empty());
            std::iter::once(missing)
                .chain(rooms.map(|(idx, _)| {
                    format!(
                        "Field Flats.Flat.RoomsArea.Area[{idx}] is empty. {}",
                        scope.locator
                    )
                }))
                .collect()
        }),
        Rule::NonZero { path: FLAT_PATH, field: "KitchenArea", value: |f| f64::from(f.kitchen_area) },
        Rule::Present { path: FLAT_PATH, field: "Bathroom", value: |f| f.bathroom.as_str() },
    ],
};

impl Complex {
    pub fn flats(&self) -> impl Iterator<Item = &Flat> {
        self.buildings
            .building
            .iter()
            .flat_map(|building| &building.flats.flat)
    }
}

impl Schema for Complexes {
    const SOURCE: Source = Source::DomClick;

    fn listing_count(&self) -> usize {
        self.complex.flats().count()
    }

    fn diagnostics(&self, year: i32) -> Vec<String> {
        let complex = &self.complex;
        let mut findings = COMPLEX_HEAD.apply_one(complex, 0, year);

        for (pos, building) in complex.buildings.building.iter().enumerate() {
            findings.extend(BUILDING_RULES.apply_one(building, pos, year));

            for (idx, flat) in building.flats.flat.iter().enumerate() {
                findings.extend(FLAT_RULES.apply_one(flat, idx, year));

                if flat.floor > building.floors {
                    findings.push(format!(
                        "Field Flats.Flat.Floor is bigger than building.Floors. {}",
                        Locator::new(&flat.flat_id, idx)
                    ));
                }
            }
        }

        findings.extend(COMPLEX_TAIL.apply_one(complex, 0, year));
        findings
    }
}
