//! Presence and sanity checks shared by all platform feeds.
//!
//! Every check yields zero or one finding. Platforms describe their listings
//! as an ordered [`RuleSet`], which is applied listing by listing.

pub mod decode;

use std::fmt;

pub const MSG_EMPTY_FEED: &str = "feed is empty";

/// Feeds with at most this many listings are reported as too small.
pub const MIN_LISTINGS: usize = 10;

/// How a finding points back at its listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator<'a> {
    Id(&'a str),
    Position(usize),
}

impl<'a> Locator<'a> {
    /// Falls back to the position when the listing has no identifier.
    pub fn new(id: &'a str, position: usize) -> Self {
        if id.is_empty() {
            Self::Position(position)
        } else {
            Self::Id(id)
        }
    }
}

impl fmt::Display for Locator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "InternalID: {id}"),
            Self::Position(idx) => write!(f, "Position: {idx}"),
        }
    }
}

/// Numeric field types that can be tested for an unset (zero) value.
pub trait IsZero: Copy {
    fn is_zero(self) -> bool;
}

macro_rules! impl_is_zero {
    ($($t:ty => $zero:expr),*) => {
        $(impl IsZero for $t {
            fn is_zero(self) -> bool {
                self == $zero
            }
        })*
    };
}

impl_is_zero!(i32 => 0, i64 => 0, f32 => 0.0, f64 => 0.0);

pub fn check_string(path: &str, field: &str, value: &str) -> Option<String> {
    value
        .is_empty()
        .then(|| format!("field {path}.{field} is empty"))
}

pub fn check_string_at(idx: usize, path: &str, field: &str, value: &str) -> Option<String> {
    value
        .is_empty()
        .then(|| format!("field {path}[{idx}].{field} is empty"))
}

pub fn check_string_with_id(
    locator: Locator<'_>,
    path: &str,
    field: &str,
    value: &str,
) -> Option<String> {
    value
        .is_empty()
        .then(|| format!("field {path}.{field} is empty. {locator}"))
}

pub fn check_zero_with_id<V: IsZero>(
    locator: Locator<'_>,
    path: &str,
    field: &str,
    value: V,
) -> Option<String> {
    value
        .is_zero()
        .then(|| format!("field {path}.{field} is empty. {locator}"))
}

/// Size gate run before any per-listing check.
///
/// Returns the single finding that replaces the whole pass, if any.
pub fn gate(count: usize) -> Option<String> {
    match count {
        0 | 1 => Some(MSG_EMPTY_FEED.to_string()),
        n if n <= MIN_LISTINGS => Some(format!("feed contains only {n} items")),
        _ => None,
    }
}

/// Where in the feed a listing is being checked.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub index: usize,
    pub locator: Locator<'a>,
    /// Calendar year the "in the past" rules compare against.
    pub year: i32,
}

/// One entry of a platform rule table.
pub enum Rule<T> {
    /// String must be set; the finding has no locator (singleton records).
    Required {
        path: &'static str,
        field: &'static str,
        value: fn(&T) -> &str,
    },
    /// String must be set; the finding names the listing.
    Present {
        path: &'static str,
        field: &'static str,
        value: fn(&T) -> &str,
    },
    /// String must be set; the finding names the listing position.
    PresentAt {
        path: &'static str,
        field: &'static str,
        value: fn(&T) -> &str,
    },
    /// Number must be non-zero.
    NonZero {
        path: &'static str,
        field: &'static str,
        value: fn(&T) -> f64,
    },
    /// Cross-field rule yielding at most one finding.
    Cross(fn(&T, &Scope<'_>) -> Option<String>),
    /// Rule over a nested collection, yielding any number of findings.
    Each(fn(&T, &Scope<'_>) -> Vec<String>),
}

impl<T> Rule<T> {
    fn apply(&self, item: &T, scope: &Scope<'_>, out: &mut Vec<String>) {
        match self {
            Self::Required { path, field, value } => {
                out.extend(check_string(path, field, value(item)));
            }
            Self::Present { path, field, value } => {
                out.extend(check_string_with_id(scope.locator, path, field, value(item)));
            }
            Self::PresentAt { path, field, value } => {
                out.extend(check_string_at(scope.index, path, field, value(item)));
            }
            Self::NonZero { path, field, value } => {
                out.extend(check_zero_with_id(scope.locator, path, field, value(item)));
            }
            Self::Cross(rule) => out.extend(rule(item, scope)),
            Self::Each(rule) => out.extend(rule(item, scope)),
        }
    }
}

/// Ordered rule table for one kind of record.
pub struct RuleSet<T: 'static> {
    /// Identifier used in findings; empty means "no identifier".
    pub id: fn(&T) -> &str,
    pub rules: &'static [Rule<T>],
}

impl<T> RuleSet<T> {
    /// Run every rule against one record, in table order.
    pub fn apply_one(&self, item: &T, index: usize, year: i32) -> Vec<String> {
        let scope = Scope {
            index,
            locator: Locator::new((self.id)(item), index),
            year,
        };

        let mut out = Vec::new();
        for rule in self.rules {
            rule.apply(item, &scope, &mut out);
        }
        out
    }

    /// Run the table over every record, keeping record order.
    pub fn apply(&self, items: &[T], year: i32) -> Vec<String> {
        items
            .iter()
            .enumerate()
            .flat_map(|(idx, item)| self.apply_one(item, idx, year))
            .collect()
    }
}

/// Positional presence check over a nested collection.
pub fn check_each_at<'a, I>(path: &str, field: &str, values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| check_string_at(idx, path, field, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lot {
        id: String,
        name: String,
        price: i64,
        floor: i64,
        floors: i64,
    }

    fn lot(id: &str, name: &str, price: i64) -> Lot {
        Lot {
            id: id.to_string(),
            name: name.to_string(),
            price,
            floor: 1,
            floors: 5,
        }
    }

    static LOT_RULES: RuleSet<Lot> = RuleSet {
        id: |lot| lot.id.as_str(),
        rules: &[
            Rule::PresentAt {
                path: "lot",
                field: "ID",
                value: |lot| lot.id.as_str(),
            },
            Rule::Present {
                path: "lot",
                field: "Name",
                value: |lot| lot.name.as_str(),
            },
            Rule::NonZero {
                path: "lot",
                field: "Price",
                value: |lot| lot.price as f64,
            },
            Rule::Cross(|lot, scope| {
                (lot.floor > lot.floors)
                    .then(|| format!("field Floor is bigger than Floors. {}", scope.locator))
            }),
        ],
    };

    #[test]
    fn test_string_checks() {
        assert_eq!(check_string("Complex", "ID", "x"), None);
        assert_eq!(
            check_string("Complex", "ID", ""),
            Some("field Complex.ID is empty".to_string())
        );
        assert_eq!(
            check_string_at(3, "Images.Image", "URL", ""),
            Some("field Images.Image[3].URL is empty".to_string())
        );
        assert_eq!(
            check_string_with_id(Locator::Id("a-1"), "Ad", "Category", ""),
            Some("field Ad.Category is empty. InternalID: a-1".to_string())
        );
        assert_eq!(
            check_string_with_id(Locator::new("", 7), "Ad", "Category", ""),
            Some("field Ad.Category is empty. Position: 7".to_string())
        );
    }

    #[test]
    fn test_zero_checks() {
        let loc = Locator::Id("42");
        assert_eq!(
            check_zero_with_id(loc, "Ad", "Price", 0_i64),
            Some("field Ad.Price is empty. InternalID: 42".to_string())
        );
        assert_eq!(check_zero_with_id(loc, "Ad", "Price", 1_i64), None);
        assert!(check_zero_with_id(loc, "Ad", "Square", 0.0_f32).is_some());
        assert!(check_zero_with_id(loc, "Ad", "Square", 0.5_f64).is_none());
        assert!(check_zero_with_id(loc, "Ad", "Rooms", 0_i32).is_some());
    }

    #[test]
    fn test_gate() {
        assert_eq!(gate(0), Some(MSG_EMPTY_FEED.to_string()));
        assert_eq!(gate(1), Some(MSG_EMPTY_FEED.to_string()));
        assert_eq!(gate(2), Some("feed contains only 2 items".to_string()));
        assert_eq!(gate(10), Some("feed contains only 10 items".to_string()));
        assert_eq!(gate(11), None);
    }

    #[test]
    fn test_rule_set_keeps_listing_then_rule_order() {
        let mut broken = lot("b", "", 0);
        broken.floor = 9;
        let lots = vec![lot("a", "ok", 10), broken, lot("", "anon", 5)];

        let findings = LOT_RULES.apply(&lots, 2024);
        assert_eq!(
            findings,
            vec![
                "field lot.Name is empty. InternalID: b",
                "field lot.Price is empty. InternalID: b",
                "field Floor is bigger than Floors. InternalID: b",
                "field lot[2].ID is empty",
            ]
        );
    }

    #[test]
    fn test_rule_set_is_repeatable() {
        let lots = vec![lot("", "", 0), lot("x", "", 0)];
        assert_eq!(LOT_RULES.apply(&lots, 2024), LOT_RULES.apply(&lots, 2024));
    }

    #[test]
    fn test_check_each_at() {
        let urls = ["a", "", "c", ""];
        assert_eq!(
            check_each_at("Photos", "FullUrl", urls),
            vec![
                "field Photos[1].FullUrl is empty",
                "field Photos[3].FullUrl is empty"
            ]
        );
    }
}
