//! Page request parameter accepted by list-style methods.
//!
//! Decoding is lenient: numbers may arrive as JSON numbers or numeric strings, absent
//! fields take defaults and the page size is capped.
//!
//! ```json
//! {"page": 0, "size": 20, "sort": [{"property": "name", "direction": "DESC"}]}
//! ```

use crate::params::Params;
use schemars::JsonSchema;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 2000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.eq_ignore_ascii_case("asc") {
            Ok(Direction::Asc)
        } else if raw.eq_ignore_ascii_case("desc") {
            Ok(Direction::Desc)
        } else {
            Err(format!("invalid sort direction '{}'", raw))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct SortOrder {
    pub property: String,
    pub direction: Direction,
}

impl SortOrder {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[schemars(default)]
pub struct Pageable {
    pub page: u32,
    #[schemars(range(max = 2000))]
    pub size: u32,
    pub sort: Vec<SortOrder>,
}

impl Default for Pageable {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: Vec::new(),
        }
    }
}

impl Pageable {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: clamp_size(size),
            sort: Vec::new(),
        }
    }

    pub fn with_sort(mut self, order: SortOrder) -> Self {
        self.sort.push(order);
        self
    }

    /// Index of the first element of the page
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        let Value::Object(object) = value else {
            return Err("pageable must be a JSON object".to_string());
        };

        let page = read_number(&object, "page")?.unwrap_or(0);
        let size = read_number(&object, "size")?
            .map(clamp_size)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let sort = match object.get("sort") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => read_sort(entries)?,
            Some(_) => return Err("sort must be an array".to_string()),
        };

        Ok(Self { page, size, sort })
    }
}

fn clamp_size(size: u32) -> u32 {
    if size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        size.min(MAX_PAGE_SIZE)
    }
}

fn read_number(object: &Map<String, Value>, field: &str) -> Result<Option<u32>, String> {
    let invalid = || format!("{} must be a non-negative integer", field);
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_u64()
            .map(|value| u32::try_from(value).unwrap_or(u32::MAX))
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::String(raw)) => raw.trim().parse::<u32>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

fn read_sort(entries: &[Value]) -> Result<Vec<SortOrder>, String> {
    let mut orders = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(property) = entry.get("property").and_then(Value::as_str) else {
            continue;
        };
        let direction = match entry.get("direction") {
            None | Some(Value::Null) => Direction::default(),
            Some(Value::String(raw)) => raw.parse()?,
            Some(_) => return Err("sort direction must be a string".to_string()),
        };
        orders.push(SortOrder {
            property: property.to_string(),
            direction,
        });
    }
    Ok(orders)
}

impl<'de> Deserialize<'de> for Pageable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Pageable::from_value(value).map_err(D::Error::custom)
    }
}

impl Params for Pageable {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::bind;
    use serde_json::json;

    fn decode(value: Value) -> Result<Pageable, String> {
        serde_json::from_value(value).map_err(|error| error.to_string())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(decode(json!({})).unwrap(), Pageable::default());
        assert_eq!(Pageable::default().size, 20);
    }

    #[test]
    fn test_numeric_strings() {
        let pageable = decode(json!({"page": "3", "size": " 15 "})).unwrap();
        assert_eq!(pageable.page, 3);
        assert_eq!(pageable.size, 15);
        assert_eq!(pageable.offset(), 45);
    }

    #[test]
    fn test_size_is_capped() {
        assert_eq!(decode(json!({"size": 100000})).unwrap().size, MAX_PAGE_SIZE);
        assert_eq!(decode(json!({"size": 0})).unwrap().size, DEFAULT_PAGE_SIZE);
        assert_eq!(Pageable::new(1, 9000).size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_sort_orders() {
        let pageable = decode(json!({
            "sort": [
                {"property": "name"},
                {"property": "createdAt", "direction": "desc"},
                {"direction": "ASC"}
            ]
        }))
        .unwrap();

        assert_eq!(
            pageable.sort,
            vec![SortOrder::asc("name"), SortOrder::desc("createdAt")]
        );
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(decode(json!([1])).is_err());
        assert!(decode(json!({"sort": "name"})).is_err());
        assert!(decode(json!({"page": -1})).is_err());
        assert!(decode(json!({"page": "first"})).is_err());
        assert!(decode(json!({"sort": [{"property": "name", "direction": "sideways"}]})).is_err());
    }

    #[test]
    fn test_serialized_direction_is_uppercase() {
        let pageable = Pageable::new(0, 10).with_sort(SortOrder::desc("name"));
        assert_eq!(
            serde_json::to_value(&pageable).unwrap(),
            json!({"page": 0, "size": 10, "sort": [{"property": "name", "direction": "DESC"}]})
        );
    }

    #[test]
    fn test_schema_documents_defaults_and_directions() {
        let schema = serde_json::to_value(schemars::schema_for!(Pageable)).unwrap();

        assert_eq!(schema["properties"]["size"]["default"], json!(DEFAULT_PAGE_SIZE));
        assert!(schema["properties"]["size"].get("maximum").is_some());
        assert!(schema.get("required").is_none());

        let rendered = schema.to_string();
        assert!(rendered.contains(r#""ASC""#), "{}", rendered);
        assert!(rendered.contains(r#""DESC""#), "{}", rendered);
    }

    #[test]
    fn test_binding_failure_is_reported_at_params_root() {
        let failure = bind::<Pageable>(Some(json!({"sort": 5}))).unwrap_err();
        assert_eq!(
            failure.to_string(),
            "params has invalid value: sort must be an array"
        );
    }
}
