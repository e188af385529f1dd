use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::Error;

/// A free-form display value as emitted by the plan generator: usually a number,
/// sometimes a string ("2000 kcal"), occasionally something unusable.
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayValue {
    Number(f64),
    Text(String),
    Unsupported,
}

impl DisplayValue {
    /// Rendered text, or `None` when the value carries nothing printable.
    pub fn to_text(&self) -> Option<String> {
        match self {
            DisplayValue::Number(n) => Some(format_number(*n)),
            DisplayValue::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            DisplayValue::Text(_) | DisplayValue::Unsupported => None,
        }
    }
}

impl From<Value> for DisplayValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map_or(DisplayValue::Unsupported, DisplayValue::Number),
            Value::String(s) => DisplayValue::Text(s),
            Value::Bool(b) => DisplayValue::Text(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => DisplayValue::Unsupported,
        }
    }
}

impl<'de> Deserialize<'de> for DisplayValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Value::deserialize(deserializer)?.into())
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// `null` is treated like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An object deserializes normally; `null` is absent; any other value
/// stands in for an object whose fields are all missing.
fn object_or_default<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        object @ Value::Object(_) => serde_json::from_value(object)
            .map(Some)
            .map_err(D::Error::custom),
        _ => Ok(Some(T::default())),
    }
}

/// Text for an optional field, "-" when absent or blank.
pub fn display_or_dash(value: Option<&DisplayValue>) -> String {
    value
        .and_then(DisplayValue::to_text)
        .unwrap_or_else(|| "-".to_string())
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub age: Option<DisplayValue>,
    #[serde(default)]
    pub gender: Option<DisplayValue>,
    #[serde(default)]
    pub region: Option<DisplayValue>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Macros {
    #[serde(default)]
    pub protein: Option<DisplayValue>,
    #[serde(default)]
    pub carbs: Option<DisplayValue>,
    #[serde(default)]
    pub fat: Option<DisplayValue>,
}

/// Borrowed view over the calorie total and its optional macro split.
#[derive(Clone, Copy, Debug)]
pub struct CalorieSummary<'a> {
    pub total_calories: &'a DisplayValue,
    pub macros: Option<&'a Macros>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MealEntry {
    #[serde(default)]
    pub name: Option<DisplayValue>,
    #[serde(default)]
    pub description: Option<DisplayValue>,
    #[serde(default)]
    pub calories: Option<DisplayValue>,
    #[serde(default)]
    pub protein: Option<DisplayValue>,
    #[serde(default)]
    pub carbs: Option<DisplayValue>,
    #[serde(default)]
    pub fat: Option<DisplayValue>,
}

impl MealEntry {
    pub fn name_text(&self) -> String {
        self.name
            .as_ref()
            .and_then(DisplayValue::to_text)
            .unwrap_or_default()
    }

    pub fn description_text(&self) -> Option<String> {
        self.description.as_ref().and_then(DisplayValue::to_text)
    }

    /// kcal, protein, carbs, fat, in column order.
    pub fn nutrient_cells(&self) -> [String; 4] {
        [
            display_or_dash(self.calories.as_ref()),
            display_or_dash(self.protein.as_ref()),
            display_or_dash(self.carbs.as_ref()),
            display_or_dash(self.fat.as_ref()),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MealCategory {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl MealCategory {
    pub const ALL: [MealCategory; 4] = [
        MealCategory::Breakfast,
        MealCategory::Lunch,
        MealCategory::Dinner,
        MealCategory::Snacks,
    ];

    pub fn heading(self) -> &'static str {
        match self {
            MealCategory::Breakfast => "Breakfast:",
            MealCategory::Lunch => "Lunch:",
            MealCategory::Dinner => "Dinner:",
            MealCategory::Snacks => "Snacks:",
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MealSections {
    #[serde(default, deserialize_with = "null_as_default")]
    pub breakfast: Vec<MealEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lunch: Vec<MealEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dinner: Vec<MealEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub snacks: Vec<MealEntry>,
}

impl MealSections {
    pub fn entries(&self, category: MealCategory) -> &[MealEntry] {
        match category {
            MealCategory::Breakfast => &self.breakfast,
            MealCategory::Lunch => &self.lunch,
            MealCategory::Dinner => &self.dinner,
            MealCategory::Snacks => &self.snacks,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Notes {
    Text(String),
    List(Vec<String>),
}

impl Notes {
    /// Strings and other scalars become text; array elements keep whatever
    /// prints and drop the rest. Objects carry no notes.
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(Notes::List(
                items
                    .into_iter()
                    .filter_map(|item| DisplayValue::from(item).to_text())
                    .collect(),
            )),
            Value::String(text) => Some(Notes::Text(text)),
            other => DisplayValue::from(other).to_text().map(Notes::Text),
        }
    }

    /// Normalized bullet items: one per line (text form) or per element (list
    /// form), trimmed, blank items dropped, existing bullet markers removed.
    pub fn bullets(&self) -> Vec<String> {
        let items: Vec<&str> = match self {
            Notes::Text(text) => text.split('\n').collect(),
            Notes::List(items) => items.iter().map(String::as_str).collect(),
        };
        items
            .into_iter()
            .map(strip_bullet_marker)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn strip_bullet_marker(item: &str) -> &str {
    let item = item.trim();
    if let Some(rest) = item.strip_prefix('\u{2022}') {
        return rest.trim_start();
    }
    for marker in ["- ", "* "] {
        if let Some(rest) = item.strip_prefix(marker) {
            return rest.trim_start();
        }
    }
    item
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DietPlanDocument {
    #[serde(default, deserialize_with = "object_or_default")]
    pub profile: Option<Profile>,
    #[serde(default, rename = "calorieBreakdown", alias = "totalCalories")]
    pub total_calories: Option<DisplayValue>,
    #[serde(
        default,
        rename = "macronutrientBreakdown",
        alias = "macros",
        deserialize_with = "object_or_default"
    )]
    pub macros: Option<Macros>,
    #[serde(
        default,
        rename = "dietPlan",
        alias = "sections",
        deserialize_with = "null_as_default"
    )]
    pub sections: MealSections,
    #[serde(
        default,
        rename = "importantNotes",
        alias = "notes",
        deserialize_with = "lenient_notes"
    )]
    pub notes: Option<Notes>,
}

fn lenient_notes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Notes>, D::Error> {
    Ok(Notes::from_value(Value::deserialize(deserializer)?))
}

impl DietPlanDocument {
    pub fn from_json(bytes: &[u8]) -> Result<Self, Error> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Present only when a printable calorie total exists; the macro split is
    /// never shown without it.
    pub fn calorie_summary(&self) -> Option<CalorieSummary<'_>> {
        let total = self.total_calories.as_ref()?;
        total.to_text()?;
        Some(CalorieSummary {
            total_calories: total,
            macros: self.macros.as_ref(),
        })
    }

    pub fn note_bullets(&self) -> Vec<String> {
        self.notes.as_ref().map(Notes::bullets).unwrap_or_default()
    }
}
