use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{SeedError, SeedResult};

static BUNDLED_DATASET: &str = include_str!("../resources/dataset.json");

/// ## Structure
/// The dataset the loader seeds from. Names are the only identity a record has
/// until the backend assigns it an id.
///
/// ```text
/// Dataset
///   ├── categories: Vec<Category>
///   │   ├── name
///   │   └── description
///   ├── customizations: Vec<Customization>
///   │   ├── name
///   │   ├── price
///   │   └── type: CustomizationType
///   │       ├── topping | side | size | crust
///   │       └── Other(String)
///   └── menu: Vec<MenuItem>
///       ├── name, description, image_url
///       ├── price, rating, calories, protein
///       ├── category_name   -> Category.name
///       └── customizations  -> [Customization.name]
/// ```
///
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub categories: Vec<Category>,
    pub customizations: Vec<Customization>,
    pub menu: Vec<MenuItem>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Customization {
    pub name: String,
    pub price: f64,
    #[serde(rename = "type")]
    pub kind: CustomizationType,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum CustomizationType {
    Topping,
    Side,
    Size,
    Crust,
    Other(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub price: f64,
    pub rating: f64,
    pub calories: f64,
    pub protein: f64,
    pub category_name: String,
    #[serde(default)]
    pub customizations: Vec<String>,
}

impl From<String> for CustomizationType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "topping" => CustomizationType::Topping,
            "side" => CustomizationType::Side,
            "size" => CustomizationType::Size,
            "crust" => CustomizationType::Crust,
            _ => CustomizationType::Other(value),
        }
    }
}

impl From<CustomizationType> for String {
    fn from(value: CustomizationType) -> Self {
        value.as_str().to_string()
    }
}

impl CustomizationType {
    pub fn as_str(&self) -> &str {
        match self {
            CustomizationType::Topping => "topping",
            CustomizationType::Side => "side",
            CustomizationType::Size => "size",
            CustomizationType::Crust => "crust",
            CustomizationType::Other(other) => other,
        }
    }
}

impl fmt::Display for CustomizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A problem found by [`Dataset::validate`]. The loader refuses to touch the
/// backend while any of these are present.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetIssue {
    EmptyName {
        kind: &'static str,
    },
    DuplicateName {
        kind: &'static str,
        name: String,
    },
    NegativePrice {
        kind: &'static str,
        name: String,
        price: f64,
    },
    UnknownCategory {
        item: String,
        category: String,
    },
    UnknownCustomization {
        item: String,
        customization: String,
    },
}

impl fmt::Display for DatasetIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetIssue::EmptyName { kind } => write!(f, "{kind} with an empty name"),
            DatasetIssue::DuplicateName { kind, name } => {
                write!(f, "duplicate {kind} name '{name}'")
            }
            DatasetIssue::NegativePrice { kind, name, price } => {
                write!(f, "{kind} '{name}' has negative price {price}")
            }
            DatasetIssue::UnknownCategory { item, category } => {
                write!(f, "menu item '{item}' references unknown category '{category}'")
            }
            DatasetIssue::UnknownCustomization {
                item,
                customization,
            } => write!(
                f,
                "menu item '{item}' references unknown customization '{customization}'"
            ),
        }
    }
}

impl Dataset {
    /// Demo dataset compiled into the binary.
    pub fn bundled() -> SeedResult<Self> {
        Self::from_json(BUNDLED_DATASET)
    }

    pub fn from_json(json: &str) -> SeedResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> SeedResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Number of menu item to customization links a full run creates.
    pub fn link_count(&self) -> usize {
        self.menu.iter().map(|item| item.customizations.len()).sum()
    }

    /// Collect every issue instead of stopping at the first, so `check` can
    /// report them all at once.
    pub fn validate(&self) -> Vec<DatasetIssue> {
        let mut issues = Vec::new();

        let categories = unique_names(
            "category",
            self.categories.iter().map(|c| c.name.as_str()),
            &mut issues,
        );
        let customizations = unique_names(
            "customization",
            self.customizations.iter().map(|c| c.name.as_str()),
            &mut issues,
        );

        for customization in &self.customizations {
            check_price("customization", &customization.name, customization.price, &mut issues);
        }

        // Menu item names may repeat; each entry is its own record.
        for item in &self.menu {
            if item.name.trim().is_empty() {
                issues.push(DatasetIssue::EmptyName { kind: "menu item" });
            }
            check_price("menu item", &item.name, item.price, &mut issues);

            if !categories.contains(item.category_name.as_str()) {
                issues.push(DatasetIssue::UnknownCategory {
                    item: item.name.clone(),
                    category: item.category_name.clone(),
                });
            }

            for name in &item.customizations {
                if !customizations.contains(name.as_str()) {
                    issues.push(DatasetIssue::UnknownCustomization {
                        item: item.name.clone(),
                        customization: name.clone(),
                    });
                }
            }
        }

        issues
    }

    pub fn ensure_valid(&self) -> SeedResult<()> {
        let issues = self.validate();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(SeedError::InvalidDataset(issues))
        }
    }
}

fn unique_names<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
    issues: &mut Vec<DatasetIssue>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            issues.push(DatasetIssue::EmptyName { kind });
        } else if !seen.insert(name) {
            issues.push(DatasetIssue::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
    seen
}

fn check_price(kind: &'static str, name: &str, price: f64, issues: &mut Vec<DatasetIssue>) {
    if price < 0.0 || price.is_nan() {
        issues.push(DatasetIssue::NegativePrice {
            kind,
            name: name.to_string(),
            price,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pizza_dataset() -> Dataset {
        Dataset::from_json(
            r#"{
                "categories": [
                    { "name": "Pizza", "description": "Stone baked" },
                    { "name": "Drinks", "description": "Cold" }
                ],
                "customizations": [
                    { "name": "Extra Cheese", "price": 1.5, "type": "topping" }
                ],
                "menu": [
                    {
                        "name": "Margherita",
                        "description": "Tomato and mozzarella",
                        "image_url": "https://example/img.png",
                        "price": 9.5,
                        "rating": 4.6,
                        "calories": 800,
                        "protein": 30,
                        "category_name": "Pizza",
                        "customizations": ["Extra Cheese"]
                    }
                ]
            }"#,
        )
        .expect("dataset to parse")
    }

    #[test]
    fn bundled_dataset_is_valid() {
        let dataset = Dataset::bundled().expect("bundled dataset to parse");
        assert_eq!(dataset.validate(), vec![]);
        assert_eq!(dataset.categories.len(), 6);
        assert_eq!(dataset.customizations.len(), 16);
        assert_eq!(dataset.menu.len(), 10);
        assert_eq!(dataset.link_count(), 46);
    }

    #[test]
    fn customization_type_keeps_unknown_tags() {
        let dataset = Dataset::from_json(
            r#"{
                "categories": [],
                "customizations": [
                    { "name": "Dip", "price": 2, "type": "sauce" },
                    { "name": "Large", "price": 3, "type": "size" }
                ],
                "menu": []
            }"#,
        )
        .expect("dataset to parse");

        assert_eq!(
            dataset.customizations[0].kind,
            CustomizationType::Other("sauce".to_string())
        );
        assert_eq!(dataset.customizations[1].kind, CustomizationType::Size);

        let json = serde_json::to_value(&dataset.customizations[0]).expect("serialize");
        assert_eq!(json["type"], "sauce");
    }

    #[test]
    fn missing_customizations_default_to_empty() {
        let dataset = Dataset::from_json(
            r#"{
                "categories": [{ "name": "Drinks", "description": "Cold" }],
                "customizations": [],
                "menu": [{
                    "name": "Lemonade", "description": "", "image_url": "",
                    "price": 3, "rating": 4, "calories": 120, "protein": 0,
                    "category_name": "Drinks"
                }]
            }"#,
        )
        .expect("dataset to parse");
        assert!(dataset.menu[0].customizations.is_empty());
        assert_eq!(dataset.link_count(), 0);
    }

    #[test]
    fn validate_reports_unknown_references() {
        let mut dataset = pizza_dataset();
        dataset.menu[0].category_name = "Pasta".to_string();
        dataset.menu[0].customizations.push("Truffle".to_string());

        assert_eq!(
            dataset.validate(),
            vec![
                DatasetIssue::UnknownCategory {
                    item: "Margherita".to_string(),
                    category: "Pasta".to_string(),
                },
                DatasetIssue::UnknownCustomization {
                    item: "Margherita".to_string(),
                    customization: "Truffle".to_string(),
                },
            ]
        );
        assert!(matches!(
            dataset.ensure_valid(),
            Err(SeedError::InvalidDataset(issues)) if issues.len() == 2
        ));
    }

    #[test]
    fn validate_reports_duplicates_and_prices() {
        let mut dataset = pizza_dataset();
        dataset.categories.push(dataset.categories[0].clone());
        dataset.customizations[0].price = -1.0;
        dataset.categories[1].name = "  ".to_string();

        let issues = dataset.validate();
        assert!(issues.contains(&DatasetIssue::DuplicateName {
            kind: "category",
            name: "Pizza".to_string(),
        }));
        assert!(issues.contains(&DatasetIssue::EmptyName { kind: "category" }));
        assert!(issues.contains(&DatasetIssue::NegativePrice {
            kind: "customization",
            name: "Extra Cheese".to_string(),
            price: -1.0,
        }));
    }

    #[test]
    fn menu_item_names_may_repeat() {
        let mut dataset = pizza_dataset();
        let mut cola = dataset.menu[0].clone();
        cola.category_name = "Drinks".to_string();
        cola.customizations.clear();
        dataset.menu.push(cola);

        assert_eq!(dataset.validate(), vec![]);

        dataset.menu[1].name = String::new();
        assert_eq!(
            dataset.validate(),
            vec![DatasetIssue::EmptyName { kind: "menu item" }]
        );
    }

    #[test]
    fn nutrition_values_may_be_fractional() {
        let dataset = Dataset::from_json(
            r#"{
                "categories": [{ "name": "Bowls", "description": "Warm" }],
                "customizations": [],
                "menu": [{
                    "name": "Poke", "description": "", "image_url": "",
                    "price": 11.5, "rating": 4.4, "calories": 512.5, "protein": 12.5,
                    "category_name": "Bowls"
                }]
            }"#,
        )
        .expect("dataset to parse");
        assert_eq!(dataset.menu[0].protein, 12.5);
        assert_eq!(dataset.menu[0].calories, 512.5);
        assert!(dataset.ensure_valid().is_ok());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = Dataset::from_json("{ \"categories\": 3 }").unwrap_err();
        assert!(matches!(err, SeedError::DatasetParse(_)));
        assert!(err.is_dataset_error());
    }
}
