//! Storefront themes
//!
//! Every theme renders the same checkout and product pages. A theme only
//! contributes presentation parameters through its [`ThemeProfile`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::aggregates::product::ProductTab;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Default,
    BabyKids,
    BeautyCosmetics,
    CarsAutomotive,
    Electronics,
    FurnitureInterior,
    PerfumeFragrances,
    Watches,
}

/// Presentation parameters a theme hands to the shared page engine.
#[derive(Clone, Debug, Serialize)]
pub struct ThemeProfile {
    pub theme: Theme,
    pub display_name: &'static str,
    /// Hex colors (no leading `#`) for the generated placeholder image.
    pub placeholder_background: &'static str,
    pub placeholder_foreground: &'static str,
    pub step_labels: [&'static str; 3],
    pub product_tabs: Vec<ProductTab>,
}

impl Theme {
    pub const ALL: [Theme; 8] = [
        Theme::Default,
        Theme::BabyKids,
        Theme::BeautyCosmetics,
        Theme::CarsAutomotive,
        Theme::Electronics,
        Theme::FurnitureInterior,
        Theme::PerfumeFragrances,
        Theme::Watches,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::BabyKids => "baby-kids",
            Theme::BeautyCosmetics => "beauty-cosmetics",
            Theme::CarsAutomotive => "cars-automotive",
            Theme::Electronics => "electronics",
            Theme::FurnitureInterior => "furniture-interior",
            Theme::PerfumeFragrances => "perfume-fragrances",
            Theme::Watches => "watches",
        }
    }

    /// Unknown slugs render with the generic theme.
    pub fn from_slug_or_default(slug: &str) -> Self {
        slug.parse().unwrap_or_default()
    }

    pub fn profile(&self) -> ThemeProfile {
        use ProductTab::*;
        let (display_name, bg, fg, step_labels, tabs): (_, _, _, _, Vec<ProductTab>) = match self {
            Theme::Default => (
                "Default",
                "f3f4f6",
                "374151",
                ["Shipping", "Review", "Payment"],
                vec![Description, Specifications, Reviews],
            ),
            Theme::BabyKids => (
                "Baby & Kids",
                "fde2e4",
                "9d4edd",
                ["Delivery Details", "Check Your Order", "Payment"],
                vec![Description, Details, Reviews],
            ),
            Theme::BeautyCosmetics => (
                "Beauty & Cosmetics",
                "fce7f3",
                "be185d",
                ["Shipping", "Review", "Payment"],
                vec![Description, Details, CustomFields, Reviews],
            ),
            Theme::CarsAutomotive => (
                "Cars & Automotive",
                "1f2937",
                "f59e0b",
                ["Shipping Info", "Order Review", "Payment"],
                vec![Description, Specifications, CustomFields, Reviews],
            ),
            Theme::Electronics => (
                "Electronics",
                "0f172a",
                "38bdf8",
                ["Shipping", "Review", "Payment"],
                vec![Description, Specifications, CustomFields, Reviews],
            ),
            Theme::FurnitureInterior => (
                "Furniture & Interior",
                "f5f0e6",
                "7c5c3b",
                ["Delivery", "Review", "Payment"],
                vec![Description, Details, Specifications, Reviews],
            ),
            Theme::PerfumeFragrances => (
                "Perfume & Fragrances",
                "faf5ef",
                "8b6f47",
                ["Shipping", "Review", "Payment"],
                vec![Description, Details, CustomFields, Reviews],
            ),
            Theme::Watches => (
                "Watches",
                "111111",
                "d4af37",
                ["Shipping", "Review", "Secure Payment"],
                vec![Description, Specifications, Details, CustomFields, Reviews],
            ),
        };
        ThemeProfile {
            theme: *self,
            display_name,
            placeholder_background: bg,
            placeholder_foreground: fg,
            step_labels,
            product_tabs: tabs,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme: {0}")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = s.trim().to_ascii_lowercase();
        Theme::ALL
            .into_iter()
            .find(|t| t.slug() == slug)
            .ok_or(UnknownTheme(s.to_string()))
    }
}

impl ThemeProfile {
    pub fn shows(&self, tab: ProductTab) -> bool {
        self.product_tabs.contains(&tab)
    }

    /// Placeholder image used when a product has no images at all.
    pub fn placeholder_image(&self, product_name: &str) -> String {
        format!(
            "https://placehold.co/600x600/{}/{}?text={}",
            self.placeholder_background,
            self.placeholder_foreground,
            urlencoding::encode(product_name)
        )
    }
}
