//! Static category-to-source routing.
//!
//! The adapter order for a category is fixed configuration. It is never
//! reordered by success history at runtime; predictable, testable fallback
//! beats adaptive ordering here.

use std::collections::HashMap;

use crate::models::DataCategory;

/// Default chains. First entry is the primary source.
const DEFAULT_ROUTES: [(DataCategory, &[&str]); 9] = [
    (DataCategory::EquityQuote, &["FMP", "FINNHUB"]),
    (DataCategory::EquityEodBar, &["FMP"]),
    (DataCategory::EquityIntradayBar, &["FMP"]),
    (DataCategory::MarketIndex, &["FMP", "FINNHUB"]),
    (DataCategory::SectorPerformance, &["FMP"]),
    (DataCategory::MacroIndicator, &["FRED"]),
    (DataCategory::AlternativeAsset, &["FMP", "FINNHUB"]),
    (DataCategory::NewsArticle, &["FMP", "FINNHUB"]),
    (DataCategory::EarningsEvent, &["FMP"]),
];

/// Ordered source ids per category.
#[derive(Debug, Clone)]
pub struct CategoryRouting {
    routes: HashMap<DataCategory, Vec<String>>,
}

impl CategoryRouting {
    /// The built-in default chains.
    pub fn defaults() -> Self {
        let routes = DEFAULT_ROUTES
            .iter()
            .map(|(category, sources)| {
                (*category, sources.iter().map(|s| s.to_string()).collect())
            })
            .collect();
        Self { routes }
    }

    /// Replace the chain for one category.
    pub fn set(&mut self, category: DataCategory, sources: Vec<String>) {
        self.routes.insert(category, sources);
    }

    /// Ordered source ids for a category. Empty when nothing is routed.
    pub fn sources_for(&self, category: DataCategory) -> &[String] {
        self.routes.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for CategoryRouting {
    fn default() -> Self {
        Self::defaults()
    }
}
