//! Domain models shared by adapters, the fallback chain, and the core crate.

mod category;
mod payload;

pub use category::{
    DataCategory, CATEGORY_ALTERNATIVE_ASSET, CATEGORY_EARNINGS_EVENT, CATEGORY_EQUITY_EOD_BAR,
    CATEGORY_EQUITY_INTRADAY_BAR, CATEGORY_EQUITY_QUOTE, CATEGORY_MACRO_INDICATOR,
    CATEGORY_MARKET_INDEX, CATEGORY_NEWS_ARTICLE, CATEGORY_SECTOR_PERFORMANCE,
};
pub use payload::{
    BarRecord, CategoryPayload, EarningsRecord, IndexRecord, MacroRecord, NewsRecord, QuoteRecord,
    SectorRecord,
};
