use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::property::Property;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// 保持后端返回顺序
    #[default]
    Relevance,
    PriceLow,
    PriceHigh,
    Newest,
    Oldest,
    Size,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Relevance => "relevance",
            SortKey::PriceLow => "price-low",
            SortKey::PriceHigh => "price-high",
            SortKey::Newest => "newest",
            SortKey::Oldest => "oldest",
            SortKey::Size => "size",
        }
    }

    /// 稳定排序，比较相等的元素保持输入顺序
    pub fn sort(self, properties: &mut [Property]) {
        match self {
            SortKey::Relevance => {}
            SortKey::PriceLow => properties.sort_by(|a, b| a.price.total_cmp(&b.price)),
            SortKey::PriceHigh => properties.sort_by(|a, b| b.price.total_cmp(&a.price)),
            SortKey::Newest => properties.sort_by_key(|p| p.days_on_market),
            SortKey::Oldest => properties.sort_by(|a, b| b.days_on_market.cmp(&a.days_on_market)),
            SortKey::Size => properties.sort_by(|a, b| by_size_desc(a, b)),
        }
    }
}

// 无面积的排在最后
fn by_size_desc(a: &Property, b: &Property) -> Ordering {
    match (a.square_feet, b.square_feet) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "relevance" => Ok(SortKey::Relevance),
            "price-low" => Ok(SortKey::PriceLow),
            "price-high" => Ok(SortKey::PriceHigh),
            "newest" => Ok(SortKey::Newest),
            "oldest" => Ok(SortKey::Oldest),
            "size" => Ok(SortKey::Size),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}
