use std::collections::{BTreeMap, BTreeSet};

use url::form_urlencoded;

use super::property::Property;
use super::sort::SortKey;

/// 用户当前的搜索条件，存放在 URL 查询串里，URL 是唯一数据源
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub query: String,
    pub location: String,
    pub property_type: String,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub bedrooms: Option<u32>,
    /// 允许半卫，如 1.5
    pub bathrooms: Option<f32>,
    pub min_sqft: Option<u32>,
    pub max_sqft: Option<u32>,
    pub amenities: BTreeSet<String>,
    pub sort: SortKey,
    pub page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query: String::new(),
            location: String::new(),
            property_type: String::new(),
            min_price: None,
            max_price: None,
            bedrooms: None,
            bathrooms: None,
            min_sqft: None,
            max_sqft: None,
            amenities: BTreeSet::new(),
            sort: SortKey::Relevance,
            page: 1,
        }
    }
}

impl FilterState {
    /// 解析 URL 查询串，空值和无法解析的数字会被忽略
    pub fn from_query_string(qs: &str) -> Self {
        let mut state = FilterState::default();
        let qs = qs.trim_start_matches('?');
        for (key, value) in form_urlencoded::parse(qs.as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "query" | "q" => state.query = value.to_string(),
                "location" => state.location = value.to_string(),
                "propertyType" => state.property_type = value.to_string(),
                "minPrice" => state.min_price = parse_number(&key, value),
                "maxPrice" => state.max_price = parse_number(&key, value),
                "bedrooms" => state.bedrooms = parse_number(&key, value),
                "bathrooms" => {
                    state.bathrooms = parse_number::<f32>(&key, value).filter(|n| n.is_finite() && *n >= 0.0)
                }
                "minSqft" => state.min_sqft = parse_number(&key, value),
                "maxSqft" => state.max_sqft = parse_number(&key, value),
                "amenities" => state.amenities.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|a| !a.is_empty())
                        .map(str::to_string),
                ),
                "sortBy" => state.sort = value.parse().unwrap_or_default(),
                "page" => state.page = parse_number(&key, value).unwrap_or(1).max(1),
                other => tracing::debug!(key = other, "ignoring unknown filter parameter"),
            }
        }
        state
    }

    /// 生成 URL 查询串，默认值不输出
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.filter_params() {
            serializer.append_pair(key, &value);
        }
        if self.sort != SortKey::Relevance {
            serializer.append_pair("sortBy", self.sort.as_str());
        }
        if self.page > 1 {
            serializer.append_pair("page", &self.page.to_string());
        }
        serializer.finish()
    }

    /// 发给 GET /properties 的查询参数
    pub fn api_params(&self, page: u32, page_size: u32) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), page.to_string()),
            ("limit".to_string(), page_size.to_string()),
        ];
        params.extend(
            self.filter_params()
                .into_iter()
                .map(|(key, value)| (key.to_string(), value)),
        );
        params
    }

    /// 与字段构造顺序无关的规范化序列化，作为缓存键的一部分。
    /// 排序和页码不属于后端查询条件，不参与。
    pub fn canonical(&self) -> String {
        let mut map: BTreeMap<&str, String> = BTreeMap::new();
        for (key, value) in self.filter_params() {
            map.insert(key, value);
        }
        serde_json::to_string(&map).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.filter_params().is_empty()
    }

    /// 非空的筛选字段，设施按字典序合并成一个值
    fn filter_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let mut push_text = |key: &'static str, value: &str| {
            let value = value.trim();
            if !value.is_empty() {
                params.push((key, value.to_string()));
            }
        };
        push_text("query", &self.query);
        push_text("location", &self.location);
        if !is_any_type(&self.property_type) {
            push_text("propertyType", &self.property_type);
        }

        let numbers = [
            ("minPrice", self.min_price.map(|n| n.to_string())),
            ("maxPrice", self.max_price.map(|n| n.to_string())),
            ("bedrooms", self.bedrooms.map(|n| n.to_string())),
            ("bathrooms", self.bathrooms.map(|n| n.to_string())),
            ("minSqft", self.min_sqft.map(|n| n.to_string())),
            ("maxSqft", self.max_sqft.map(|n| n.to_string())),
        ];
        for (key, value) in numbers {
            if let Some(value) = value {
                params.push((key, value));
            }
        }

        if !self.amenities.is_empty() {
            let joined = self
                .amenities
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(",");
            params.push(("amenities", joined));
        }
        params
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    match value.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::debug!(key, value, "ignoring non-numeric filter value");
            None
        }
    }
}

fn is_any_type(property_type: &str) -> bool {
    let trimmed = property_type.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all")
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// 所有条件同时满足才保留
pub fn matches(property: &Property, filters: &FilterState) -> bool {
    let query = filters.query.trim();
    if !query.is_empty()
        && !(contains_ci(&property.title, query)
            || contains_ci(&property.address, query)
            || contains_ci(&property.description, query))
    {
        return false;
    }

    let location = filters.location.trim();
    if !location.is_empty() && !contains_ci(&property.address, location) {
        return false;
    }

    if !is_any_type(&filters.property_type)
        && !property
            .property_type
            .eq_ignore_ascii_case(filters.property_type.trim())
    {
        return false;
    }

    if let Some(min) = filters.min_price {
        if property.price < min as f64 {
            return false;
        }
    }
    if let Some(max) = filters.max_price {
        if property.price > max as f64 {
            return false;
        }
    }

    if let Some(beds) = filters.bedrooms {
        if property.bedrooms < beds {
            return false;
        }
    }
    if let Some(baths) = filters.bathrooms {
        if property.bathrooms < baths {
            return false;
        }
    }

    // 没有面积数据的房源不满足任何面积条件
    if filters.min_sqft.is_some() || filters.max_sqft.is_some() {
        let Some(sqft) = property.square_feet else {
            return false;
        };
        if filters.min_sqft.is_some_and(|min| sqft < min) {
            return false;
        }
        if filters.max_sqft.is_some_and(|max| sqft > max) {
            return false;
        }
    }

    filters.amenities.iter().all(|wanted| {
        property
            .amenities
            .iter()
            .any(|have| have.eq_ignore_ascii_case(wanted))
    })
}
