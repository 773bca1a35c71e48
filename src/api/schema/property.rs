use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type PropertyId = u64;

/// 后端返回的房源原始数据，字段形态不统一，由 `listing::Property` 归一化
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyDto {
    pub id: PropertyId,
    #[serde(default)]
    pub title: String,
    /// 数字或数字字符串
    #[serde(default)]
    pub price: serde_json::Value,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<f32>,
    #[serde(default, alias = "area")]
    pub square_feet: Option<u32>,
    #[serde(default)]
    pub property_type: String,
    #[serde(default)]
    pub status: Option<String>,
    /// 图片与视频混在一起的列表
    #[serde(default)]
    pub media: Vec<MediaDto>,
    /// 数组，或 JSON 编码后的字符串
    #[serde(default)]
    pub amenities: serde_json::Value,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default, alias = "owner")]
    pub agent: Option<AgentDto>,
    #[serde(default)]
    pub days_on_market: Option<u32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDto {
    #[serde(alias = "file")]
    pub url: String,
    #[serde(default)]
    pub media_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentDto {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "phone_number")]
    pub phone: Option<String>,
}

/// GET /properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyListResponse {
    #[serde(default)]
    pub results: Vec<PropertyDto>,
    #[serde(default)]
    pub count: u64,
}

/// 创建/编辑房源的 multipart 表单内容
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    /// 表单字段名，`images` 或 `videos`
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PropertyForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn field_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}
