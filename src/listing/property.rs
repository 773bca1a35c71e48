use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::schema::{AgentDto, PropertyDto, PropertyId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PropertyStatus {
    #[default]
    Available,
    Occupied,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// 房源视图模型，只读
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: PropertyId,
    pub title: String,
    pub price: f64,
    pub address: String,
    pub bedrooms: u32,
    pub bathrooms: f32,
    pub square_feet: Option<u32>,
    pub property_type: String,
    pub status: PropertyStatus,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub agent: AgentContact,
    pub coordinates: Option<Coordinates>,
    pub days_on_market: u32,
    pub amenities: Vec<String>,
    pub description: String,
    pub is_saved: bool,
}

impl Property {
    pub fn from_dto(dto: PropertyDto) -> Self {
        Self::from_dto_at(dto, Utc::now())
    }

    /// `now` 用于在后端未给出 days_on_market 时从 created_at 推算
    pub fn from_dto_at(dto: PropertyDto, now: DateTime<Utc>) -> Self {
        let (images, videos) = partition_media(&dto);
        let coordinates = match (dto.latitude, dto.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        };
        let days_on_market = dto
            .days_on_market
            .or_else(|| {
                dto.created_at
                    .map(|created| (now - created).num_days().max(0) as u32)
            })
            .unwrap_or(0);

        Property {
            id: dto.id,
            price: parse_price(&dto.price),
            amenities: parse_amenities(&dto.amenities),
            status: parse_status(dto.status.as_deref()),
            agent: dto.agent.map(AgentContact::from).unwrap_or_default(),
            bedrooms: dto.bedrooms.unwrap_or(0),
            bathrooms: dto.bathrooms.unwrap_or(0.0),
            square_feet: dto.square_feet,
            title: dto.title,
            address: dto.address,
            property_type: dto.property_type,
            images,
            videos,
            coordinates,
            days_on_market,
            description: dto.description,
            is_saved: false,
        }
    }

    pub fn with_saved(mut self, saved: bool) -> Self {
        self.is_saved = saved;
        self
    }
}

impl From<AgentDto> for AgentContact {
    fn from(agent: AgentDto) -> Self {
        let name = format!("{} {}", agent.first_name, agent.last_name)
            .trim()
            .to_string();
        AgentContact {
            name,
            email: agent.email,
            phone: agent.phone,
        }
    }
}

fn parse_price(raw: &serde_json::Value) -> f64 {
    match raw {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().replace(',', "").parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn parse_status(raw: Option<&str>) -> PropertyStatus {
    match raw.map(str::to_ascii_uppercase).as_deref() {
        Some("OCCUPIED") => PropertyStatus::Occupied,
        _ => PropertyStatus::Available,
    }
}

/// 设施可能是数组、JSON 编码的数组字符串，或逗号分隔的字符串
fn parse_amenities(raw: &serde_json::Value) -> Vec<String> {
    match raw {
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('[') {
                match serde_json::from_str::<serde_json::Value>(trimmed) {
                    Ok(value @ serde_json::Value::Array(_)) => return parse_amenities(&value),
                    _ => tracing::debug!(raw = %trimmed, "amenities string is not a JSON array"),
                }
            }
            trimmed
                .split(',')
                .map(|s| s.trim().trim_matches('"').to_string())
                .filter(|s| !s.is_empty())
                .collect()
        }
        _ => Vec::new(),
    }
}

/// 按 media_type 拆分为图片和视频，保持原有顺序
fn partition_media(dto: &PropertyDto) -> (Vec<String>, Vec<String>) {
    let mut images = Vec::new();
    let mut videos = Vec::new();
    for media in &dto.media {
        if media.media_type.eq_ignore_ascii_case("video") {
            videos.push(media.url.clone());
        } else {
            images.push(media.url.clone());
        }
    }
    (images, videos)
}
