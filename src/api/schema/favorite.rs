use serde::{Deserialize, Serialize};

use super::property::PropertyId;

/// GET /favorites
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FavoritesResponse {
    #[serde(default)]
    pub results: Vec<FavoriteEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub property: FavoriteProperty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteProperty {
    pub id: PropertyId,
}

impl FavoritesResponse {
    pub fn property_ids(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.results.iter().map(|entry| entry.property.id)
    }
}
