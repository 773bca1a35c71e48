// 页面控制器：房源列表（筛选、防抖、缓存）与房源详情

mod details;
mod listing;

pub use details::{DetailsController, DetailsState};
pub use listing::{ListingController, ListingState};

use std::sync::Arc;

use crate::api::schema::PropertyDto;
use crate::favorites::FavoritesStore;
use crate::listing::Property;

/// 归一化并按收藏集合标记
fn to_view(dto: PropertyDto, favorites: Option<&Arc<FavoritesStore>>) -> Property {
    let property = Property::from_dto(dto);
    let saved = favorites.is_some_and(|favorites| favorites.is_saved(property.id));
    property.with_saved(saved)
}
