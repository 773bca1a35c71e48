use crate::error::FieldErrors;

use super::media::MediaSelection;
use super::{PropertyDraft, WizardMode, WizardStep};

pub const PROPERTY_TYPES: &[&str] = &[
    "apartment",
    "house",
    "condo",
    "townhouse",
    "studio",
    "villa",
    "land",
    "commercial",
];

const TITLE_MAX: usize = 100;
const DESCRIPTION_MIN: usize = 20;

/// 校验某一步的字段
pub fn validate_step(
    step: WizardStep,
    draft: &PropertyDraft,
    media: &MediaSelection,
    mode: WizardMode,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match step {
        WizardStep::Basics => basics(draft, &mut errors),
        WizardStep::Location => location(draft, &mut errors),
        WizardStep::Details => details(draft, &mut errors),
        WizardStep::Media => {
            // 编辑时可以沿用已有图片
            if mode == WizardMode::Create && media.images().is_empty() {
                errors.insert("images".into(), "请至少上传一张图片".into());
            }
        }
        WizardStep::Review => {}
    }
    errors
}

/// 提交前校验全部步骤
pub fn validate_all(draft: &PropertyDraft, media: &MediaSelection, mode: WizardMode) -> FieldErrors {
    WizardStep::ALL
        .iter()
        .flat_map(|step| validate_step(*step, draft, media, mode))
        .collect()
}

fn basics(draft: &PropertyDraft, errors: &mut FieldErrors) {
    let title = draft.title.trim();
    if title.is_empty() {
        errors.insert("title".into(), "请输入标题".into());
    } else if title.chars().count() > TITLE_MAX {
        errors.insert("title".into(), format!("标题不能超过 {} 个字符", TITLE_MAX));
    }

    if draft.description.trim().chars().count() < DESCRIPTION_MIN {
        errors.insert(
            "description".into(),
            format!("描述至少需要 {} 个字符", DESCRIPTION_MIN),
        );
    }

    let property_type = draft.property_type.trim().to_ascii_lowercase();
    if property_type.is_empty() {
        errors.insert("propertyType".into(), "请选择房源类型".into());
    } else if !PROPERTY_TYPES.contains(&property_type.as_str()) {
        errors.insert("propertyType".into(), "不支持的房源类型".into());
    }
}

fn location(draft: &PropertyDraft, errors: &mut FieldErrors) {
    if draft.address.trim().is_empty() {
        errors.insert("address".into(), "请输入地址".into());
    }

    match (draft.latitude, draft.longitude) {
        (None, None) => {}
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) {
                errors.insert("latitude".into(), "纬度必须在 -90 到 90 之间".into());
            }
            if !(-180.0..=180.0).contains(&lng) {
                errors.insert("longitude".into(), "经度必须在 -180 到 180 之间".into());
            }
        }
        _ => {
            errors.insert("coordinates".into(), "请在地图上选择位置".into());
        }
    }
}

fn details(draft: &PropertyDraft, errors: &mut FieldErrors) {
    match draft.price.trim().replace(',', "").parse::<f64>() {
        Ok(price) if price > 0.0 && price.is_finite() => {}
        _ => {
            errors.insert("price".into(), "请输入有效的价格".into());
        }
    }

    if draft.bedrooms.trim().parse::<u32>().is_err() {
        errors.insert("bedrooms".into(), "卧室数量必须是非负整数".into());
    }

    match draft.bathrooms.trim().parse::<f32>() {
        Ok(bathrooms) if bathrooms >= 0.0 && (bathrooms * 2.0).fract() == 0.0 => {}
        _ => {
            errors.insert("bathrooms".into(), "卫生间数量必须是 0.5 的整数倍".into());
        }
    }

    let square_feet = draft.square_feet.trim();
    if !square_feet.is_empty() && !square_feet.parse::<u32>().is_ok_and(|sqft| sqft > 0) {
        errors.insert("squareFeet".into(), "面积必须是正整数".into());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::wizard::media::PreviewRegistry;
    use crate::wizard::media::tests::jpeg;

    fn valid_draft() -> PropertyDraft {
        PropertyDraft {
            title: "Sunny loft".into(),
            description: "Two bedroom loft close to the park and shops.".into(),
            property_type: "Apartment".into(),
            address: "12 Oak St, Austin".into(),
            latitude: Some(30.27),
            longitude: Some(-97.74),
            price: "250,000".into(),
            bedrooms: "2".into(),
            bathrooms: "1.5".into(),
            square_feet: "900".into(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_draft_passes() {
        let mut media = MediaSelection::new(Arc::new(PreviewRegistry::new()));
        media.add(jpeg("a.jpg")).unwrap();
        assert!(validate_all(&valid_draft(), &media, WizardMode::Create).is_empty());
    }

    #[test]
    fn errors_are_collected_per_field() {
        let media = MediaSelection::new(Arc::new(PreviewRegistry::new()));
        let draft = PropertyDraft {
            title: " ".into(),
            price: "free".into(),
            bathrooms: "1.3".into(),
            latitude: Some(91.0),
            longitude: Some(0.0),
            ..valid_draft()
        };

        let errors = validate_all(&draft, &media, WizardMode::Create);
        let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["bathrooms", "images", "latitude", "price", "title"]);
    }

    #[test]
    fn step_validation_is_scoped() {
        let media = MediaSelection::new(Arc::new(PreviewRegistry::new()));
        let draft = PropertyDraft {
            price: String::new(),
            ..valid_draft()
        };
        assert!(validate_step(WizardStep::Basics, &draft, &media, WizardMode::Create).is_empty());
        assert!(validate_step(WizardStep::Details, &draft, &media, WizardMode::Create)
            .contains_key("price"));
    }

    #[test]
    fn edit_mode_does_not_require_new_images() {
        let media = MediaSelection::new(Arc::new(PreviewRegistry::new()));
        assert!(validate_all(&valid_draft(), &media, WizardMode::Edit(4)).is_empty());
    }

    #[test]
    fn coordinates_must_come_in_pairs() {
        let media = MediaSelection::new(Arc::new(PreviewRegistry::new()));
        let draft = PropertyDraft {
            longitude: None,
            ..valid_draft()
        };
        let errors = validate_step(WizardStep::Location, &draft, &media, WizardMode::Create);
        assert!(errors.contains_key("coordinates"));
    }
}
