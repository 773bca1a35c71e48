// 房源创建/编辑向导
// 分步填写，每一步校验通过才能前进，最后一次性以 multipart 提交

pub mod media;
pub mod publish;
pub mod validate;

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::api::schema::{PropertyForm, PropertyId};
use crate::error::FieldErrors;
use crate::listing::{Property, PropertyStatus};

pub use media::{MediaFile, MediaKind, MediaSelection, PreviewHandle, PreviewRegistry};
pub use publish::Publisher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Basics,
    Location,
    Details,
    Media,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Basics,
        WizardStep::Location,
        WizardStep::Details,
        WizardStep::Media,
        WizardStep::Review,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn next(&self) -> Option<WizardStep> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(&self) -> Option<WizardStep> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardMode {
    Create,
    Edit(PropertyId),
}

/// 表单原始输入，数字字段保留用户输入的文本，校验时再解析
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDraft {
    pub title: String,
    pub description: String,
    pub property_type: String,
    pub status: PropertyStatus,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub square_feet: String,
    pub amenities: BTreeSet<String>,
}

impl PropertyDraft {
    /// 编辑时用已有房源预填
    pub fn from_property(property: &Property) -> Self {
        PropertyDraft {
            title: property.title.clone(),
            description: property.description.clone(),
            property_type: property.property_type.clone(),
            status: property.status,
            address: property.address.clone(),
            latitude: property.coordinates.map(|c| c.lat),
            longitude: property.coordinates.map(|c| c.lng),
            price: property.price.to_string(),
            bedrooms: property.bedrooms.to_string(),
            bathrooms: property.bathrooms.to_string(),
            square_feet: property
                .square_feet
                .map(|sqft| sqft.to_string())
                .unwrap_or_default(),
            amenities: property.amenities.iter().cloned().collect(),
        }
    }
}

pub struct Wizard {
    mode: WizardMode,
    step: WizardStep,
    draft: PropertyDraft,
    media: MediaSelection,
    errors: FieldErrors,
}

impl Wizard {
    pub fn new(mode: WizardMode, previews: Arc<PreviewRegistry>) -> Self {
        Self::with_draft(mode, PropertyDraft::default(), previews)
    }

    pub fn with_draft(mode: WizardMode, draft: PropertyDraft, previews: Arc<PreviewRegistry>) -> Self {
        Self {
            mode,
            step: WizardStep::Basics,
            draft,
            media: MediaSelection::new(previews),
            errors: FieldErrors::new(),
        }
    }

    pub fn edit(property: &Property, previews: Arc<PreviewRegistry>) -> Self {
        Self::with_draft(
            WizardMode::Edit(property.id),
            PropertyDraft::from_property(property),
            previews,
        )
    }

    pub fn mode(&self) -> WizardMode {
        self.mode
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &PropertyDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut PropertyDraft {
        &mut self.draft
    }

    pub fn media(&self) -> &MediaSelection {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut MediaSelection {
        &mut self.media
    }

    /// 最近一次校验的结果
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// 当前步骤校验通过才前进，返回是否前进
    pub fn next(&mut self) -> bool {
        self.errors = validate::validate_step(self.step, &self.draft, &self.media, self.mode);
        if !self.errors.is_empty() {
            tracing::debug!(step = ?self.step, errors = self.errors.len(), "wizard step blocked");
            return false;
        }
        match self.step.next() {
            Some(next) => {
                self.step = next;
                true
            }
            None => false,
        }
    }

    pub fn back(&mut self) {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
            self.errors.clear();
        }
    }

    pub fn validate_all(&mut self) -> &FieldErrors {
        self.errors = validate::validate_all(&self.draft, &self.media, self.mode);
        &self.errors
    }

    /// 组装 multipart 表单。设施重复使用 `amenities` 字段
    pub fn to_form(&self) -> PropertyForm {
        let draft = &self.draft;
        let mut fields = vec![
            ("title".to_string(), draft.title.trim().to_string()),
            ("description".to_string(), draft.description.trim().to_string()),
            (
                "property_type".to_string(),
                draft.property_type.trim().to_ascii_lowercase(),
            ),
            ("status".to_string(), status_wire(draft.status).to_string()),
            ("address".to_string(), draft.address.trim().to_string()),
            ("price".to_string(), draft.price.trim().replace(',', "")),
            ("bedrooms".to_string(), draft.bedrooms.trim().to_string()),
            ("bathrooms".to_string(), draft.bathrooms.trim().to_string()),
        ];
        if !draft.square_feet.trim().is_empty() {
            fields.push(("square_feet".to_string(), draft.square_feet.trim().to_string()));
        }
        if let (Some(lat), Some(lng)) = (draft.latitude, draft.longitude) {
            fields.push(("latitude".to_string(), lat.to_string()));
            fields.push(("longitude".to_string(), lng.to_string()));
        }
        fields.extend(
            draft
                .amenities
                .iter()
                .map(|amenity| ("amenities".to_string(), amenity.clone())),
        );

        PropertyForm {
            fields,
            files: self.media.to_parts(),
        }
    }

    /// 放弃编辑，释放所有预览
    pub fn discard(mut self) {
        self.media.clear();
        tracing::debug!(mode = ?self.mode, "wizard discarded");
    }
}

fn status_wire(status: PropertyStatus) -> &'static str {
    match status {
        PropertyStatus::Available => "AVAILABLE",
        PropertyStatus::Occupied => "OCCUPIED",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::media::tests::jpeg;

    fn filled(previews: Arc<PreviewRegistry>) -> Wizard {
        let mut wizard = Wizard::new(WizardMode::Create, previews);
        let draft = wizard.draft_mut();
        draft.title = "Sunny loft".into();
        draft.description = "Two bedroom loft close to the park and shops.".into();
        draft.property_type = "apartment".into();
        draft.address = "12 Oak St, Austin".into();
        draft.price = "250000".into();
        draft.bedrooms = "2".into();
        draft.bathrooms = "1".into();
        draft.amenities = ["pool".to_string(), "gym".to_string()].into();
        wizard
    }

    #[test]
    fn next_is_gated_on_current_step() {
        let mut wizard = Wizard::new(WizardMode::Create, Arc::new(PreviewRegistry::new()));
        assert!(!wizard.next());
        assert_eq!(wizard.step(), WizardStep::Basics);
        assert!(wizard.errors().contains_key("title"));

        wizard.draft_mut().title = "Loft".into();
        wizard.draft_mut().description = "A quiet loft with lots of natural light.".into();
        wizard.draft_mut().property_type = "condo".into();
        assert!(wizard.next());
        assert_eq!(wizard.step(), WizardStep::Location);
        assert!(wizard.errors().is_empty());

        wizard.back();
        assert_eq!(wizard.step(), WizardStep::Basics);
    }

    #[test]
    fn walks_through_all_steps() {
        let previews = Arc::new(PreviewRegistry::new());
        let mut wizard = filled(previews.clone());
        wizard.media_mut().add(jpeg("front.jpg")).unwrap();

        while wizard.next() {}
        assert_eq!(wizard.step(), WizardStep::Review);
        assert!(wizard.validate_all().is_empty());

        wizard.discard();
        assert_eq!(previews.live(), 0);
    }

    #[test]
    fn form_contains_repeated_amenities_and_files() {
        let mut wizard = filled(Arc::new(PreviewRegistry::new()));
        wizard.media_mut().add(jpeg("front.jpg")).unwrap();
        let form = wizard.to_form();

        let amenities: Vec<&str> = form.field_values("amenities").collect();
        assert_eq!(amenities, vec!["gym", "pool"]);
        assert_eq!(form.field("status"), Some("AVAILABLE"));
        assert_eq!(form.field("square_feet"), None);
        assert_eq!(form.files.len(), 1);
        assert_eq!(form.files[0].field, "images");
    }

    #[test]
    fn edit_prefills_from_property() {
        let property = Property::from_dto(crate::api::schema::PropertyDto {
            id: 8,
            title: "Cottage".into(),
            price: serde_json::json!(199000),
            bedrooms: Some(3),
            ..Default::default()
        });
        let wizard = Wizard::edit(&property, Arc::new(PreviewRegistry::new()));
        assert_eq!(wizard.mode(), WizardMode::Edit(8));
        assert_eq!(wizard.draft().price, "199000");
        assert_eq!(wizard.draft().bedrooms, "3");
    }
}
