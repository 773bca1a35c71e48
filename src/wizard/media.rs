use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::api::schema::FilePart;
use crate::error::{AppError, AppResult, FieldErrors};

pub const MAX_IMAGES: usize = 10;
pub const MAX_VIDEOS: usize = 2;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_VIDEO_BYTES: usize = 50 * 1024 * 1024;

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];
const VIDEO_TYPES: &[&str] = &["video/mp4", "video/webm", "video/quicktime"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// multipart 表单里的字段名
    pub fn field(&self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
        }
    }
}

/// 用户选择的本地文件
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// 检查类型、大小和文件头签名，返回文件类别或错误提示
pub fn check_file(file: &MediaFile) -> Result<MediaKind, String> {
    let content_type = normalize_type(&file.content_type);
    let (kind, limit) = if IMAGE_TYPES.contains(&content_type.as_str()) {
        (MediaKind::Image, MAX_IMAGE_BYTES)
    } else if VIDEO_TYPES.contains(&content_type.as_str()) {
        (MediaKind::Video, MAX_VIDEO_BYTES)
    } else {
        return Err(format!("{}：不支持的文件类型", file.file_name));
    };

    if file.bytes.is_empty() {
        return Err(format!("{}：文件为空", file.file_name));
    }
    if file.bytes.len() > limit {
        return Err(format!(
            "{}：文件超过 {}MB 限制",
            file.file_name,
            limit / (1024 * 1024)
        ));
    }
    if !signature_matches(&content_type, &file.bytes) {
        return Err(format!("{}：文件内容与类型不符", file.file_name));
    }
    Ok(kind)
}

fn normalize_type(content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpg" => "image/jpeg".to_string(),
        _ => essence,
    }
}

/// 文件头魔数
fn signature_matches(content_type: &str, bytes: &[u8]) -> bool {
    match content_type {
        "image/jpeg" => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
        "image/png" => bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
        "image/webp" => bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP",
        "video/mp4" => bytes.len() >= 8 && &bytes[4..8] == b"ftyp",
        "video/quicktime" => {
            bytes.len() >= 8 && matches!(&bytes[4..8], b"ftyp" | b"moov" | b"mdat" | b"wide" | b"free")
        }
        "video/webm" => bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]),
        _ => false,
    }
}

/// 本地预览地址的句柄
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewHandle(Uuid);

impl PreviewHandle {
    pub fn url(&self) -> String {
        format!("blob:preview/{}", self.0)
    }
}

/// 记录尚未释放的预览，`live()` 应在表单丢弃后回到 0
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    live: Mutex<HashSet<Uuid>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.handles().insert(id);
        PreviewHandle(id)
    }

    pub fn release(&self, handle: &PreviewHandle) {
        if !self.handles().remove(&handle.0) {
            tracing::warn!(preview = %handle.0, "preview released twice");
        }
    }

    pub fn live(&self) -> usize {
        self.handles().len()
    }

    fn handles(&self) -> MutexGuard<'_, HashSet<Uuid>> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
pub struct SelectedMedia {
    pub kind: MediaKind,
    pub file: MediaFile,
    pub preview: PreviewHandle,
}

/// 向导里已选择的图片和视频，移除、清空或 drop 时释放预览
pub struct MediaSelection {
    registry: Arc<PreviewRegistry>,
    images: Vec<SelectedMedia>,
    videos: Vec<SelectedMedia>,
}

impl MediaSelection {
    pub fn new(registry: Arc<PreviewRegistry>) -> Self {
        Self {
            registry,
            images: Vec::new(),
            videos: Vec::new(),
        }
    }

    /// 校验后加入，返回预览句柄。失败时按字段给出错误
    pub fn add(&mut self, file: MediaFile) -> AppResult<PreviewHandle> {
        let kind = check_file(&file).map_err(|message| {
            let field = if file.content_type.starts_with("video") { "videos" } else { "images" };
            field_error(field, message)
        })?;

        let (list, max) = match kind {
            MediaKind::Image => (&mut self.images, MAX_IMAGES),
            MediaKind::Video => (&mut self.videos, MAX_VIDEOS),
        };
        if list.len() >= max {
            return Err(field_error(kind.field(), format!("最多上传 {} 个文件", max)));
        }

        let preview = self.registry.create();
        tracing::debug!(file = %file.file_name, ?kind, "media selected");
        list.push(SelectedMedia {
            kind,
            file,
            preview: preview.clone(),
        });
        Ok(preview)
    }

    pub fn remove(&mut self, kind: MediaKind, index: usize) -> Option<MediaFile> {
        let list = match kind {
            MediaKind::Image => &mut self.images,
            MediaKind::Video => &mut self.videos,
        };
        if index >= list.len() {
            return None;
        }
        let removed = list.remove(index);
        self.registry.release(&removed.preview);
        Some(removed.file)
    }

    pub fn clear(&mut self) {
        for media in self.images.drain(..).chain(self.videos.drain(..)) {
            self.registry.release(&media.preview);
        }
    }

    pub fn images(&self) -> &[SelectedMedia] {
        &self.images
    }

    pub fn videos(&self) -> &[SelectedMedia] {
        &self.videos
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.videos.is_empty()
    }

    pub fn to_parts(&self) -> Vec<FilePart> {
        self.images
            .iter()
            .chain(self.videos.iter())
            .map(|media| FilePart {
                field: media.kind.field().to_string(),
                file_name: media.file.file_name.clone(),
                content_type: normalize_type(&media.file.content_type),
                bytes: media.file.bytes.clone(),
            })
            .collect()
    }
}

impl Drop for MediaSelection {
    fn drop(&mut self) {
        self.clear();
    }
}

fn field_error(field: &str, message: String) -> AppError {
    AppError::Validation(FieldErrors::from([(field.to_string(), message)]))
}
