//! 同目录图片列表与前后切换

use std::fs;
use std::path::{Path, PathBuf};

/// 识别为图片的扩展名（小写，不含点）。
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "jpe", "jfif", "gif", "webp", "tiff", "tif", "bmp", "dib", "tga", "ico",
    "hdr", "exr", "pbm", "pgm", "ppm", "pam", "dds", "ff",
];

/// 按扩展名（不区分大小写）判断是否为图片文件名。
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// 某个文件所在目录中的全部图片，按文件名不区分大小写排序。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderImages {
    files: Vec<PathBuf>,
    current: Option<usize>,
}

impl FolderImages {
    /// 扫描 `file` 的父目录。目录不可读时返回空列表。
    pub fn scan(file: &Path) -> Self {
        let Some(dir) = file.parent().filter(|d| d.is_dir()) else {
            return Self::default();
        };
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                log::debug!("📁 无法读取目录 {}: {err}", dir.display());
                return Self::default();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_image_file(path))
            .collect();
        files.sort_by_cached_key(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().to_lowercase())
                .unwrap_or_default()
        });

        let current = files
            .iter()
            .position(|candidate| candidate.file_name() == file.file_name());
        Self { files, current }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&Path> {
        self.current.map(|index| self.files[index].as_path())
    }

    pub fn has_next(&self) -> bool {
        matches!(self.current, Some(index) if index + 1 < self.files.len())
    }

    pub fn has_previous(&self) -> bool {
        matches!(self.current, Some(index) if index > 0)
    }

    /// 前进一张；已在末尾时不动并返回 `None`。
    pub fn next(&mut self) -> Option<&Path> {
        if !self.has_next() {
            return None;
        }
        self.current = self.current.map(|index| index + 1);
        self.current()
    }

    /// 后退一张；已在开头时不动并返回 `None`。
    pub fn previous(&mut self) -> Option<&Path> {
        if !self.has_previous() {
            return None;
        }
        self.current = self.current.map(|index| index - 1);
        self.current()
    }

    /// 查看下一张的路径但不移动。
    pub fn peek_next(&self) -> Option<&Path> {
        let index = self.current? + 1;
        self.files.get(index).map(PathBuf::as_path)
    }

    pub fn peek_previous(&self) -> Option<&Path> {
        let index = self.current?.checked_sub(1)?;
        self.files.get(index).map(PathBuf::as_path)
    }
}
