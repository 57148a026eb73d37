//! File selection for the editor.
//!
//! [`FilePicker`] is the seam between the editor and the platform's file
//! dialogs; [`NativeFilePicker`] backs it with `rfd`.

use std::path::PathBuf;

/// On-disk formats the editor can open and save.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Text,
    Binary,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Text => "txt",
            FileFormat::Binary => "tree",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FileFormat::Text => "Generation text",
            FileFormat::Binary => "Tree cache",
        }
    }
}

pub trait FilePicker {
    /// Asks for an existing file; `None` if the user cancelled.
    fn pick_open(&self, format: FileFormat) -> Option<PathBuf>;

    /// Asks for a save location, starting from `suggested_name`.
    fn pick_save(&self, format: FileFormat, suggested_name: &str) -> Option<PathBuf>;
}

/// Blocking native dialogs.
pub struct NativeFilePicker;

impl FilePicker for NativeFilePicker {
    fn pick_open(&self, format: FileFormat) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .add_filter(format.label(), &[format.extension()])
            .add_filter("All files", &["*"])
            .set_title("Open tree")
            .pick_file()
    }

    fn pick_save(&self, format: FileFormat, suggested_name: &str) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .add_filter(format.label(), &[format.extension()])
            .set_title("Save tree")
            .set_file_name(format!("{suggested_name}.{}", format.extension()))
            .save_file()
    }
}
