//! Backend endpoint paths.
//!
//! Path parameters often come from the filesystem (`D:\Clients\#12`), so each
//! one goes through [`sanitize_part_of_uri`] before it is placed in a path.

/// Percent-encode the characters that would break a single path segment:
/// `#` becomes `%23`, `/` becomes `%2F`, `\` becomes `%5C`.
///
/// `%` itself is left alone. A second pass over sanitized output finds
/// nothing to encode, but the mapping is lossy: input that already contains
/// `%2F` is indistinguishable from an encoded `/` once the backend decodes it.
/// Only call this on raw input.
pub fn sanitize_part_of_uri(part: &str) -> String {
    part.replace('#', "%23")
        .replace('/', "%2F")
        .replace('\\', "%5C")
}

/// Kinds of media the correction endpoints accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Slides,
    Prints,
    Audio,
    Vhs,
}

impl MediaType {
    pub const ALL: [MediaType; 4] = [Self::Slides, Self::Prints, Self::Audio, Self::Vhs];

    /// Route segment used by the backend.
    pub fn segment(self) -> &'static str {
        match self {
            Self::Slides => "slides",
            Self::Prints => "prints",
            Self::Audio => "audio",
            Self::Vhs => "vhs",
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.segment().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown media type: {s}"))
    }
}

/// Correct every file of one media type in `from_folder`, writing to `to_folder`.
pub fn correct_folder(media: MediaType, from_folder: &str, to_folder: &str) -> String {
    format!(
        "corr/{}/{}/{}/",
        media.segment(),
        sanitize_part_of_uri(from_folder),
        sanitize_part_of_uri(to_folder)
    )
}

/// Correct a single file.
pub fn correct_single(media: MediaType, file_path: &str, to_folder: &str) -> String {
    format!(
        "corr/{}/single/{}/{}/",
        media.segment(),
        sanitize_part_of_uri(file_path),
        sanitize_part_of_uri(to_folder)
    )
}

/// Correct everything under a project folder.
pub fn correct_all(project_folder: &str) -> String {
    format!("corr/all/{}/", sanitize_part_of_uri(project_folder))
}

/// Status of an asynchronous correction task.
pub fn task_status(task_id: &str) -> String {
    format!("corr/tasks/{}/", sanitize_part_of_uri(task_id))
}

pub fn client_info(spreadsheet_id: &str) -> String {
    format!("fc/client_info/{}/", sanitize_part_of_uri(spreadsheet_id))
}

pub fn check_all_photo_rows(spreadsheet_id: &str) -> String {
    format!("fc/check_all_photo_rows/{}/", sanitize_part_of_uri(spreadsheet_id))
}
