//! Text field sanitizers for file names and directories.

/// Characters never allowed in an exported file base name.
pub const FILE_NAME_FORBIDDEN: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Characters stripped from directory fields. Separators and drive colons stay.
pub const DIRECTORY_FORBIDDEN: &[char] = &['*', '?', '"', '<', '>', '|'];

/// Strip every forbidden character from a file base name.
pub fn sanitize_file_name(raw: &str) -> String {
    raw.chars().filter(|c| !FILE_NAME_FORBIDDEN.contains(c)).collect()
}

/// Strip wildcard and quoting characters from a directory string.
pub fn sanitize_directory(raw: &str) -> String {
    raw.chars().filter(|c| !DIRECTORY_FORBIDDEN.contains(c)).collect()
}
