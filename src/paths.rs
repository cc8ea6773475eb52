//! Canonical paths of the catalog pages, used for redirects and links.

use crate::catalog::Id;

pub const HOME: &str = "/";
pub const LOGIN: &str = "/login";
pub const CONNECT: &str = "/gconnect";
pub const DISCONNECT: &str = "/disconnect";
pub const GENRE_ADD: &str = "/genre/add";
pub const GENRES_JSON: &str = "/genres/JSON";

pub fn genre(id: Id) -> String {
    format!("/genre/{}", id)
}

pub fn genre_edit(id: Id) -> String {
    format!("/genre/{}/edit", id)
}

pub fn genre_delete(id: Id) -> String {
    format!("/genre/{}/delete", id)
}

pub fn genre_programs_json(id: Id) -> String {
    format!("/genre/{}/programs/JSON", id)
}

pub fn program_add(genre_id: Id) -> String {
    format!("/genre/{}/program/add", genre_id)
}

pub fn program(genre_id: Id, program_id: Id) -> String {
    format!("/genre/{}/program/{}/show", genre_id, program_id)
}

pub fn program_edit(genre_id: Id, program_id: Id) -> String {
    format!("/genre/{}/program/{}/edit", genre_id, program_id)
}

pub fn program_delete(genre_id: Id, program_id: Id) -> String {
    format!("/genre/{}/program/{}/delete", genre_id, program_id)
}

pub fn program_json(genre_id: Id, program_id: Id) -> String {
    format!("/genre/{}/program/{}/JSON", genre_id, program_id)
}

/// Returns `target` if it is a local path that is safe to send the user to
/// after logging in. Browsers drop tabs and newlines from URLs, so targets
/// holding control characters are refused outright.
pub fn local_target(target: &str) -> Option<&str> {
    let local = target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains('\\')
        && !target.chars().any(|c| c.is_ascii_control());

    if local {
        Some(target)
    } else {
        None
    }
}
