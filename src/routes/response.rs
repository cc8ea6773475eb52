use serde::Serialize;

use crate::catalog::{Genre, Program};

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse<'a> {
    Connected {
        msg: String,
        dest: Option<String>,
    },
    Genres {
        #[serde(rename = "Genres")]
        genres: Vec<Genre>,
    },
    Healthz {
        revision: Option<&'a str>,
        timestamp: Option<&'a str>,
        version: &'a str,
    },
    Programs {
        #[serde(rename = "Programs")]
        programs: Vec<Program>,
    },
}
