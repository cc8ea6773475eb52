use serde::Serialize;
use warp::reject;

use crate::catalog::Id;
use crate::errors::CatalogError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: CatalogError,
}

impl Rejection {
    pub fn new(context: Context, error: CatalogError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            message: format!("{}", self.error),
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) message: String,
}

/// The operation that was being carried out when a request failed.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Context {
    Home,
    Login,
    Connect,
    Disconnect,
    Genres,
    AddGenre,
    ShowGenre { genre_id: Id },
    EditGenre { genre_id: Id },
    DeleteGenre { genre_id: Id },
    AddProgram { genre_id: Id },
    ShowProgram { genre_id: Id, program_id: Id },
    EditProgram { genre_id: Id, program_id: Id },
    DeleteProgram { genre_id: Id, program_id: Id },
}

impl Context {
    pub fn show_genre(genre_id: Id) -> Context {
        Context::ShowGenre { genre_id }
    }

    pub fn edit_genre(genre_id: Id) -> Context {
        Context::EditGenre { genre_id }
    }

    pub fn delete_genre(genre_id: Id) -> Context {
        Context::DeleteGenre { genre_id }
    }

    pub fn add_program(genre_id: Id) -> Context {
        Context::AddProgram { genre_id }
    }

    pub fn show_program(genre_id: Id, program_id: Id) -> Context {
        Context::ShowProgram {
            genre_id,
            program_id,
        }
    }

    pub fn edit_program(genre_id: Id, program_id: Id) -> Context {
        Context::EditProgram {
            genre_id,
            program_id,
        }
    }

    pub fn delete_program(genre_id: Id, program_id: Id) -> Context {
        Context::DeleteProgram {
            genre_id,
            program_id,
        }
    }
}
