use std::sync::Arc;

use log::{error, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, WithStatus};

use crate::errors::CatalogError;

pub mod admin;
mod handlers;
mod query;
mod rejection;
mod response;

pub use internal::*;

/// The largest form submission to accept. A program form is a few
/// kilobytes at most.
const MAX_CONTENT_LENGTH: u64 = 64 * 1024;

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        error!(logger, "Catalog error"; "context" => ?r.context, "error" => ?r.error, "status" => %status_code_for(e), "message" => %r.error);
        let flattened = r.flatten();

        return Ok(with_status(json(&flattened), status_code_for(e)));
    }

    Err(rej)
}

fn status_code_for(e: &CatalogError) -> StatusCode {
    use CatalogError::*;

    match e {
        NoSuchGenre(..) | NoSuchProgram(..) | NoSuchAccount(..) => StatusCode::NOT_FOUND,
        Invalid(..) => StatusCode::BAD_REQUEST,
        GenreExists | ProgramExists | GenreNotEmpty => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{body, get as g, header, path as p, post, query};

    use super::{handlers, query as q, MAX_CONTENT_LENGTH};
    use crate::catalog::{GenreForm, Id, ProgramForm};
    use crate::environment::Environment;
    use crate::session;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route_filter {
        ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
        ($route_variable:ident; $first:expr, $($rest:expr),+) => (
            let $route_variable = $route_variable.and($first);
            route_filter!($route_variable; $($rest),+);
        )
    }

    macro_rules! route {
        (stateless $name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
            pub fn $name(environment: Environment) -> Route {
                let $route_variable = warp::any().map(move || environment.clone());

                route_filter!($route_variable; $($filters),+);

                $route_variable.and_then(handlers::$handler)
                    .boxed()
            }
        );
        ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
            pub fn $name(environment: Environment) -> Route {
                let sessions = session::extract(environment.sessions.clone());

                let $route_variable = warp::any().map(move || environment.clone());

                route_filter!($route_variable; $($filters),+);

                $route_variable.and(sessions).and_then(handlers::$handler)
                    .boxed()
            }
        );
    }

    fn form<T: serde::de::DeserializeOwned + Send + 'static>(
    ) -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
        body::content_length_limit(MAX_CONTENT_LENGTH).and(body::form::<T>())
    }

    route!(make_home_route => home, rt; end(), g());
    route!(make_login_route => login, rt; p("login"), end(), g(), query::<q::LoginQuery>());
    route!(make_connect_route => connect, rt; p("gconnect"), end(), post(), query::<q::ConnectQuery>(), header::optional::<String>("x-requested-with"), body::content_length_limit(MAX_CONTENT_LENGTH), body::bytes());
    route!(make_revoke_route => revoke, rt; p("gdisconnect"), end(), g());
    route!(make_disconnect_route => disconnect, rt; p("disconnect"), end(), g());

    route!(stateless make_genres_json_route => genres_json, rt; p!("genres" / "JSON"), g());
    route!(stateless make_genre_programs_json_route => genre_programs_json, rt; p!("genre" / Id / "programs" / "JSON"), g());
    route!(stateless make_program_json_route => program_json, rt; p!("genre" / Id / "program" / Id / "JSON"), g());

    route!(make_add_genre_form_route => add_genre_form, rt; p!("genre" / "add"), g());
    route!(make_add_genre_route => add_genre, rt; p!("genre" / "add"), post(), form::<GenreForm>());
    route!(make_show_genre_route => show_genre, rt; p!("genre" / Id), g());
    route!(make_show_genre_programs_route => show_genre, rt; p!("genre" / Id / "program"), g());
    route!(make_edit_genre_form_route => edit_genre_form, rt; p!("genre" / Id / "edit"), g());
    route!(make_edit_genre_route => edit_genre, rt; p!("genre" / Id / "edit"), post(), form::<GenreForm>());
    route!(make_delete_genre_form_route => delete_genre_form, rt; p!("genre" / Id / "delete"), g());
    route!(make_delete_genre_route => delete_genre, rt; p!("genre" / Id / "delete"), post());

    route!(make_add_program_form_route => add_program_form, rt; p!("genre" / Id / "program" / "add"), g());
    route!(make_add_program_route => add_program, rt; p!("genre" / Id / "program" / "add"), post(), form::<ProgramForm>());
    route!(make_show_program_route => show_program, rt; p!("genre" / Id / "program" / Id / "show"), g());
    route!(make_edit_program_form_route => edit_program_form, rt; p!("genre" / Id / "program" / Id / "edit"), g());
    route!(make_edit_program_route => edit_program, rt; p!("genre" / Id / "program" / Id / "edit"), post(), form::<ProgramForm>());
    route!(make_delete_program_form_route => delete_program_form, rt; p!("genre" / Id / "program" / Id / "delete"), g());
    route!(make_delete_program_route => delete_program, rt; p!("genre" / Id / "program" / Id / "delete"), post());

    /// Every catalog route, combined.
    pub fn make_catalog_routes(environment: Environment) -> Route {
        let e = environment;

        make_home_route(e.clone())
            .or(make_login_route(e.clone()))
            .unify()
            .or(make_connect_route(e.clone()))
            .unify()
            .or(make_revoke_route(e.clone()))
            .unify()
            .or(make_disconnect_route(e.clone()))
            .unify()
            .or(make_genres_json_route(e.clone()))
            .unify()
            .or(make_genre_programs_json_route(e.clone()))
            .unify()
            .or(make_program_json_route(e.clone()))
            .unify()
            .or(make_add_genre_form_route(e.clone()))
            .unify()
            .or(make_add_genre_route(e.clone()))
            .unify()
            .or(make_show_genre_route(e.clone()))
            .unify()
            .or(make_show_genre_programs_route(e.clone()))
            .unify()
            .or(make_edit_genre_form_route(e.clone()))
            .unify()
            .or(make_edit_genre_route(e.clone()))
            .unify()
            .or(make_delete_genre_form_route(e.clone()))
            .unify()
            .or(make_delete_genre_route(e.clone()))
            .unify()
            .or(make_add_program_form_route(e.clone()))
            .unify()
            .or(make_add_program_route(e.clone()))
            .unify()
            .or(make_show_program_route(e.clone()))
            .unify()
            .or(make_edit_program_form_route(e.clone()))
            .unify()
            .or(make_edit_program_route(e.clone()))
            .unify()
            .or(make_delete_program_form_route(e.clone()))
            .unify()
            .or(make_delete_program_route(e))
            .unify()
            .boxed()
    }
}
