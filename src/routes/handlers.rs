use std::time::{Duration, Instant};

use bytes::Bytes;
use log::{debug, o};
use warp::{
    http::StatusCode,
    reject,
    reply::{self, html, json, with_header, with_status, Reply},
};

use crate::catalog::{Genre, GenreForm, GenreName, Id, Program, ProgramFields, ProgramForm};
use crate::environment::Environment;
use crate::errors::CatalogError;
use crate::identity::{self, ConnectOutcome};
use crate::paths;
use crate::render::{Page, View};
use crate::routes::{
    query::{ConnectQuery, LoginQuery},
    rejection::{Context, Rejection},
    response::SuccessResponse,
};
use crate::session::Session;

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($body:tt)*) => {{
        let start = Instant::now();

        let result: RouteResult = async move { $($body)* }.await;

        result.map(|reply| {
            Box::new(with_header(
                reply,
                SERVER_TIMING_HEADER,
                format_server_timing(start.elapsed()),
            )) as Box<dyn Reply>
        })
    }};
}

pub async fn home(environment: Environment, session: Session) -> RouteResult {
    timed! {
        let latest = environment
            .db
            .latest_programs(environment.config.latest_count)
            .await
            .map_err(|e| Rejection::new(Context::Home, e))?;

        render(&environment, session, View::Home { latest }, Context::Home).await
    }
}

pub async fn login(environment: Environment, query: LoginQuery, mut session: Session) -> RouteResult {
    timed! {
        if let Some(target) = query.target_path.as_deref().and_then(paths::local_target) {
            session.target_path = Some(target.to_owned());
        }

        let state = session.new_state();
        let client_id = environment.provider.client_id().to_owned();

        render(&environment, session, View::Login { state, client_id }, Context::Login).await
    }
}

pub async fn connect(
    environment: Environment,
    query: ConnectQuery,
    requested_with: Option<String>,
    code: Bytes,
    mut session: Session,
) -> RouteResult {
    timed! {
        let code = String::from_utf8_lossy(&code).trim().to_owned();

        let outcome = identity::connect(
            &*environment.db,
            &*environment.provider,
            &mut session,
            query.state.as_deref(),
            requested_with.as_deref(),
            code,
        )
        .await;

        match outcome {
            Ok(ConnectOutcome::AlreadyConnected) => respond(
                &environment,
                &session,
                json(&"Current user is already connected."),
                Context::Connect,
            ),
            Ok(ConnectOutcome::Connected { account, dest }) => {
                debug!(environment.logger, "Signed in"; "account_id" => account.id);

                let msg = environment
                    .renderer
                    .welcome(&account)
                    .map_err(|e| Rejection::new(Context::Connect, e))?;
                let body = SuccessResponse::Connected { msg, dest };

                respond(&environment, &session, json(&body), Context::Connect)
            }
            Err(e) => {
                debug!(environment.logger, "Identity exchange failed"; "error" => %e);

                respond(
                    &environment,
                    &session,
                    with_status(json(&e.to_string()), e.status()),
                    Context::Connect,
                )
            }
        }
    }
}

pub async fn revoke(environment: Environment, mut session: Session) -> RouteResult {
    timed! {
        let (message, status) =
            match identity::revoke(&environment.logger, &*environment.provider, &mut session)
                .await
            {
                Ok(()) => ("Successfully disconnected.".to_owned(), StatusCode::OK),
                Err(e) => (e.to_string(), e.status()),
            };

        respond(
            &environment,
            &session,
            with_status(json(&message), status),
            Context::Disconnect,
        )
    }
}

pub async fn disconnect(environment: Environment, mut session: Session) -> RouteResult {
    timed! {
        identity::disconnect(&environment.logger, &*environment.provider, &mut session).await;

        redirect(&environment, &session, paths::HOME, Context::Disconnect)
    }
}

pub async fn genres_json(environment: Environment) -> RouteResult {
    timed! {
        let genres = environment
            .db
            .list_genres()
            .await
            .map_err(|e| Rejection::new(Context::Genres, e))?;

        Ok(Box::new(json(&SuccessResponse::Genres { genres })) as Box<dyn Reply>)
    }
}

pub async fn genre_programs_json(environment: Environment, genre_id: Id) -> RouteResult {
    timed! {
        let context = Context::show_genre(genre_id);
        let genre = find_genre(&environment, genre_id, &context).await?;

        let programs = environment
            .db
            .list_programs(genre.id)
            .await
            .map_err(|e| Rejection::new(context, e))?;

        Ok(Box::new(json(&SuccessResponse::Programs { programs })) as Box<dyn Reply>)
    }
}

pub async fn program_json(environment: Environment, genre_id: Id, program_id: Id) -> RouteResult {
    timed! {
        let context = Context::show_program(genre_id, program_id);
        let (_, program) = find_program(&environment, genre_id, program_id, &context).await?;

        Ok(Box::new(json(&program)) as Box<dyn Reply>)
    }
}

pub async fn show_genre(environment: Environment, genre_id: Id, session: Session) -> RouteResult {
    timed! {
        let context = Context::show_genre(genre_id);
        let genre = find_genre(&environment, genre_id, &context).await?;

        let programs = environment
            .db
            .list_programs(genre.id)
            .await
            .map_err(|e| Rejection::new(context.clone(), e))?;

        render(&environment, session, View::Genre { genre, programs }, context).await
    }
}

pub async fn add_genre_form(environment: Environment, mut session: Session) -> RouteResult {
    timed! {
        if signed_in(&mut session, paths::GENRE_ADD).is_none() {
            return redirect(&environment, &session, paths::LOGIN, Context::AddGenre);
        }

        render(&environment, session, View::GenreForm { genre: None }, Context::AddGenre).await
    }
}

pub async fn add_genre(environment: Environment, form: GenreForm, mut session: Session) -> RouteResult {
    timed! {
        let context = Context::AddGenre;

        let account_id = match signed_in(&mut session, paths::GENRE_ADD) {
            Some(account_id) => account_id,
            None => return redirect(&environment, &session, paths::LOGIN, context),
        };

        let name = match GenreName::parse(&form.name) {
            Ok(name) => name,
            Err(e) => {
                session.flash(e.to_string());
                return redirect(&environment, &session, paths::GENRE_ADD, context);
            }
        };

        match environment.db.create_genre(account_id, name).await {
            Ok(genre) => {
                debug!(environment.logger, "Created genre"; "genre_id" => genre.id, "account_id" => account_id);
                session.flash(format!("Genre \"{}\" created.", genre.name));
                redirect(&environment, &session, paths::genre(genre.id), context)
            }
            Err(CatalogError::GenreExists) => {
                session.flash("The genre you attempted to add already exists.");
                redirect(&environment, &session, paths::GENRE_ADD, context)
            }
            Err(e) => Err(Rejection::new(context, e).into()),
        }
    }
}

pub async fn edit_genre_form(environment: Environment, genre_id: Id, mut session: Session) -> RouteResult {
    timed! {
        let context = Context::edit_genre(genre_id);

        let account_id = match signed_in(&mut session, paths::genre_edit(genre_id)) {
            Some(account_id) => account_id,
            None => return redirect(&environment, &session, paths::LOGIN, context),
        };

        let genre = find_genre(&environment, genre_id, &context).await?;

        if genre.account_id != account_id {
            session.flash("You may not edit a genre which you did not create.");
            return redirect(&environment, &session, paths::genre(genre_id), context);
        }

        render(&environment, session, View::GenreForm { genre: Some(genre) }, context).await
    }
}

pub async fn edit_genre(
    environment: Environment,
    genre_id: Id,
    form: GenreForm,
    mut session: Session,
) -> RouteResult {
    timed! {
        let context = Context::edit_genre(genre_id);

        let account_id = match signed_in(&mut session, paths::genre_edit(genre_id)) {
            Some(account_id) => account_id,
            None => return redirect(&environment, &session, paths::LOGIN, context),
        };

        let genre = find_genre(&environment, genre_id, &context).await?;

        if genre.account_id != account_id {
            session.flash("You may not edit a genre which you did not create.");
            return redirect(&environment, &session, paths::genre(genre_id), context);
        }

        let name = match GenreName::parse(&form.name) {
            Ok(name) => name,
            Err(e) => {
                session.flash(e.to_string());
                return redirect(&environment, &session, paths::genre_edit(genre_id), context);
            }
        };

        match environment.db.rename_genre(genre_id, name).await {
            Ok(genre) => {
                debug!(environment.logger, "Renamed genre"; "genre_id" => genre_id);
                session.flash(format!("Genre \"{}\" updated.", genre.name));
                redirect(&environment, &session, paths::HOME, context)
            }
            Err(CatalogError::GenreExists) => {
                session.flash("The genre name you have entered already exists.");
                redirect(&environment, &session, paths::genre_edit(genre_id), context)
            }
            Err(e) => Err(Rejection::new(context, e).into()),
        }
    }
}

pub async fn delete_genre_form(environment: Environment, genre_id: Id, mut session: Session) -> RouteResult {
    timed! {
        let context = Context::delete_genre(genre_id);

        let account_id = match signed_in(&mut session, paths::genre_delete(genre_id)) {
            Some(account_id) => account_id,
            None => return redirect(&environment, &session, paths::LOGIN, context),
        };

        let genre = find_genre(&environment, genre_id, &context).await?;

        if let Some(refusal) = refuse_genre_deletion(&environment, &genre, account_id, &context).await? {
            session.flash(refusal);
            return redirect(&environment, &session, paths::genre(genre_id), context);
        }

        render(&environment, session, View::GenreDelete { genre }, context).await
    }
}

pub async fn delete_genre(environment: Environment, genre_id: Id, mut session: Session) -> RouteResult {
    timed! {
        let context = Context::delete_genre(genre_id);

        let account_id = match signed_in(&mut session, paths::genre_delete(genre_id)) {
            Some(account_id) => account_id,
            None => return redirect(&environment, &session, paths::LOGIN, context),
        };

        let genre = find_genre(&environment, genre_id, &context).await?;

        if let Some(refusal) = refuse_genre_deletion(&environment, &genre, account_id, &context).await? {
            session.flash(refusal);
            return redirect(&environment, &session, paths::genre(genre_id), context);
        }

        match environment.db.delete_genre(genre_id).await {
            Ok(()) => {
                debug!(environment.logger, "Deleted genre"; "genre_id" => genre_id);
                session.flash(format!("Genre \"{}\" deleted.", genre.name));
                redirect(&environment, &session, paths::HOME, context)
            }
            // a program was added since the check above
            Err(CatalogError::GenreNotEmpty) => {
                session.flash(GENRE_NOT_EMPTY);
                redirect(&environment, &session, paths::genre(genre_id), context)
            }
            Err(e) => Err(Rejection::new(context, e).into()),
        }
    }
}

pub async fn add_program_form(environment: Environment, genre_id: Id, mut session: Session) -> RouteResult {
    timed! {
        let context = Context::add_program(genre_id);

        if signed_in(&mut session, paths::program_add(genre_id)).is_none() {
            return redirect(&environment, &session, paths::LOGIN, context);
        }

        let genre = find_genre(&environment, genre_id, &context).await?;

        render(&environment, session, View::ProgramForm { genre, program: None }, context).await
    }
}

pub async fn add_program(
    environment: Environment,
    genre_id: Id,
    form: ProgramForm,
    mut session: Session,
) -> RouteResult {
    timed! {
        let context = Context::add_program(genre_id);

        let account_id = match signed_in(&mut session, paths::program_add(genre_id)) {
            Some(account_id) => account_id,
            None => return redirect(&environment, &session, paths::LOGIN, context),
        };

        let genre = find_genre(&environment, genre_id, &context).await?;

        let fields = match ProgramFields::validate(&form) {
            Ok(fields) => fields,
            Err(e) => {
                session.flash(e.to_string());
                return redirect(&environment, &session, paths::program_add(genre_id), context);
            }
        };

        match environment.db.create_program(account_id, genre.id, fields).await {
            Ok(program) => {
                debug!(environment.logger, "Created program"; "genre_id" => genre_id, "program_id" => program.id);
                session.flash(format!("Program \"{}\" created.", program.name));
                redirect(&environment, &session, paths::program(genre_id, program.id), context)
            }
            Err(CatalogError::ProgramExists) => {
                session.flash("The program you are attempting to add already exists.");
                redirect(&environment, &session, paths::program_add(genre_id), context)
            }
            Err(e) => Err(Rejection::new(context, e).into()),
        }
    }
}

pub async fn show_program(
    environment: Environment,
    genre_id: Id,
    program_id: Id,
    session: Session,
) -> RouteResult {
    timed! {
        let context = Context::show_program(genre_id, program_id);
        let (genre, program) = find_program(&environment, genre_id, program_id, &context).await?;

        render(&environment, session, View::Program { genre, program }, context).await
    }
}

pub async fn edit_program_form(
    environment: Environment,
    genre_id: Id,
    program_id: Id,
    mut session: Session,
) -> RouteResult {
    timed! {
        let context = Context::edit_program(genre_id, program_id);

        let account_id = match signed_in(&mut session, paths::program_edit(genre_id, program_id)) {
            Some(account_id) => account_id,
            None => return redirect(&environment, &session, paths::LOGIN, context),
        };

        let (genre, program) = find_program(&environment, genre_id, program_id, &context).await?;

        if program.account_id != account_id {
            session.flash("You may not edit a program which you did not create.");
            return redirect(&environment, &session, paths::program(genre_id, program_id), context);
        }

        render(
            &environment,
            session,
            View::ProgramForm { genre, program: Some(program) },
            context,
        )
        .await
    }
}

pub async fn edit_program(
    environment: Environment,
    genre_id: Id,
    program_id: Id,
    form: ProgramForm,
    mut session: Session,
) -> RouteResult {
    timed! {
        let context = Context::edit_program(genre_id, program_id);

        let account_id = match signed_in(&mut session, paths::program_edit(genre_id, program_id)) {
            Some(account_id) => account_id,
            None => return redirect(&environment, &session, paths::LOGIN, context),
        };

        let (_, program) = find_program(&environment, genre_id, program_id, &context).await?;

        if program.account_id != account_id {
            session.flash("You may not edit a program which you did not create.");
            return redirect(&environment, &session, paths::program(genre_id, program_id), context);
        }

        let fields = match ProgramFields::validate(&form) {
            Ok(fields) => fields,
            Err(e) => {
                session.flash(e.to_string());
                return redirect(&environment, &session, paths::program_edit(genre_id, program_id), context);
            }
        };

        match environment.db.update_program(program_id, fields).await {
            Ok(program) => {
                debug!(environment.logger, "Updated program"; "genre_id" => genre_id, "program_id" => program_id);
                session.flash(format!("Program \"{}\" updated.", program.name));
                redirect(&environment, &session, paths::program(genre_id, program_id), context)
            }
            Err(CatalogError::ProgramExists) => {
                session.flash("The program name you have entered already exists.");
                redirect(&environment, &session, paths::program_edit(genre_id, program_id), context)
            }
            Err(e) => Err(Rejection::new(context, e).into()),
        }
    }
}

pub async fn delete_program_form(
    environment: Environment,
    genre_id: Id,
    program_id: Id,
    mut session: Session,
) -> RouteResult {
    timed! {
        let context = Context::delete_program(genre_id, program_id);

        let account_id = match signed_in(&mut session, paths::program_delete(genre_id, program_id)) {
            Some(account_id) => account_id,
            None => return redirect(&environment, &session, paths::LOGIN, context),
        };

        let (genre, program) = find_program(&environment, genre_id, program_id, &context).await?;

        if program.account_id != account_id {
            session.flash("You may not delete a program which you did not create.");
            return redirect(&environment, &session, paths::program(genre_id, program_id), context);
        }

        render(&environment, session, View::ProgramDelete { genre, program }, context).await
    }
}

pub async fn delete_program(
    environment: Environment,
    genre_id: Id,
    program_id: Id,
    mut session: Session,
) -> RouteResult {
    timed! {
        let context = Context::delete_program(genre_id, program_id);

        let account_id = match signed_in(&mut session, paths::program_delete(genre_id, program_id)) {
            Some(account_id) => account_id,
            None => return redirect(&environment, &session, paths::LOGIN, context),
        };

        let (_, program) = find_program(&environment, genre_id, program_id, &context).await?;

        if program.account_id != account_id {
            session.flash("You may not delete a program which you did not create.");
            return redirect(&environment, &session, paths::program(genre_id, program_id), context);
        }

        environment
            .db
            .delete_program(program_id)
            .await
            .map_err(|e| Rejection::new(context.clone(), e))?;

        debug!(environment.logger, "Deleted program"; "genre_id" => genre_id, "program_id" => program_id);
        session.flash(format!("Program \"{}\" deleted.", program.name));

        redirect(&environment, &session, paths::genre(genre_id), context)
    }
}

const GENRE_NOT_EMPTY: &str = "You may not delete a genre which contains programs.";

/// Returns the account ID of the signed-in user. Otherwise remembers
/// `requested` as the place to return to after logging in.
fn signed_in(session: &mut Session, requested: impl Into<String>) -> Option<Id> {
    if session.account_id.is_none() {
        session.target_path = Some(requested.into());
    }

    session.account_id
}

/// Returns the reason `account_id` may not delete `genre`, if any.
async fn refuse_genre_deletion(
    environment: &Environment,
    genre: &Genre,
    account_id: Id,
    context: &Context,
) -> Result<Option<&'static str>, Rejection> {
    if genre.account_id != account_id {
        return Ok(Some("You may not delete a genre which you did not create."));
    }

    let programs = environment
        .db
        .count_programs(genre.id)
        .await
        .map_err(|e| Rejection::new(context.clone(), e))?;

    if programs > 0 {
        Ok(Some(GENRE_NOT_EMPTY))
    } else {
        Ok(None)
    }
}

async fn find_genre(environment: &Environment, genre_id: Id, context: &Context) -> Result<Genre, Rejection> {
    environment
        .db
        .retrieve_genre(genre_id)
        .await
        .and_then(|genre| genre.ok_or(CatalogError::NoSuchGenre(genre_id)))
        .map_err(|e| Rejection::new(context.clone(), e))
}

/// Retrieves a program and its genre. A program addressed under a genre it
/// does not belong to does not exist.
async fn find_program(
    environment: &Environment,
    genre_id: Id,
    program_id: Id,
    context: &Context,
) -> Result<(Genre, Program), Rejection> {
    let genre = find_genre(environment, genre_id, context).await?;

    let program = environment
        .db
        .retrieve_program(program_id)
        .await
        .and_then(|program| {
            program
                .filter(|p| p.genre_id == genre_id)
                .ok_or(CatalogError::NoSuchProgram(program_id))
        })
        .map_err(|e| Rejection::new(context.clone(), e))?;

    Ok((genre, program))
}

/// Renders `view` as a full page, consuming the pending flash messages.
async fn render(environment: &Environment, mut session: Session, view: View, context: Context) -> RouteResult {
    let genres = environment
        .db
        .list_genres()
        .await
        .map_err(|e| Rejection::new(context.clone(), e))?;

    let page = Page {
        genres,
        flashes: session.take_flashes(),
        viewer: session.account_id,
        view,
    };

    let logger = environment.logger.new(o!("context" => format!("{:?}", context)));
    debug!(logger, "Rendering page"; "flashes" => page.flashes.len());

    let body = environment
        .renderer
        .render(&page)
        .map_err(|e| Rejection::new(context.clone(), e))?;

    respond(environment, &session, html(body), context)
}

fn redirect(
    environment: &Environment,
    session: &Session,
    location: impl AsRef<str>,
    context: Context,
) -> RouteResult {
    let reply = with_status(
        with_header(reply::reply(), "location", location.as_ref()),
        StatusCode::SEE_OTHER,
    );

    respond(environment, session, reply, context)
}

/// Attaches the session cookie to `reply`.
fn respond(
    environment: &Environment,
    session: &Session,
    reply: impl Reply + 'static,
    context: Context,
) -> RouteResult {
    let cookie = environment
        .sessions
        .cookie(session)
        .map_err(|e| Rejection::new(context, e))?;

    Ok(Box::new(with_header(reply, "set-cookie", cookie)))
}

fn format_server_timing(duration: Duration) -> String {
    format!("handler;dur={}", duration.as_secs_f64() * 1000.0)
}
