//! Page models and their presentation.

use std::fmt::{self, Write};

use crate::catalog::{
    Account, Genre, Id, LatestProgram, Program, DESCRIPTION_MAX, FIRST_YEAR, GENRE_NAME_MAX,
    LAST_YEAR, PROGRAM_NAME_MAX,
};
use crate::errors::CatalogError;
use crate::paths;

/// The content particular to each page.
#[derive(Clone, Debug)]
pub enum View {
    Home {
        latest: Vec<LatestProgram>,
    },
    Genre {
        genre: Genre,
        programs: Vec<Program>,
    },
    Program {
        genre: Genre,
        program: Program,
    },
    /// Adds a genre when `genre` is absent, edits it otherwise.
    GenreForm {
        genre: Option<Genre>,
    },
    GenreDelete {
        genre: Genre,
    },
    /// Adds a program to `genre` when `program` is absent, edits it
    /// otherwise.
    ProgramForm {
        genre: Genre,
        program: Option<Program>,
    },
    ProgramDelete {
        genre: Genre,
        program: Program,
    },
    Login {
        state: String,
        client_id: String,
    },
}

/// Everything needed to draw a page.
#[derive(Clone, Debug)]
pub struct Page {
    /// All genres, for navigation.
    pub genres: Vec<Genre>,

    /// One-shot messages queued by earlier requests.
    pub flashes: Vec<String>,

    /// The account viewing the page, if signed in.
    pub viewer: Option<Id>,

    pub view: View,
}

pub trait Renderer {
    fn render(&self, page: &Page) -> Result<String, CatalogError>;

    /// The greeting sent back to the login page after a successful sign-in.
    fn welcome(&self, account: &Account) -> Result<String, CatalogError>;
}

/// Plain HTML without templates or external assets.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn render(&self, page: &Page) -> Result<String, CatalogError> {
        let mut html = String::new();
        write_page(&mut html, page)?;

        Ok(html)
    }

    fn welcome(&self, account: &Account) -> Result<String, CatalogError> {
        let mut html = format!("<h1>Welcome, {}!</h1>", escape(&account.username));

        if let Some(picture) = &account.picture {
            write!(
                html,
                "<img src=\"{}\" style=\"width:300px; height:300px; border-radius:150px;\">",
                escape(picture)
            )?;
        }

        Ok(html)
    }
}

fn write_page(html: &mut String, page: &Page) -> fmt::Result {
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\">");
    write!(html, "<title>{}</title>", escape(&title(&page.view)))?;
    html.push_str("</head>\n<body>\n<header>");
    write!(html, "<a href=\"{}\">Old Time Radio Catalog</a> ", paths::HOME)?;

    if page.viewer.is_some() {
        write!(html, "<a href=\"{}\">Log out</a>", paths::DISCONNECT)?;
    } else {
        write!(html, "<a href=\"{}\">Log in</a>", paths::LOGIN)?;
    }

    html.push_str("</header>\n");

    if !page.flashes.is_empty() {
        html.push_str("<ul class=\"flashes\">");
        for message in &page.flashes {
            write!(html, "<li>{}</li>", escape(message))?;
        }
        html.push_str("</ul>\n");
    }

    html.push_str("<nav><ul>");
    for genre in &page.genres {
        write!(
            html,
            "<li><a href=\"{}\">{}</a></li>",
            paths::genre(genre.id),
            escape(&genre.name)
        )?;
    }
    write!(html, "</ul><a href=\"{}\">Add genre</a></nav>\n", paths::GENRE_ADD)?;

    html.push_str("<main>\n");
    render_view(html, page)?;
    html.push_str("</main>\n</body>\n</html>\n");

    Ok(())
}

fn title(view: &View) -> String {
    match view {
        View::Home { .. } => "Latest programs".to_owned(),
        View::Genre { genre, .. } => genre.name.clone(),
        View::Program { program, .. } => program.name.clone(),
        View::GenreForm { genre: None } => "Add genre".to_owned(),
        View::GenreForm { genre: Some(g) } => format!("Edit {}", g.name),
        View::GenreDelete { genre } => format!("Delete {}", genre.name),
        View::ProgramForm { program: None, .. } => "Add program".to_owned(),
        View::ProgramForm {
            program: Some(p), ..
        } => format!("Edit {}", p.name),
        View::ProgramDelete { program, .. } => format!("Delete {}", program.name),
        View::Login { .. } => "Log in".to_owned(),
    }
}

fn render_view(html: &mut String, page: &Page) -> fmt::Result {
    let owns = |account_id: Id| page.viewer == Some(account_id);

    match &page.view {
        View::Home { latest } => {
            html.push_str("<h1>Latest programs</h1><ul>");
            for p in latest {
                write!(
                    html,
                    "<li><a href=\"{}\">{}</a> ({})</li>",
                    paths::program(p.genre_id, p.id),
                    escape(&p.name),
                    escape(&p.genre_name)
                )?;
            }
            html.push_str("</ul>");
        }
        View::Genre { genre, programs } => {
            write!(html, "<h1>{}</h1>", escape(&genre.name))?;

            if owns(genre.account_id) {
                write!(
                    html,
                    "<a href=\"{}\">Edit</a> <a href=\"{}\">Delete</a>",
                    paths::genre_edit(genre.id),
                    paths::genre_delete(genre.id)
                )?;
            }

            html.push_str("<ul>");
            for p in programs {
                write!(
                    html,
                    "<li><a href=\"{}\">{}</a></li>",
                    paths::program(genre.id, p.id),
                    escape(&p.name)
                )?;
            }
            write!(
                html,
                "</ul><a href=\"{}\">Add program</a>",
                paths::program_add(genre.id)
            )?;
        }
        View::Program { genre, program } => {
            write!(
                html,
                "<h1>{}</h1><p>{} to {}</p><p>{}</p><a href=\"{}\">{}</a>",
                escape(&program.name),
                program.year_began,
                program.year_ended,
                escape(program.description.as_deref().unwrap_or("")),
                paths::genre(genre.id),
                escape(&genre.name)
            )?;

            if owns(program.account_id) {
                write!(
                    html,
                    " <a href=\"{}\">Edit</a> <a href=\"{}\">Delete</a>",
                    paths::program_edit(genre.id, program.id),
                    paths::program_delete(genre.id, program.id)
                )?;
            }
        }
        View::GenreForm { genre } => {
            let (action, name) = match genre {
                Some(g) => (paths::genre_edit(g.id), g.name.as_str()),
                None => (paths::GENRE_ADD.to_owned(), ""),
            };

            write!(
                html,
                "<form method=\"post\" action=\"{}\">\
                 <label>Name <input name=\"name\" maxlength=\"{}\" value=\"{}\" required></label>\
                 <button type=\"submit\">Save</button></form>",
                action,
                GENRE_NAME_MAX,
                escape(name)
            )?;
        }
        View::GenreDelete { genre } => {
            write!(
                html,
                "<form method=\"post\" action=\"{}\"><p>Delete the genre {}?</p>\
                 <button type=\"submit\">Delete</button></form>",
                paths::genre_delete(genre.id),
                escape(&genre.name)
            )?;
        }
        View::ProgramForm { genre, program } => {
            let action = match program {
                Some(p) => paths::program_edit(genre.id, p.id),
                None => paths::program_add(genre.id),
            };
            let name = program.as_ref().map_or("", |p| p.name.as_str());
            let description = program
                .as_ref()
                .and_then(|p| p.description.as_deref())
                .unwrap_or("");
            let began = program.as_ref().map(|p| p.year_began.to_string());
            let ended = program.as_ref().map(|p| p.year_ended.to_string());

            write!(
                html,
                "<h1>{}</h1><form method=\"post\" action=\"{}\">\
                 <label>Name <input name=\"name\" maxlength=\"{}\" value=\"{}\" required></label>\
                 <label>First year <input name=\"yearBegan\" type=\"number\" min=\"{min}\" max=\"{max}\" value=\"{}\" required></label>\
                 <label>Last year <input name=\"yearEnded\" type=\"number\" min=\"{min}\" max=\"{max}\" value=\"{}\" required></label>\
                 <label>Description <textarea name=\"description\" maxlength=\"{}\">{}</textarea></label>\
                 <button type=\"submit\">Save</button></form>",
                escape(&genre.name),
                action,
                PROGRAM_NAME_MAX,
                escape(name),
                began.unwrap_or_default(),
                ended.unwrap_or_default(),
                DESCRIPTION_MAX,
                escape(description),
                min = FIRST_YEAR,
                max = LAST_YEAR
            )?;
        }
        View::ProgramDelete { genre, program } => {
            write!(
                html,
                "<form method=\"post\" action=\"{}\"><p>Delete the program {}?</p>\
                 <button type=\"submit\">Delete</button></form>",
                paths::program_delete(genre.id, program.id),
                escape(&program.name)
            )?;
        }
        View::Login { state, client_id } => {
            write!(
                html,
                r#"<div id="signin" data-clientid="{client_id}"></div><div id="result"></div>
<script src="https://apis.google.com/js/client:platform.js?onload=start" async defer></script>
<script>
function signInCallback(authResult) {{
  if (!authResult['code']) {{
    document.getElementById('result').textContent = 'Failed to sign in.';
    return;
  }}
  var request = new XMLHttpRequest();
  request.open('POST', '{connect}?state={state}');
  request.setRequestHeader('X-Requested-With', 'XMLHttpRequest');
  request.setRequestHeader('Content-Type', 'application/octet-stream; charset=utf-8');
  request.onload = function () {{
    if (request.status !== 200) {{
      document.getElementById('result').textContent = request.responseText;
      return;
    }}
    var body = JSON.parse(request.responseText);
    document.getElementById('result').innerHTML = body.msg || '';
    setTimeout(function () {{ window.location.href = body.dest || '{home}'; }}, 2000);
  }};
  request.send(authResult['code']);
}}
function start() {{
  gapi.load('auth2', function () {{
    var auth2 = gapi.auth2.init({{ client_id: '{client_id}' }});
    document.getElementById('signin').onclick = function () {{
      auth2.grantOfflineAccess().then(signInCallback);
    }};
  }});
}}
</script>"#,
                client_id = escape(client_id),
                connect = paths::CONNECT,
                state = escape(state),
                home = paths::HOME
            )?;
        }
    }

    Ok(())
}

/// Escapes text for use in HTML content and attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }

    escaped
}
