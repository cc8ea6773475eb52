use std::sync::RwLock;

use futures::future::{BoxFuture, FutureExt};
use time::OffsetDateTime;

use super::Db;
use crate::catalog::{
    Account, Genre, GenreName, Id, LatestProgram, Profile, Program, ProgramFields,
};
use crate::errors::CatalogError;

#[derive(Default)]
struct State {
    accounts: Vec<Account>,
    genres: Vec<Genre>,
    programs: Vec<Program>,
    last_id: Id,
}

impl State {
    fn next_id(&mut self) -> Id {
        self.last_id += 1;
        self.last_id
    }
}

/// An in-memory catalog with the same rules as the PostgreSQL one.
#[derive(Default)]
pub struct MockDb {
    state: RwLock<State>,
}

impl MockDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of all accounts, in creation order.
    pub fn accounts(&self) -> Vec<Account> {
        self.state.read().unwrap().accounts.clone()
    }
}

impl Db for MockDb {
    fn list_genres(&self) -> BoxFuture<'_, Result<Vec<Genre>, CatalogError>> {
        async move {
            let mut genres = self.state.read().unwrap().genres.clone();
            genres.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(genres)
        }
        .boxed()
    }

    fn retrieve_genre(&self, id: Id) -> BoxFuture<'_, Result<Option<Genre>, CatalogError>> {
        async move {
            let state = self.state.read().unwrap();
            Ok(state.genres.iter().find(|g| g.id == id).cloned())
        }
        .boxed()
    }

    fn create_genre(
        &self,
        account_id: Id,
        name: GenreName,
    ) -> BoxFuture<'_, Result<Genre, CatalogError>> {
        async move {
            let mut state = self.state.write().unwrap();

            if !state.accounts.iter().any(|a| a.id == account_id) {
                return Err(CatalogError::NoSuchAccount(account_id));
            }

            if state.genres.iter().any(|g| g.name == name.as_str()) {
                return Err(CatalogError::GenreExists);
            }

            let now = OffsetDateTime::now_utc();
            let genre = Genre {
                name: name.as_str().to_owned(),
                id: state.next_id(),
                account_id,
                created_at: now,
                updated_at: now,
            };
            state.genres.push(genre.clone());

            Ok(genre)
        }
        .boxed()
    }

    fn rename_genre(&self, id: Id, name: GenreName) -> BoxFuture<'_, Result<Genre, CatalogError>> {
        async move {
            let mut state = self.state.write().unwrap();

            if state
                .genres
                .iter()
                .any(|g| g.id != id && g.name == name.as_str())
            {
                return Err(CatalogError::GenreExists);
            }

            let genre = state
                .genres
                .iter_mut()
                .find(|g| g.id == id)
                .ok_or(CatalogError::NoSuchGenre(id))?;
            genre.name = name.as_str().to_owned();
            genre.updated_at = OffsetDateTime::now_utc();

            Ok(genre.clone())
        }
        .boxed()
    }

    fn delete_genre(&self, id: Id) -> BoxFuture<'_, Result<(), CatalogError>> {
        async move {
            let mut state = self.state.write().unwrap();

            if state.programs.iter().any(|p| p.genre_id == id) {
                return Err(CatalogError::GenreNotEmpty);
            }

            let before = state.genres.len();
            state.genres.retain(|g| g.id != id);

            if state.genres.len() == before {
                Err(CatalogError::NoSuchGenre(id))
            } else {
                Ok(())
            }
        }
        .boxed()
    }

    fn count_programs(&self, genre_id: Id) -> BoxFuture<'_, Result<i64, CatalogError>> {
        async move {
            let state = self.state.read().unwrap();
            let count = state.programs.iter().filter(|p| p.genre_id == genre_id).count();
            Ok(count as i64)
        }
        .boxed()
    }

    fn list_programs(&self, genre_id: Id) -> BoxFuture<'_, Result<Vec<Program>, CatalogError>> {
        async move {
            let state = self.state.read().unwrap();
            let mut programs = state
                .programs
                .iter()
                .filter(|p| p.genre_id == genre_id)
                .cloned()
                .collect::<Vec<_>>();
            programs.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(programs)
        }
        .boxed()
    }

    fn retrieve_program(&self, id: Id) -> BoxFuture<'_, Result<Option<Program>, CatalogError>> {
        async move {
            let state = self.state.read().unwrap();
            Ok(state.programs.iter().find(|p| p.id == id).cloned())
        }
        .boxed()
    }

    fn create_program(
        &self,
        account_id: Id,
        genre_id: Id,
        fields: ProgramFields,
    ) -> BoxFuture<'_, Result<Program, CatalogError>> {
        async move {
            let mut state = self.state.write().unwrap();

            if !state.genres.iter().any(|g| g.id == genre_id) {
                return Err(CatalogError::NoSuchGenre(genre_id));
            }

            if !state.accounts.iter().any(|a| a.id == account_id) {
                return Err(CatalogError::NoSuchAccount(account_id));
            }

            if state
                .programs
                .iter()
                .any(|p| p.genre_id == genre_id && p.name == fields.name)
            {
                return Err(CatalogError::ProgramExists);
            }

            let now = OffsetDateTime::now_utc();
            let program = Program {
                name: fields.name,
                description: fields.description,
                id: state.next_id(),
                year_began: fields.year_began,
                year_ended: fields.year_ended,
                genre_id,
                account_id,
                created_at: now,
                updated_at: now,
            };
            state.programs.push(program.clone());

            Ok(program)
        }
        .boxed()
    }

    fn update_program(
        &self,
        id: Id,
        fields: ProgramFields,
    ) -> BoxFuture<'_, Result<Program, CatalogError>> {
        async move {
            let mut state = self.state.write().unwrap();

            let genre_id = state
                .programs
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.genre_id)
                .ok_or(CatalogError::NoSuchProgram(id))?;

            if state
                .programs
                .iter()
                .any(|p| p.id != id && p.genre_id == genre_id && p.name == fields.name)
            {
                return Err(CatalogError::ProgramExists);
            }

            let program = state
                .programs
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(CatalogError::NoSuchProgram(id))?;
            program.name = fields.name;
            program.description = fields.description;
            program.year_began = fields.year_began;
            program.year_ended = fields.year_ended;
            program.updated_at = OffsetDateTime::now_utc();

            Ok(program.clone())
        }
        .boxed()
    }

    fn delete_program(&self, id: Id) -> BoxFuture<'_, Result<(), CatalogError>> {
        async move {
            let mut state = self.state.write().unwrap();

            let before = state.programs.len();
            state.programs.retain(|p| p.id != id);

            if state.programs.len() == before {
                Err(CatalogError::NoSuchProgram(id))
            } else {
                Ok(())
            }
        }
        .boxed()
    }

    fn latest_programs(
        &self,
        limit: i64,
    ) -> BoxFuture<'_, Result<Vec<LatestProgram>, CatalogError>> {
        async move {
            let state = self.state.read().unwrap();

            let mut latest = state
                .programs
                .iter()
                .filter_map(|p| {
                    let genre = state.genres.iter().find(|g| g.id == p.genre_id)?;

                    Some(LatestProgram {
                        id: p.id,
                        genre_id: p.genre_id,
                        name: p.name.clone(),
                        genre_name: genre.name.clone(),
                        created_at: p.created_at,
                    })
                })
                .collect::<Vec<_>>();

            latest.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
            latest.truncate(limit.max(0) as usize);

            Ok(latest)
        }
        .boxed()
    }

    fn upsert_account(&self, profile: Profile) -> BoxFuture<'_, Result<Account, CatalogError>> {
        async move {
            let mut state = self.state.write().unwrap();
            let now = OffsetDateTime::now_utc();

            if let Some(account) = state.accounts.iter_mut().find(|a| a.email == profile.email) {
                account.username = profile.name;
                account.picture = profile.picture;
                account.updated_at = now;
                return Ok(account.clone());
            }

            let account = Account {
                id: state.next_id(),
                username: profile.name,
                picture: profile.picture,
                email: profile.email,
                created_at: now,
                updated_at: now,
            };
            state.accounts.push(account.clone());

            Ok(account)
        }
        .boxed()
    }

    fn retrieve_account(&self, id: Id) -> BoxFuture<'_, Result<Option<Account>, CatalogError>> {
        async move {
            let state = self.state.read().unwrap();
            Ok(state.accounts.iter().find(|a| a.id == id).cloned())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(email: &str) -> Profile {
        Profile {
            name: "Jack Benny".to_owned(),
            picture: None,
            email: email.to_owned(),
        }
    }

    fn fields(name: &str) -> ProgramFields {
        ProgramFields {
            name: name.to_owned(),
            description: None,
            year_began: 1932,
            year_ended: 1955,
        }
    }

    fn genre_name(name: &str) -> GenreName {
        GenreName::parse(name).unwrap()
    }

    #[tokio::test]
    async fn accounts_are_reconciled_by_email() {
        let db = MockDb::new();

        let first = db.upsert_account(profile("jack@example.com")).await.unwrap();
        let mut renamed = profile("jack@example.com");
        renamed.name = "Benny Kubelsky".to_owned();
        let second = db.upsert_account(renamed).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.username, "Benny Kubelsky");
        assert_eq!(db.accounts().len(), 1);
    }

    #[tokio::test]
    async fn genre_names_are_unique() {
        let db = MockDb::new();
        let account = db.upsert_account(profile("a@example.com")).await.unwrap();

        let comedy = db.create_genre(account.id, genre_name("Comedy")).await.unwrap();
        let drama = db.create_genre(account.id, genre_name("Drama")).await.unwrap();

        assert!(matches!(
            db.create_genre(account.id, genre_name("Comedy")).await,
            Err(CatalogError::GenreExists)
        ));
        assert!(matches!(
            db.rename_genre(drama.id, genre_name("Comedy")).await,
            Err(CatalogError::GenreExists)
        ));
        assert!(db.rename_genre(comedy.id, genre_name("Comedy")).await.is_ok());

        let names = db
            .list_genres()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Comedy", "Drama"]);
    }

    #[tokio::test]
    async fn program_names_are_unique_within_a_genre() {
        let db = MockDb::new();
        let account = db.upsert_account(profile("a@example.com")).await.unwrap();
        let comedy = db.create_genre(account.id, genre_name("Comedy")).await.unwrap();
        let drama = db.create_genre(account.id, genre_name("Drama")).await.unwrap();

        let benny = db
            .create_program(account.id, comedy.id, fields("The Jack Benny Program"))
            .await
            .unwrap();
        db.create_program(account.id, drama.id, fields("Lux Radio Theatre"))
            .await
            .unwrap();
        let other = db
            .create_program(account.id, comedy.id, fields("Vic and Sade"))
            .await
            .unwrap();

        assert!(matches!(
            db.create_program(account.id, comedy.id, fields("The Jack Benny Program"))
                .await,
            Err(CatalogError::ProgramExists)
        ));
        assert!(matches!(
            db.update_program(other.id, fields("The Jack Benny Program")).await,
            Err(CatalogError::ProgramExists)
        ));
        assert!(db.update_program(other.id, fields("Lux Radio Theatre")).await.is_ok());
        assert!(db.update_program(benny.id, fields("The Jack Benny Program")).await.is_ok());
    }

    #[tokio::test]
    async fn only_empty_genres_are_deleted() {
        let db = MockDb::new();
        let account = db.upsert_account(profile("a@example.com")).await.unwrap();
        let genre = db.create_genre(account.id, genre_name("Western")).await.unwrap();
        let program = db
            .create_program(account.id, genre.id, fields("Gunsmoke"))
            .await
            .unwrap();

        assert!(matches!(
            db.delete_genre(genre.id).await,
            Err(CatalogError::GenreNotEmpty)
        ));

        db.delete_program(program.id).await.unwrap();
        db.delete_genre(genre.id).await.unwrap();

        assert!(db.retrieve_genre(genre.id).await.unwrap().is_none());
        assert!(matches!(
            db.delete_genre(genre.id).await,
            Err(CatalogError::NoSuchGenre(_))
        ));
    }

    #[tokio::test]
    async fn latest_programs_are_newest_first() {
        let db = MockDb::new();
        let account = db.upsert_account(profile("a@example.com")).await.unwrap();
        let genre = db.create_genre(account.id, genre_name("Mystery")).await.unwrap();

        for name in &["Suspense", "The Shadow", "Inner Sanctum"] {
            db.create_program(account.id, genre.id, fields(name)).await.unwrap();
        }

        let latest = db.latest_programs(2).await.unwrap();

        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].name, "Inner Sanctum");
        assert_eq!(latest[1].name, "The Shadow");
        assert_eq!(latest[0].genre_name, "Mystery");
    }
}
