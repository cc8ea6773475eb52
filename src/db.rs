use futures::future::BoxFuture;

use crate::catalog::{
    Account, Genre, GenreName, Id, LatestProgram, Profile, Program, ProgramFields,
};
use crate::errors::CatalogError;

pub mod mock;

/// Storage for the catalog. Each operation is one unit of work: it either
/// completes entirely or changes nothing.
pub trait Db {
    /// All genres, ordered by name.
    fn list_genres(&self) -> BoxFuture<'_, Result<Vec<Genre>, CatalogError>>;

    fn retrieve_genre(&self, id: Id) -> BoxFuture<'_, Result<Option<Genre>, CatalogError>>;

    /// Creates a genre owned by `account_id`. Fails with
    /// [`CatalogError::GenreExists`] if the name is taken.
    fn create_genre(
        &self,
        account_id: Id,
        name: GenreName,
    ) -> BoxFuture<'_, Result<Genre, CatalogError>>;

    /// Renames a genre. Fails with [`CatalogError::GenreExists`] if another
    /// genre has the name.
    fn rename_genre(&self, id: Id, name: GenreName) -> BoxFuture<'_, Result<Genre, CatalogError>>;

    /// Deletes an empty genre. Fails with [`CatalogError::GenreNotEmpty`] if
    /// it still has programs.
    fn delete_genre(&self, id: Id) -> BoxFuture<'_, Result<(), CatalogError>>;

    /// The number of programs in a genre.
    fn count_programs(&self, genre_id: Id) -> BoxFuture<'_, Result<i64, CatalogError>>;

    /// The programs of a genre, ordered by name.
    fn list_programs(&self, genre_id: Id) -> BoxFuture<'_, Result<Vec<Program>, CatalogError>>;

    fn retrieve_program(&self, id: Id) -> BoxFuture<'_, Result<Option<Program>, CatalogError>>;

    /// Creates a program in a genre. Fails with
    /// [`CatalogError::ProgramExists`] if the genre already has a program
    /// with the name.
    fn create_program(
        &self,
        account_id: Id,
        genre_id: Id,
        fields: ProgramFields,
    ) -> BoxFuture<'_, Result<Program, CatalogError>>;

    /// Replaces the editable fields of a program. Fails with
    /// [`CatalogError::ProgramExists`] if another program in the same genre
    /// has the new name.
    fn update_program(
        &self,
        id: Id,
        fields: ProgramFields,
    ) -> BoxFuture<'_, Result<Program, CatalogError>>;

    fn delete_program(&self, id: Id) -> BoxFuture<'_, Result<(), CatalogError>>;

    /// The `limit` most recently created programs, newest first.
    fn latest_programs(
        &self,
        limit: i64,
    ) -> BoxFuture<'_, Result<Vec<LatestProgram>, CatalogError>>;

    /// Creates the account for `profile.email`, or refreshes its name and
    /// picture if it exists.
    fn upsert_account(&self, profile: Profile) -> BoxFuture<'_, Result<Account, CatalogError>>;

    fn retrieve_account(&self, id: Id) -> BoxFuture<'_, Result<Option<Account>, CatalogError>>;
}

pub use self::postgres::*;

mod postgres {
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use sqlx::postgres::PgPool;

    use crate::catalog::{
        Account, Genre, GenreName, Id, LatestProgram, Profile, Program, ProgramFields,
    };
    use crate::errors::CatalogError;

    const GENRES_NAME_CONSTRAINT: &str = "genres_name";
    const GENRES_ACCOUNT_CONSTRAINT: &str = "genres_account";
    const PROGRAMS_GENRE_NAME_CONSTRAINT: &str = "programs_genre_name";
    const PROGRAMS_GENRE_CONSTRAINT: &str = "programs_genre";
    const PROGRAMS_ACCOUNT_CONSTRAINT: &str = "programs_account";

    pub struct PgDb {
        pool: PgPool,
    }

    impl PgDb {
        pub fn new(pool: PgPool) -> Self {
            PgDb { pool }
        }
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::Db for PgDb {
        fn list_genres(&self) -> BoxFuture<'_, Result<Vec<Genre>, CatalogError>> {
            async move {
                let query = sqlx::query_as::<_, Genre>(include_str!("queries/list_genres.sql"));

                let genres = query.fetch_all(&self.pool).await.map_err(map_sqlx_error)?;

                Ok(genres)
            }
            .boxed()
        }

        fn retrieve_genre(&self, id: Id) -> BoxFuture<'_, Result<Option<Genre>, CatalogError>> {
            async move {
                let query =
                    sqlx::query_as::<_, Genre>(include_str!("queries/retrieve_genre.sql"));

                let genre = query
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(genre)
            }
            .boxed()
        }

        fn create_genre(
            &self,
            account_id: Id,
            name: GenreName,
        ) -> BoxFuture<'_, Result<Genre, CatalogError>> {
            async move {
                let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

                let (taken,): (i64,) =
                    sqlx::query_as(include_str!("queries/count_genres_named.sql"))
                        .bind(name.as_str())
                        .bind(None::<Id>)
                        .fetch_one(&mut tx)
                        .await
                        .map_err(map_sqlx_error)?;

                if taken > 0 {
                    return Err(CatalogError::GenreExists);
                }

                let genre = sqlx::query_as::<_, Genre>(include_str!("queries/create_genre.sql"))
                    .bind(name.as_str())
                    .bind(account_id)
                    .fetch_one(&mut tx)
                    .await
                    .map_err(|e| match constraint_of(&e) {
                        Some(GENRES_ACCOUNT_CONSTRAINT) => CatalogError::NoSuchAccount(account_id),
                        _ => map_sqlx_error(e),
                    })?;

                tx.commit().await.map_err(map_sqlx_error)?;

                Ok(genre)
            }
            .boxed()
        }

        fn rename_genre(
            &self,
            id: Id,
            name: GenreName,
        ) -> BoxFuture<'_, Result<Genre, CatalogError>> {
            async move {
                let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

                let (taken,): (i64,) =
                    sqlx::query_as(include_str!("queries/count_genres_named.sql"))
                        .bind(name.as_str())
                        .bind(Some(id))
                        .fetch_one(&mut tx)
                        .await
                        .map_err(map_sqlx_error)?;

                if taken > 0 {
                    return Err(CatalogError::GenreExists);
                }

                let genre = sqlx::query_as::<_, Genre>(include_str!("queries/rename_genre.sql"))
                    .bind(id)
                    .bind(name.as_str())
                    .fetch_optional(&mut tx)
                    .await
                    .map_err(map_sqlx_error)?
                    .ok_or(CatalogError::NoSuchGenre(id))?;

                tx.commit().await.map_err(map_sqlx_error)?;

                Ok(genre)
            }
            .boxed()
        }

        fn delete_genre(&self, id: Id) -> BoxFuture<'_, Result<(), CatalogError>> {
            async move {
                let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

                let (programs,): (i64,) = sqlx::query_as(include_str!("queries/count_programs.sql"))
                    .bind(id)
                    .fetch_one(&mut tx)
                    .await
                    .map_err(map_sqlx_error)?;

                if programs > 0 {
                    return Err(CatalogError::GenreNotEmpty);
                }

                let count = sqlx::query(include_str!("queries/delete_genre.sql"))
                    .bind(id)
                    .execute(&mut tx)
                    .await
                    .map_err(|e| match constraint_of(&e) {
                        Some(PROGRAMS_GENRE_CONSTRAINT) => CatalogError::GenreNotEmpty,
                        _ => map_sqlx_error(e),
                    })?
                    .rows_affected();

                if count == 0 {
                    return Err(CatalogError::NoSuchGenre(id));
                }

                tx.commit().await.map_err(map_sqlx_error)?;

                Ok(())
            }
            .boxed()
        }

        fn count_programs(&self, genre_id: Id) -> BoxFuture<'_, Result<i64, CatalogError>> {
            async move {
                let query = sqlx::query_as::<_, (i64,)>(include_str!("queries/count_programs.sql"));

                let (count,) = query
                    .bind(genre_id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(count)
            }
            .boxed()
        }

        fn list_programs(
            &self,
            genre_id: Id,
        ) -> BoxFuture<'_, Result<Vec<Program>, CatalogError>> {
            async move {
                let query =
                    sqlx::query_as::<_, Program>(include_str!("queries/list_programs.sql"));

                let programs = query
                    .bind(genre_id)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(programs)
            }
            .boxed()
        }

        fn retrieve_program(
            &self,
            id: Id,
        ) -> BoxFuture<'_, Result<Option<Program>, CatalogError>> {
            async move {
                let query =
                    sqlx::query_as::<_, Program>(include_str!("queries/retrieve_program.sql"));

                let program = query
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(program)
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
                let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

                sqlx::query_as::<_, Genre>(include_str!("queries/lock_genre.sql"))
                    .bind(genre_id)
                    .fetch_optional(&mut tx)
                    .await
                    .map_err(map_sqlx_error)?
                    .ok_or(CatalogError::NoSuchGenre(genre_id))?;

                let (taken,): (i64,) =
                    sqlx::query_as(include_str!("queries/count_programs_named.sql"))
                        .bind(genre_id)
                        .bind(&fields.name)
                        .bind(None::<Id>)
                        .fetch_one(&mut tx)
                        .await
                        .map_err(map_sqlx_error)?;

                if taken > 0 {
                    return Err(CatalogError::ProgramExists);
                }

                let program =
                    sqlx::query_as::<_, Program>(include_str!("queries/create_program.sql"))
                        .bind(&fields.name)
                        .bind(&fields.description)
                        .bind(fields.year_began)
                        .bind(fields.year_ended)
                        .bind(genre_id)
                        .bind(account_id)
                        .fetch_one(&mut tx)
                        .await
                        .map_err(|e| match constraint_of(&e) {
                            Some(PROGRAMS_GENRE_CONSTRAINT) => CatalogError::NoSuchGenre(genre_id),
                            Some(PROGRAMS_ACCOUNT_CONSTRAINT) => {
                                CatalogError::NoSuchAccount(account_id)
                            }
                            _ => map_sqlx_error(e),
                        })?;

                tx.commit().await.map_err(map_sqlx_error)?;

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
                let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

                let current = sqlx::query_as::<_, Program>(include_str!("queries/lock_program.sql"))
                    .bind(id)
                    .fetch_optional(&mut tx)
                    .await
                    .map_err(map_sqlx_error)?
                    .ok_or(CatalogError::NoSuchProgram(id))?;

                let (taken,): (i64,) =
                    sqlx::query_as(include_str!("queries/count_programs_named.sql"))
                        .bind(current.genre_id)
                        .bind(&fields.name)
                        .bind(Some(id))
                        .fetch_one(&mut tx)
                        .await
                        .map_err(map_sqlx_error)?;

                if taken > 0 {
                    return Err(CatalogError::ProgramExists);
                }

                let program =
                    sqlx::query_as::<_, Program>(include_str!("queries/update_program.sql"))
                        .bind(id)
                        .bind(&fields.name)
                        .bind(&fields.description)
                        .bind(fields.year_began)
                        .bind(fields.year_ended)
                        .fetch_one(&mut tx)
                        .await
                        .map_err(map_sqlx_error)?;

                tx.commit().await.map_err(map_sqlx_error)?;

                Ok(program)
            }
            .boxed()
        }

        fn delete_program(&self, id: Id) -> BoxFuture<'_, Result<(), CatalogError>> {
            async move {
                let count = sqlx::query(include_str!("queries/delete_program.sql"))
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?
                    .rows_affected();

                if count == 0 {
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
                let query =
                    sqlx::query_as::<_, LatestProgram>(include_str!("queries/latest_programs.sql"));

                let programs = query
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(programs)
            }
            .boxed()
        }

        fn upsert_account(&self, profile: Profile) -> BoxFuture<'_, Result<Account, CatalogError>> {
            async move {
                let query =
                    sqlx::query_as::<_, Account>(include_str!("queries/upsert_account.sql"));

                let account = query
                    .bind(&profile.name)
                    .bind(&profile.picture)
                    .bind(&profile.email)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(account)
            }
            .boxed()
        }

        fn retrieve_account(
            &self,
            id: Id,
        ) -> BoxFuture<'_, Result<Option<Account>, CatalogError>> {
            async move {
                let query =
                    sqlx::query_as::<_, Account>(include_str!("queries/retrieve_account.sql"));

                let account = query
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(account)
            }
            .boxed()
        }
    }

    fn constraint_of(error: &sqlx::Error) -> Option<&str> {
        match error {
            sqlx::Error::Database(e) => e.constraint(),
            _ => None,
        }
    }

    fn map_sqlx_error(error: sqlx::Error) -> CatalogError {
        match constraint_of(&error) {
            Some(GENRES_NAME_CONSTRAINT) => CatalogError::GenreExists,
            Some(PROGRAMS_GENRE_NAME_CONSTRAINT) => CatalogError::ProgramExists,
            _ => CatalogError::Sqlx { source: error },
        }
    }
}
