//! Post CRUD, shared by the site-wide news views and the space news views.

use chrono::Utc;

use crate::db::Database;
use crate::error::AppError;
use crate::forms::{self, Submit};
use crate::models::{CreatePostInput, Post, PostForm, Space, UpdatePostInput, User};

/// Where a post is being managed from.
#[derive(Debug, Clone, Copy)]
pub enum NewsScope<'a> {
    /// The site-wide news section. Posts created here always go on the index.
    Site,
    /// A space's news section. Only posts belonging to the space are visible.
    Space(&'a Space),
}

impl NewsScope<'_> {
    pub fn space_id(&self) -> Option<i64> {
        match self {
            Self::Site => None,
            Self::Space(space) => Some(space.id),
        }
    }

    /// Where to send the user after a successful change.
    pub fn home(&self) -> String {
        match self {
            Self::Site => "/".to_string(),
            Self::Space(space) => format!("/spaces/{}", space.url),
        }
    }
}

pub struct NewsService<'a> {
    db: &'a Database,
    scope: NewsScope<'a>,
}

impl<'a> NewsService<'a> {
    pub fn new(db: &'a Database, scope: NewsScope<'a>) -> Self {
        Self { db, scope }
    }

    pub fn scope(&self) -> NewsScope<'a> {
        self.scope
    }

    /// Fetch a post visible from this scope.
    pub fn find(&self, id: i64) -> Result<Post, AppError> {
        let post = self
            .db
            .get_post(id)?
            .ok_or_else(|| AppError::not_found("Post"))?;

        match self.scope {
            NewsScope::Space(space) if post.space_id != Some(space.id) => {
                Err(AppError::not_found("Post"))
            }
            _ => Ok(post),
        }
    }

    /// Validate and persist a new post written by `author`.
    pub fn create(&self, author: &User, form: PostForm) -> Result<Submit<Post>, AppError> {
        if let Err(errors) = forms::check(&form) {
            return Ok(Submit::Invalid(errors));
        }

        let pub_index = match self.scope {
            NewsScope::Site => true,
            NewsScope::Space(_) => form.pub_index,
        };

        let post = self.db.create_post(CreatePostInput {
            space_id: self.scope.space_id(),
            title: form.title,
            message: form.message,
            author: author.username.clone(),
            pub_index,
            pub_date: Utc::now(),
        })?;

        tracing::info!("Post {} created by {}", post.id, post.author);
        Ok(Submit::Saved(post))
    }

    pub fn update(&self, id: i64, form: PostForm) -> Result<Submit<Post>, AppError> {
        self.find(id)?;
        if let Err(errors) = forms::check(&form) {
            return Ok(Submit::Invalid(errors));
        }

        let post = self
            .db
            .update_post(
                id,
                UpdatePostInput {
                    title: form.title,
                    message: form.message,
                    pub_index: form.pub_index,
                },
            )?
            .ok_or_else(|| AppError::not_found("Post"))?;

        tracing::info!("Post {} updated", post.id);
        Ok(Submit::Saved(post))
    }

    pub fn delete(&self, id: i64) -> Result<Post, AppError> {
        let post = self.find(id)?;
        if !self.db.delete_post(id)? {
            return Err(AppError::not_found("Post"));
        }
        tracing::info!("Post {} deleted", id);
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateSpaceInput, CreateUserInput};

    fn setup() -> (Database, User, Space) {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        let user = db
            .create_user(CreateUserInput {
                username: "editor".to_string(),
                email: None,
                is_superuser: false,
            })
            .unwrap();
        let space = db
            .create_space(CreateSpaceInput {
                name: "Vigo".to_string(),
                url: "vigo".to_string(),
                description: None,
                date: None,
            })
            .unwrap();
        (db, user, space)
    }

    fn form(pub_index: bool) -> PostForm {
        PostForm {
            title: "Assembly on Friday".to_string(),
            message: "Bring your ideas".to_string(),
            pub_index,
        }
    }

    #[test]
    fn site_scope_forces_index_flag() {
        let (db, user, _) = setup();
        let service = NewsService::new(&db, NewsScope::Site);

        let Submit::Saved(post) = service.create(&user, form(false)).unwrap() else {
            panic!("expected post to be saved");
        };
        assert!(post.pub_index);
        assert_eq!(post.author, "editor");
        assert_eq!(post.space_id, None);
    }

    #[test]
    fn space_scope_keeps_form_flag_and_space() {
        let (db, user, space) = setup();
        let service = NewsService::new(&db, NewsScope::Space(&space));

        let Submit::Saved(post) = service.create(&user, form(false)).unwrap() else {
            panic!("expected post to be saved");
        };
        assert!(!post.pub_index);
        assert_eq!(post.space_id, Some(space.id));
        assert_eq!(service.scope().home(), "/spaces/vigo");
    }

    #[test]
    fn invalid_form_persists_nothing() {
        let (db, user, _) = setup();
        let service = NewsService::new(&db, NewsScope::Site);

        let outcome = service.create(&user, PostForm::default()).unwrap();
        assert!(matches!(outcome, Submit::Invalid(errors) if errors.contains_key("title")));
        assert!(db.get_recent_posts(10).unwrap().is_empty());
    }

    #[test]
    fn space_scope_hides_site_posts() {
        let (db, user, space) = setup();
        let Submit::Saved(site_post) = NewsService::new(&db, NewsScope::Site)
            .create(&user, form(true))
            .unwrap()
        else {
            panic!("expected post to be saved");
        };

        let in_space = NewsService::new(&db, NewsScope::Space(&space));
        assert!(matches!(in_space.find(site_post.id), Err(AppError::NotFound(_))));
        assert!(matches!(in_space.delete(site_post.id), Err(AppError::NotFound(_))));
        assert!(db.get_post(site_post.id).unwrap().is_some());
    }

    #[test]
    fn delete_removes_post() {
        let (db, user, _) = setup();
        let service = NewsService::new(&db, NewsScope::Site);
        let Submit::Saved(post) = service.create(&user, form(true)).unwrap() else {
            panic!("expected post to be saved");
        };

        service.delete(post.id).unwrap();
        assert!(matches!(service.find(post.id), Err(AppError::NotFound(_))));
    }
}
